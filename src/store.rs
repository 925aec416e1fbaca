use crate::types::{Article, NewsDocument, QueryFilters, QueryPage, Result, StoreStats};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SLUG_MAX_LEN: usize = 60;
const SLUG_SUFFIX_LEN: usize = 8;
const FALLBACK_TITLE: &str = "untitled-article";

/// Stable article identity: a pure function of the normalized title and the
/// canonical source URL. Re-fetching the same story any number of times
/// yields the same id; wall-clock time never participates.
pub fn article_id(title: &str, source_url: &str) -> String {
    let normalized_title = title.trim().to_lowercase();
    let normalized_title = normalized_title.split_whitespace().collect::<Vec<_>>().join(" ");
    let digest = Sha256::digest(format!("{normalized_title}|{source_url}").as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..16].to_string()
}

/// URL-safe slug from a title plus an id-derived uniqueness suffix. Never
/// fails: a missing title falls back to a placeholder and a missing id to a
/// timestamp-derived value.
pub fn slugify(title: Option<&str>, id: Option<&str>) -> String {
    let title = match title {
        Some(t) if !t.trim().is_empty() => t,
        _ => FALLBACK_TITLE,
    };
    let fallback_id;
    let id = match id {
        Some(i) if !i.is_empty() => i,
        _ => {
            fallback_id = format!("{:x}", Utc::now().timestamp_millis());
            &fallback_id
        }
    };

    let base: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");

    let mut base = collapse_hyphens(&base);
    base.truncate(SLUG_MAX_LEN);
    let base = base.trim_matches('-');

    let suffix: String = id.chars().take(SLUG_SUFFIX_LEN).collect();

    if base.is_empty() {
        format!("{FALLBACK_TITLE}-{suffix}")
    } else {
        format!("{base}-{suffix}")
    }
}

fn collapse_hyphens(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_hyphen = false;
    for c in s.chars() {
        if c == '-' {
            if !prev_hyphen {
                out.push(c);
            }
            prev_hyphen = true;
        } else {
            out.push(c);
            prev_hyphen = false;
        }
    }
    out
}

/// Flat-file article repository: one JSON document read fully on access and
/// overwritten fully on mutation. Overwrites go through a temp file and an
/// atomic rename so a crashed write never leaves a torn document.
///
/// Single-writer contract: the orchestrator is the only writer during a
/// cycle. Nothing here locks; concurrent writers are a deployment error.
pub struct ArticleStore {
    path: PathBuf,
    max_articles: usize,
}

impl ArticleStore {
    pub fn open(path: impl Into<PathBuf>, max_articles: usize) -> Self {
        Self {
            path: path.into(),
            max_articles: max_articles.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<NewsDocument> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No document at {}, starting empty", self.path.display());
                Ok(NewsDocument::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, mut doc: NewsDocument) -> Result<()> {
        doc.count = doc.articles.len();
        doc.last_updated = Some(Utc::now());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&doc)?)?;
        fs::rename(&tmp, &self.path)?;

        debug!(
            "Saved {} articles to {}",
            doc.articles.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Insert a new article or update the existing record with the same id.
    /// On update, identity and bookkeeping fields (id, slug, views, featured,
    /// created_at, first_seen_at) are preserved; content fields are replaced.
    pub fn upsert(&self, article: Article) -> Result<()> {
        let mut doc = self.load()?;
        upsert_into(&mut doc, article);
        self.enforce_retention(&mut doc);
        self.save(doc)
    }

    /// Bulk upsert for one cycle's output. A single read-modify-write instead
    /// of one per article.
    pub fn upsert_cycle(&self, articles: Vec<Article>) -> Result<usize> {
        let persisted = articles.len();
        let mut doc = self.load()?;
        for article in articles {
            upsert_into(&mut doc, article);
        }
        self.enforce_retention(&mut doc);
        self.save(doc)?;
        info!("Persisted {} articles", persisted);
        Ok(persisted)
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<Article>> {
        let doc = self.load()?;
        Ok(doc.articles.iter().find(|a| a.id == id).cloned())
    }

    /// Slug lookup. A hit counts as a view: the counter is incremented and
    /// persisted before the article is returned.
    pub fn get_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        let mut doc = self.load()?;
        let found = match doc.articles.iter_mut().find(|a| a.slug == slug) {
            Some(article) => {
                article.views += 1;
                Some(article.clone())
            }
            None => None,
        };
        if found.is_some() {
            self.save(doc)?;
        }
        Ok(found)
    }

    /// Filtered, offset-paginated query. A query matching nothing returns an
    /// empty page with total 0, never an error.
    pub fn query(
        &self,
        filters: &QueryFilters,
        page: usize,
        page_size: usize,
    ) -> Result<QueryPage> {
        let doc = self.load()?;
        let page = page.max(1);
        let page_size = page_size.max(1);

        let mut matched: Vec<Article> = doc
            .articles
            .into_iter()
            .filter(|a| matches_filters(a, filters))
            .collect();
        matched.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then(b.updated_at.cmp(&a.updated_at))
        });

        let total = matched.len();
        let total_pages = total.div_ceil(page_size);
        let items: Vec<Article> = matched
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();

        Ok(QueryPage {
            items,
            total,
            page,
            total_pages,
        })
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let doc = self.load()?;
        let total = doc.articles.len();

        let mut by_country: HashMap<String, usize> = HashMap::new();
        let mut by_category: HashMap<String, usize> = HashMap::new();
        let mut by_provider: HashMap<String, usize> = HashMap::new();
        let mut total_views = 0u64;
        let mut articles_with_images = 0usize;

        for article in &doc.articles {
            *by_country.entry(article.country.clone()).or_default() += 1;
            *by_category.entry(article.category.clone()).or_default() += 1;
            *by_provider
                .entry(article.provider.label().to_string())
                .or_default() += 1;
            total_views += article.views;
            if article.image_url.is_some() {
                articles_with_images += 1;
            }
        }

        let average_views = if total > 0 {
            total_views as f64 / total as f64
        } else {
            0.0
        };
        let image_percentage = if total > 0 {
            ((articles_with_images as f64 / total as f64) * 100.0).round() as u32
        } else {
            0
        };

        Ok(StoreStats {
            total,
            by_country,
            by_category,
            by_provider,
            total_views,
            average_views,
            articles_with_images,
            image_percentage,
            last_updated: doc.last_updated,
        })
    }

    /// Oldest-inserted-first eviction down to the retention cap. Articles in
    /// the document stay in insertion order; display order is a query concern.
    fn enforce_retention(&self, doc: &mut NewsDocument) {
        if doc.articles.len() > self.max_articles {
            let excess = doc.articles.len() - self.max_articles;
            warn!(
                "Retention cap {} exceeded, evicting {} oldest articles",
                self.max_articles, excess
            );
            doc.articles.drain(..excess);
        }
    }
}

fn upsert_into(doc: &mut NewsDocument, mut article: Article) {
    match doc.articles.iter_mut().find(|a| a.id == article.id) {
        Some(existing) => {
            // Stable permalink: identity assigned on first merge-survival
            // is never regenerated.
            article.slug = existing.slug.clone();
            article.views = existing.views;
            article.featured = existing.featured;
            article.created_at = existing.created_at;
            article.first_seen_at = existing.first_seen_at;
            article.updated_at = Utc::now();
            *existing = article;
        }
        None => doc.articles.push(article),
    }
}

fn matches_filters(article: &Article, filters: &QueryFilters) -> bool {
    if let Some(country) = &filters.country {
        if !article
            .country
            .to_lowercase()
            .contains(&country.to_lowercase())
        {
            return false;
        }
    }
    if let Some(category) = &filters.category {
        if !article.category.eq_ignore_ascii_case(category) {
            return false;
        }
    }
    if let Some(featured) = filters.featured {
        if article.featured != featured {
            return false;
        }
    }
    if let Some(search) = &filters.search {
        let needle = search.to_lowercase();
        let haystack = format!(
            "{} {} {}",
            article.rewritten_title, article.summary, article.rewritten_body
        )
        .to_lowercase();
        if !haystack.contains(&needle) {
            return false;
        }
    }
    true
}
