use crate::classify;
use crate::fetcher::Fetcher;
use crate::sources::{html_to_text, images, valid_candidate, FeedSource};
use crate::types::{AggregatorError, ArticleCandidate, Provider, Result};
use async_trait::async_trait;
use chrono::Utc;
use feed_rs::parser;
use tracing::{info, warn};

/// How many image-less entries per feed are worth a secondary page fetch.
/// The og:image lookup costs one request per article, so it is rationed.
const PAGE_IMAGE_LOOKUP_BUDGET: usize = 5;

/// Description floor for the AllAfrica RDF headlines; items below it are
/// teaser stubs not worth keeping.
const ALLAFRICA_MIN_DESCRIPTION_LEN: usize = 50;

/// One XML feed endpoint plus optional metadata hints for its items.
#[derive(Debug, Clone)]
pub struct FeedSpec {
    pub url: String,
    pub country_hint: Option<&'static str>,
    pub category_hint: Option<&'static str>,
    /// Minimum description length for this feed's items.
    pub min_description_len: usize,
}

impl FeedSpec {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            country_hint: None,
            category_hint: None,
            min_description_len: 1,
        }
    }

    pub fn with_country(mut self, country: &'static str) -> Self {
        self.country_hint = Some(country);
        self
    }

    pub fn with_min_description(mut self, len: usize) -> Self {
        self.min_description_len = len;
        self
    }
}

/// Adapter for XML wire formats: RSS 2.0, RSS 1.0/RDF and Atom all parse
/// through feed-rs, so one adapter covers the AllAfrica RDF headline feeds
/// and ordinary RSS/Atom sources alike.
pub struct RssSource {
    name: String,
    provider: Provider,
    feeds: Vec<FeedSpec>,
    page_image_lookup: bool,
}

impl RssSource {
    pub fn new(name: impl Into<String>, provider: Provider, feeds: Vec<FeedSpec>) -> Self {
        Self {
            name: name.into(),
            provider,
            feeds,
            page_image_lookup: false,
        }
    }

    pub fn with_page_image_lookup(mut self) -> Self {
        self.page_image_lookup = true;
        self
    }

    pub fn feeds(&self) -> &[FeedSpec] {
        &self.feeds
    }

    /// AllAfrica per-topic and per-country RDF headline feeds.
    pub fn allafrica() -> Self {
        let topics = ["latest", "business", "politics", "sport", "health", "tech"];
        let countries = ["kenya", "nigeria", "southafrica", "ghana", "egypt"];

        let mut feeds: Vec<FeedSpec> = topics
            .iter()
            .map(|topic| {
                FeedSpec::new(format!(
                    "https://allafrica.com/tools/headlines/rdf/{topic}/headlines.rdf"
                ))
            })
            .collect();
        feeds.extend(countries.iter().map(|country| {
            FeedSpec::new(format!(
                "https://allafrica.com/tools/headlines/rdf/{country}/headlines.rdf"
            ))
        }));
        let feeds = feeds
            .into_iter()
            .map(|spec| spec.with_min_description(ALLAFRICA_MIN_DESCRIPTION_LEN))
            .collect();

        Self::new("AllAfrica", Provider::AllAfrica, feeds).with_page_image_lookup()
    }

    /// Google News per-country search RSS.
    pub fn google_news() -> Self {
        let feeds = vec![
            FeedSpec::new("https://news.google.com/rss/search?q=Kenya&hl=en-KE&gl=KE&ceid=KE:en")
                .with_country("Kenya"),
            FeedSpec::new("https://news.google.com/rss/search?q=Nigeria&hl=en-NG&gl=NG&ceid=NG:en")
                .with_country("Nigeria"),
            FeedSpec::new(
                "https://news.google.com/rss/search?q=South+Africa&hl=en-ZA&gl=ZA&ceid=ZA:en",
            )
            .with_country("South Africa"),
            FeedSpec::new("https://news.google.com/rss/search?q=Ghana&hl=en-GH&gl=GH&ceid=GH:en")
                .with_country("Ghana"),
            FeedSpec::new("https://news.google.com/rss/search?q=Egypt&hl=en-EG&gl=EG&ceid=EG:en")
                .with_country("Egypt"),
        ];

        Self::new("Google News", Provider::Rss, feeds)
    }

    async fn fetch_feed(&self, fetcher: &Fetcher, spec: &FeedSpec) -> Result<Vec<ArticleCandidate>> {
        let content = fetcher.fetch_text(&spec.url).await?;
        let feed = parser::parse(content.as_bytes())
            .map_err(|e| AggregatorError::Parse(format!("{}: {e}", spec.url)))?;

        let feed_title = feed.title.map(|t| t.content);
        let mut candidates = Vec::new();
        let mut lookup_budget = PAGE_IMAGE_LOOKUP_BUDGET;

        for entry in feed.entries {
            let title = match &entry.title {
                Some(t) => t.content.trim().to_string(),
                None => continue,
            };
            let link = match entry.links.first() {
                Some(l) => l.href.clone(),
                None => continue,
            };

            let description = entry
                .summary
                .as_ref()
                .map(|s| html_to_text(&s.content))
                .unwrap_or_default();
            if !valid_candidate(&title, &description, spec.min_description_len) {
                continue;
            }

            let body = entry
                .content
                .as_ref()
                .and_then(|c| c.body.as_deref())
                .map(html_to_text)
                .filter(|b| !b.is_empty());

            // Image strategy, cheapest first: media metadata, then inline
            // markup, then (rationed) the article page's og:image tag.
            let raw_html = entry
                .summary
                .as_ref()
                .map(|s| s.content.clone())
                .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
                .unwrap_or_default();
            let mut image_url =
                images::image_from_media(&entry.media).or_else(|| images::image_from_html(&raw_html));
            if image_url.is_none() && self.page_image_lookup && lookup_budget > 0 {
                lookup_budget -= 1;
                image_url = images::page_preview_image(fetcher, &link).await;
            }

            let published_at = entry
                .published
                .or(entry.updated)
                .unwrap_or_else(Utc::now);

            let classification_text = format!("{title} {description}");
            let country = spec
                .country_hint
                .or_else(|| classify::country_from_feed_url(&spec.url))
                .map(str::to_string)
                .unwrap_or_else(|| classify::detect_country(&classification_text));
            let category = spec
                .category_hint
                .or_else(|| classify::category_from_feed_url(&spec.url))
                .map(str::to_string)
                .unwrap_or_else(|| classify::detect_category(&classification_text));

            candidates.push(ArticleCandidate {
                title,
                description,
                body,
                image_url,
                source_name: feed_title.clone().unwrap_or_else(|| self.name.clone()),
                source_url: link,
                published_at,
                country,
                category,
                provider: self.provider,
            });
        }

        Ok(candidates)
    }
}

#[async_trait]
impl FeedSource for RssSource {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn source_name(&self) -> String {
        self.name.clone()
    }

    async fn fetch(&self, fetcher: &Fetcher) -> Vec<ArticleCandidate> {
        let mut candidates = Vec::new();

        for spec in &self.feeds {
            match self.fetch_feed(fetcher, spec).await {
                Ok(mut items) => candidates.append(&mut items),
                Err(e) => {
                    warn!("{}: feed {} failed: {}", self.name, spec.url, e);
                }
            }
        }

        info!("{}: fetched {} candidates", self.name, candidates.len());
        candidates
    }
}
