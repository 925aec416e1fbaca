use crate::classify;
use crate::fetcher::Fetcher;
use crate::sources::{images, valid_candidate, FeedSource};
use crate::types::{ArticleCandidate, Provider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

const BASE_URL: &str = "https://newsapi.org/v2";
/// JSON-API payloads are expected to carry a real description; anything
/// shorter is a stub entry not worth keeping.
const MIN_DESCRIPTION_LEN: usize = 50;

/// NewsAPI country codes for the region.
const COUNTRY_CODES: &[&str] = &[
    "ke", "ng", "za", "gh", "eg", "ma", "et", "tz", "ug", "rw",
];

/// Global keyword searches that surface regional stories published outside
/// the per-country headline buckets.
const KEYWORD_QUERIES: &[&str] = &[
    "Nigeria Lagos Abuja",
    "Kenya Nairobi Mombasa",
    "South Africa Johannesburg",
    "Ghana Accra",
    "Egypt Cairo",
];

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<DateTime<Utc>>,
    source: Option<NewsApiSourceRef>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSourceRef {
    name: Option<String>,
}

/// Adapter for the NewsAPI JSON shape: per-country top headlines plus a
/// keyword sweep over the `everything` endpoint.
pub struct NewsApiSource {
    api_key: String,
}

impl NewsApiSource {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    fn normalize(&self, article: NewsApiArticle) -> Option<ArticleCandidate> {
        let title = article.title?;
        let description = article.description?;
        let source_url = article.url?;

        if !valid_candidate(&title, &description, MIN_DESCRIPTION_LEN) {
            return None;
        }

        let classification_text = format!("{title} {description}");
        Some(ArticleCandidate {
            country: classify::detect_country(&classification_text),
            category: classify::detect_category(&classification_text),
            body: article.content.filter(|c| !c.trim().is_empty()),
            image_url: article
                .url_to_image
                .as_deref()
                .and_then(images::validated_image_url),
            source_name: article
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "NewsAPI".to_string()),
            published_at: article.published_at.unwrap_or_else(Utc::now),
            provider: Provider::NewsApi,
            title,
            description,
            source_url,
        })
    }

    /// The keyword sweep pulls in global coverage; keep only items the
    /// classifier can place in the region.
    fn is_regional(candidate: &ArticleCandidate) -> bool {
        let text = format!("{} {}", candidate.title, candidate.description).to_lowercase();
        text.contains("africa") || candidate.country != classify::DEFAULT_COUNTRY
    }
}

#[async_trait]
impl FeedSource for NewsApiSource {
    fn provider(&self) -> Provider {
        Provider::NewsApi
    }

    fn source_name(&self) -> String {
        "NewsAPI".to_string()
    }

    async fn fetch(&self, fetcher: &Fetcher) -> Vec<ArticleCandidate> {
        let mut candidates = Vec::new();

        for code in COUNTRY_CODES {
            let url = format!(
                "{BASE_URL}/top-headlines?country={code}&language=en&pageSize=10&apiKey={}",
                self.api_key
            );
            match fetcher.fetch_json::<NewsApiResponse>(&url).await {
                Ok(response) => {
                    candidates.extend(
                        response
                            .articles
                            .into_iter()
                            .filter_map(|a| self.normalize(a)),
                    );
                }
                Err(e) => warn!("NewsAPI headlines failed for {}: {}", code, e),
            }
        }

        for query in KEYWORD_QUERIES {
            let url = format!(
                "{BASE_URL}/everything?q={}&language=en&sortBy=publishedAt&pageSize=10&apiKey={}",
                query.replace(' ', "+"),
                self.api_key
            );
            match fetcher.fetch_json::<NewsApiResponse>(&url).await {
                Ok(response) => {
                    candidates.extend(
                        response
                            .articles
                            .into_iter()
                            .filter_map(|a| self.normalize(a))
                            .filter(Self::is_regional),
                    );
                }
                Err(e) => warn!("NewsAPI search failed for \"{}\": {}", query, e),
            }
        }

        info!("NewsAPI: fetched {} candidates", candidates.len());
        candidates
    }
}
