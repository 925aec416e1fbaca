use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Upstream provider identity. The ordering of the weights mirrors how
/// complete each provider's payloads tend to be: NewsAPI items usually carry
/// body text and an image, MediaStack is hit-or-miss, AllAfrica RDF headlines
/// are title+description only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    NewsApi,
    MediaStack,
    AllAfrica,
    Rss,
}

impl Provider {
    pub fn weight(&self) -> f64 {
        match self {
            Provider::NewsApi => 3.0,
            Provider::MediaStack => 2.0,
            Provider::AllAfrica => 1.0,
            Provider::Rss => 1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Provider::NewsApi => "newsapi",
            Provider::MediaStack => "mediastack",
            Provider::AllAfrica => "allafrica",
            Provider::Rss => "rss",
        }
    }
}

/// A single normalized feed item, produced fresh every cycle and discarded
/// after the merge stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleCandidate {
    pub title: String,
    pub description: String,
    pub body: Option<String>,
    pub image_url: Option<String>,
    pub source_name: String,
    pub source_url: String,
    pub published_at: DateTime<Utc>,
    pub country: String,
    pub category: String,
    pub provider: Provider,
}

/// The canonical, persisted record for one real-world story.
///
/// `id` is derived from content-stable fields only (normalized title +
/// canonical source URL), so re-fetching the same story yields the same id.
/// `first_seen_at` carries the freshness bookkeeping that must never leak
/// into identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub rewritten_title: String,
    pub description: String,
    pub rewritten_body: String,
    pub summary: String,
    pub image_url: Option<String>,
    pub source_name: String,
    pub source_url: String,
    pub published_at: DateTime<Utc>,
    pub country: String,
    pub category: String,
    pub provider: Provider,
    pub reading_time_minutes: u32,
    pub views: u64,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub first_seen_at: DateTime<Utc>,
    pub merge_rank: usize,
}

/// On-disk layout of the article catalog: one document, read fully into
/// memory on access and written fully on mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsDocument {
    pub articles: Vec<Article>,
    pub last_updated: Option<DateTime<Utc>>,
    pub count: usize,
}

/// Filters accepted by the article query interface. All filters are
/// optional and combine with AND semantics.
#[derive(Debug, Clone, Default)]
pub struct QueryFilters {
    /// Case-insensitive substring match on the article country.
    pub country: Option<String>,
    /// Case-insensitive exact match on the article category.
    pub category: Option<String>,
    /// Case-insensitive substring search over title, summary and body.
    pub search: Option<String>,
    pub featured: Option<bool>,
}

/// One page of query results plus pagination metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPage {
    pub items: Vec<Article>,
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
}

/// Aggregate statistics over the stored catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total: usize,
    pub by_country: HashMap<String, usize>,
    pub by_category: HashMap<String, usize>,
    pub by_provider: HashMap<String, usize>,
    pub total_views: u64,
    pub average_views: f64,
    pub articles_with_images: usize,
    pub image_percentage: u32,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Outcome of one fetch→merge→rewrite→persist cycle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSummary {
    pub fetched: usize,
    pub merged: usize,
    pub persisted: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    /// Minimum gap between requests to the same host.
    pub host_courtesy_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "news-aggregator/0.1".to_string(),
            timeout_seconds: 10,
            max_retries: 3,
            retry_delay_seconds: 2,
            host_courtesy_delay_ms: 500,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid candidate: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    General(String),
}

impl AggregatorError {
    /// Persistence failures are the only errors that must abort a cycle;
    /// everything else is contained at the component boundary.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AggregatorError::Persistence(_) | AggregatorError::Serialization(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
