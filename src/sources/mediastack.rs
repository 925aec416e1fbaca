use crate::classify;
use crate::fetcher::Fetcher;
use crate::sources::{images, valid_candidate, FeedSource};
use crate::types::{ArticleCandidate, Provider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

const BASE_URL: &str = "https://api.mediastack.com/v1";
const MIN_DESCRIPTION_LEN: usize = 50;

/// MediaStack country codes, comma-joined into a single filter parameter.
const COUNTRY_CODES: &[&str] = &[
    "ke", "ng", "za", "gh", "eg", "ma", "et", "tz", "ug", "rw",
];

#[derive(Debug, Deserialize)]
struct MediaStackResponse {
    #[serde(default)]
    data: Vec<MediaStackArticle>,
}

#[derive(Debug, Deserialize)]
struct MediaStackArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    image: Option<String>,
    source: Option<String>,
    category: Option<String>,
    published_at: Option<String>,
}

/// Adapter for the MediaStack JSON shape: one request covering all country
/// codes, sorted newest-first upstream.
pub struct MediaStackSource {
    api_key: String,
}

impl MediaStackSource {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    fn normalize(&self, article: MediaStackArticle) -> Option<ArticleCandidate> {
        let title = article.title?;
        let description = article.description?;
        let source_url = article.url?;

        if !valid_candidate(&title, &description, MIN_DESCRIPTION_LEN) {
            return None;
        }

        let classification_text = format!("{title} {description}");
        let published_at = article
            .published_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now);

        Some(ArticleCandidate {
            country: classify::detect_country(&classification_text),
            category: article
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| classify::detect_category(&classification_text)),
            body: None,
            image_url: article
                .image
                .as_deref()
                .and_then(images::validated_image_url),
            source_name: article.source.unwrap_or_else(|| "MediaStack".to_string()),
            published_at,
            provider: Provider::MediaStack,
            title,
            description,
            source_url,
        })
    }
}

/// MediaStack timestamps come as RFC 3339 with an offset; tolerate a bare
/// date-time as well.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

#[async_trait]
impl FeedSource for MediaStackSource {
    fn provider(&self) -> Provider {
        Provider::MediaStack
    }

    fn source_name(&self) -> String {
        "MediaStack".to_string()
    }

    async fn fetch(&self, fetcher: &Fetcher) -> Vec<ArticleCandidate> {
        let url = format!(
            "{BASE_URL}/news?access_key={}&countries={}&languages=en&limit=50&sort=published_desc",
            self.api_key,
            COUNTRY_CODES.join(",")
        );

        let candidates = match fetcher.fetch_json::<MediaStackResponse>(&url).await {
            Ok(response) => response
                .data
                .into_iter()
                .filter_map(|a| self.normalize(a))
                .collect(),
            Err(e) => {
                warn!("MediaStack fetch failed: {}", e);
                Vec::new()
            }
        };

        info!("MediaStack: fetched {} candidates", candidates.len());
        candidates
    }
}
