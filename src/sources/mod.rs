pub mod images;
pub mod mediastack;
pub mod newsapi;
pub mod rss;

pub use mediastack::MediaStackSource;
pub use newsapi::NewsApiSource;
pub use rss::RssSource;

use crate::fetcher::Fetcher;
use crate::types::{ArticleCandidate, Provider};
use async_trait::async_trait;

/// A per-source feed adapter. Implementations own everything source-shaped:
/// wire format, credentials, image-location quirks, metadata classification.
///
/// `fetch` must never fail to its caller. One source going dark, timing out
/// or serving garbage is an ordinary event; the adapter logs it and returns
/// whatever it could normalize, possibly nothing.
#[async_trait]
pub trait FeedSource: Send + Sync {
    fn provider(&self) -> Provider;

    fn source_name(&self) -> String;

    async fn fetch(&self, fetcher: &Fetcher) -> Vec<ArticleCandidate>;
}

/// Shared candidate validation. Items without a usable title or with the
/// NewsAPI tombstone marker are dropped silently before they reach merge.
pub fn valid_candidate(title: &str, description: &str, min_description_len: usize) -> bool {
    let title = title.trim();
    title.len() > 10
        && title != "[Removed]"
        && !title.to_lowercase().contains("removed")
        && description.trim().len() >= min_description_len
}

/// Strip markup from feed-supplied HTML fragments. Good enough for RSS
/// descriptions; a full HTML parser would be overkill here.
pub fn html_to_text(html: &str) -> String {
    html.chars()
        .fold((String::new(), false), |(mut text, in_tag), c| match c {
            '<' => (text, true),
            '>' => (text, false),
            _ if !in_tag => {
                text.push(c);
                (text, in_tag)
            }
            _ => (text, in_tag),
        })
        .0
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
