pub mod aggregator;
pub mod classify;
pub mod fetcher;
pub mod merge;
pub mod rewrite;
pub mod similarity;
pub mod sources;
pub mod store;
pub mod types;

pub use aggregator::NewsAggregator;
pub use fetcher::Fetcher;
pub use rewrite::Rewriter;
pub use sources::{FeedSource, MediaStackSource, NewsApiSource, RssSource};
pub use store::{article_id, slugify, ArticleStore};
pub use types::*;
