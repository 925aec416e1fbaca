use anyhow::Context;
use clap::Parser;
use news_aggregator::{
    ArticleStore, FeedSource, FetchConfig, MediaStackSource, NewsAggregator, NewsApiSource,
    RssSource,
};
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "news-aggregator", about = "Fetch, deduplicate and rewrite African news feeds")]
struct Args {
    /// Path of the persisted article document.
    #[arg(long, default_value = "data/news.json")]
    data_file: String,

    /// Retention cap: the store keeps at most this many articles.
    #[arg(long, default_value_t = 500)]
    max_articles: usize,

    /// Hours between scheduled cycles.
    #[arg(long, default_value_t = 2)]
    interval_hours: u64,

    /// Run a single cycle and exit instead of scheduling.
    #[arg(long)]
    once: bool,

    /// Pin the rewrite seed; omit for a fresh seed per cycle.
    #[arg(long)]
    seed: Option<u64>,

    /// NewsAPI key; falls back to NEWS_API_KEY.
    #[arg(long, env = "NEWS_API_KEY")]
    newsapi_key: Option<String>,

    /// MediaStack key; falls back to MEDIASTACK_API_KEY.
    #[arg(long, env = "MEDIASTACK_API_KEY")]
    mediastack_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut sources: Vec<Box<dyn FeedSource>> = vec![
        Box::new(RssSource::allafrica()),
        Box::new(RssSource::google_news()),
    ];
    if let Some(key) = args.newsapi_key {
        sources.push(Box::new(NewsApiSource::new(key)));
    }
    if let Some(key) = args.mediastack_key {
        sources.push(Box::new(MediaStackSource::new(key)));
    }

    info!(
        "Starting news-aggregator: {} sources, store at {}",
        sources.len(),
        args.data_file
    );

    let store = ArticleStore::open(&args.data_file, args.max_articles);
    let aggregator = NewsAggregator::new(sources, FetchConfig::default(), store, args.seed)
        .context("failed to initialize aggregator")?;

    if args.once {
        let summary = aggregator.run_cycle().await?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    aggregator
        .run_scheduled(Duration::from_secs(args.interval_hours * 3600))
        .await;
    Ok(())
}
