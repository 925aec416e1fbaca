use crate::fetcher::Fetcher;
use crate::merge;
use crate::rewrite::Rewriter;
use crate::sources::FeedSource;
use crate::store::ArticleStore;
use crate::types::{ArticleCandidate, CycleSummary, FetchConfig, Result};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Feed adapters in flight at once. Small on purpose: upstream courtesy
/// matters more than cycle latency at a two-hour cadence.
const ADAPTER_CONCURRENCY: usize = 3;
/// Rewriting runs in small chunks with a short pause between them, purely to
/// smooth resource usage; correctness does not depend on it.
const REWRITE_CHUNK_SIZE: usize = 10;
const REWRITE_CHUNK_PAUSE: Duration = Duration::from_millis(100);

/// Orchestrates the periodic fetch→merge→rewrite→persist cycle and exposes
/// the manual trigger. Owns the store for the duration of a cycle: exactly
/// one writer per cycle, by contract rather than by lock.
pub struct NewsAggregator {
    sources: Vec<Box<dyn FeedSource>>,
    fetcher: Fetcher,
    store: ArticleStore,
    /// Pinned rewrite seed. `None` draws a fresh seed every cycle, which is
    /// the production setting; tests pin one for byte-stable output.
    seed: Option<u64>,
}

impl NewsAggregator {
    pub fn new(
        sources: Vec<Box<dyn FeedSource>>,
        fetch_config: FetchConfig,
        store: ArticleStore,
        seed: Option<u64>,
    ) -> Result<Self> {
        Ok(Self {
            sources,
            fetcher: Fetcher::new(fetch_config)?,
            store,
            seed,
        })
    }

    pub fn store(&self) -> &ArticleStore {
        &self.store
    }

    /// Run one full cycle. This is also the manual trigger: callers get the
    /// processed/persisted counts back.
    ///
    /// Adapter failures never abort the cycle; whatever subset of sources
    /// succeeded feeds the merge. Only a persistence failure propagates.
    pub async fn run_cycle(&self) -> Result<CycleSummary> {
        let started = Instant::now();
        info!("Starting news cycle with {} sources", self.sources.len());

        // Wait for all, tolerate individual failure. Merge needs the full
        // pool, so the cycle is not incremental.
        let fetcher = &self.fetcher;
        let pools: Vec<Vec<ArticleCandidate>> = stream::iter(self.sources.iter())
            .map(|source| source.fetch(fetcher))
            .buffer_unordered(ADAPTER_CONCURRENCY)
            .collect()
            .await;

        let pool: Vec<ArticleCandidate> = pools.into_iter().flatten().collect();
        let fetched = pool.len();

        let canonical = merge::merge(pool);
        let merged = canonical.len();

        let rewriter = match self.seed {
            Some(seed) => Rewriter::with_seed(seed),
            None => Rewriter::from_entropy(),
        };

        let now = Utc::now();
        let mut articles = Vec::with_capacity(merged);
        for (chunk_index, chunk) in canonical.chunks(REWRITE_CHUNK_SIZE).enumerate() {
            if chunk_index > 0 {
                tokio::time::sleep(REWRITE_CHUNK_PAUSE).await;
            }
            for (offset, candidate) in chunk.iter().enumerate() {
                let merge_rank = chunk_index * REWRITE_CHUNK_SIZE + offset + 1;
                articles.push(rewriter.rewrite_article(candidate, merge_rank, now));
            }
        }

        let persisted = self.store.upsert_cycle(articles)?;

        let summary = CycleSummary {
            fetched,
            merged,
            persisted,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            "Cycle complete: {} fetched, {} merged, {} persisted in {}ms",
            summary.fetched, summary.merged, summary.persisted, summary.duration_ms
        );
        Ok(summary)
    }

    /// Timer-driven loop: one cycle per interval, first one immediately.
    /// A failed cycle is logged and the loop continues; a running cycle
    /// cannot be cancelled mid-flight.
    pub async fn run_scheduled(&self, every: Duration) {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(e) = self.run_cycle().await {
                error!("Scheduled cycle failed: {}", e);
            }
        }
    }
}
