use crate::types::{AggregatorError, FetchConfig, Result};
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

/// Shared HTTP client for all feed adapters. Every request carries a fixed
/// timeout; transient failures (network errors, 5xx, 429) are retried with
/// exponential backoff up to the configured ceiling. Consecutive requests to
/// the same host are spaced by a short courtesy delay.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
    rate_limiter: Arc<RwLock<HashMap<String, Instant>>>,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            config,
            rate_limiter: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Fetch a URL as text, retrying transient failures.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        self.apply_rate_limit(url).await?;

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 16),
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        };

        let mut last_error = AggregatorError::General(format!("no attempt made for {url}"));

        for attempt in 0..=self.config.max_retries {
            match self.try_fetch(url).await {
                Ok(body) => {
                    debug!("Fetched {} ({} bytes)", url, body.len());
                    return Ok(body);
                }
                Err((err, retryable)) => {
                    if !retryable {
                        return Err(err);
                    }
                    last_error = err;
                    if attempt < self.config.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!(
                                "Attempt {} failed for {}, retrying in {:?}",
                                attempt + 1,
                                url,
                                delay
                            );
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }
        }

        warn!(
            "Giving up on {} after {} attempts",
            url,
            self.config.max_retries + 1
        );
        Err(last_error)
    }

    /// Fetch a URL and deserialize the JSON body.
    pub async fn fetch_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.fetch_text(url).await?;
        serde_json::from_str(&body)
            .map_err(|e| AggregatorError::Parse(format!("invalid JSON from {url}: {e}")))
    }

    /// Single-attempt page fetch used for last-resort preview-image lookups.
    /// Not worth a retry storm: a missing og:image just means no image.
    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        self.apply_rate_limit(url).await?;
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(AggregatorError::General(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }
        Ok(response.text().await?)
    }

    async fn try_fetch(&self, url: &str) -> std::result::Result<String, (AggregatorError, bool)> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            // Connect failures and timeouts are transient by assumption.
            Err(e) => return Err((AggregatorError::Http(e), true)),
        };

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err((
                AggregatorError::General(format!("HTTP {status} from {url}")),
                true,
            ));
        }
        if !status.is_success() {
            return Err((
                AggregatorError::General(format!("HTTP {status} from {url}")),
                false,
            ));
        }

        match response.text().await {
            Ok(body) => Ok(body),
            Err(e) => Err((AggregatorError::Http(e), true)),
        }
    }

    async fn apply_rate_limit(&self, url: &str) -> Result<()> {
        let host = Url::parse(url)?
            .host_str()
            .unwrap_or_default()
            .to_string();

        let min_interval = Duration::from_millis(self.config.host_courtesy_delay_ms);

        // The lock is only held to read and stamp the host's slot; the wait
        // itself happens outside it, so one host's courtesy delay never
        // stalls fetches to another host. Re-check after sleeping in case a
        // concurrent fetch re-stamped the slot.
        loop {
            let wait_time = {
                let mut rate_limiter = self.rate_limiter.write().await;
                let now = Instant::now();
                match rate_limiter.get(&host) {
                    Some(last_request) if now.duration_since(*last_request) < min_interval => {
                        Some(min_interval - now.duration_since(*last_request))
                    }
                    _ => {
                        rate_limiter.insert(host.clone(), now);
                        None
                    }
                }
            };

            match wait_time {
                Some(delay) => {
                    debug!("Rate limiting {}: waiting {:?}", host, delay);
                    tokio::time::sleep(delay).await;
                }
                None => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher_with_delay(ms: u64) -> Fetcher {
        Fetcher::new(FetchConfig {
            host_courtesy_delay_ms: ms,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn courtesy_delay_spaces_same_host_requests() {
        let fetcher = fetcher_with_delay(100);
        fetcher
            .apply_rate_limit("https://a.example.com/1")
            .await
            .unwrap();

        let started = Instant::now();
        fetcher
            .apply_rate_limit("https://a.example.com/2")
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn one_host_waiting_does_not_stall_another() {
        let fetcher = Arc::new(fetcher_with_delay(300));
        fetcher
            .apply_rate_limit("https://a.example.com/1")
            .await
            .unwrap();

        let waiting = {
            let fetcher = Arc::clone(&fetcher);
            tokio::spawn(async move { fetcher.apply_rate_limit("https://a.example.com/2").await })
        };
        // Let the second same-host request reach its courtesy wait.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let started = Instant::now();
        fetcher
            .apply_rate_limit("https://b.example.com/1")
            .await
            .unwrap();
        assert!(
            started.elapsed() < Duration::from_millis(150),
            "unrelated host was stalled behind another host's delay"
        );

        waiting.await.unwrap().unwrap();
    }
}
