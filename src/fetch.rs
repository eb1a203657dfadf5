//! Page fetching with a polite randomized delay.
//!
//! [`PageFetcher`] is the seam between the scrape pipeline and the network.
//! [`HttpFetcher`] is the production implementation: it pauses for a random
//! duration before every request so the target sites see human-paced
//! traffic, presents a desktop browser `User-Agent`, and bounds each request
//! with a timeout.

use crate::config::FetchConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use rand::{Rng, rng};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Retrieves the raw markup behind a URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Uniform random pause in `[min, max]` seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoliteDelay {
    min_secs: f64,
    max_secs: f64,
}

impl PoliteDelay {
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    /// Draw the next pause.
    pub fn sample(&self) -> Duration {
        if self.max_secs <= 0.0 {
            return Duration::ZERO;
        }
        let secs = if self.min_secs >= self.max_secs {
            self.max_secs
        } else {
            rng().random_range(self.min_secs..=self.max_secs)
        };
        Duration::from_secs_f64(secs.max(0.0))
    }
}

/// [`PageFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    delay: PoliteDelay,
}

impl HttpFetcher {
    /// Build the client from configuration.
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            delay: PoliteDelay::new(config.min_delay_secs, config.max_delay_secs),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let pause = self.delay.sample();
        debug!(?pause, "Waiting before request");
        sleep(pause).await;

        let t0 = Instant::now();
        let response = self.client.get(url).send().await.map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Non-success response");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| classify(url, e))?;
        info!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}

fn classify(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            source: e,
        }
    }
}

/// Read a previously saved page from disk.
#[instrument(level = "info")]
pub async fn read_saved_page(path: &std::path::Path) -> Result<String, FetchError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FetchError::Io {
            path: path.display().to_string(),
            source,
        })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_stays_within_bounds() {
        let delay = PoliteDelay::new(2.0, 5.0);
        for _ in 0..200 {
            let d = delay.sample();
            assert!(d >= Duration::from_secs(2), "{d:?} below lower bound");
            assert!(d <= Duration::from_secs(5), "{d:?} above upper bound");
        }
    }

    #[test]
    fn test_zero_delay() {
        assert_eq!(PoliteDelay::new(0.0, 0.0).sample(), Duration::ZERO);
    }

    #[test]
    fn test_degenerate_range_uses_upper_bound() {
        assert_eq!(PoliteDelay::new(1.5, 1.5).sample(), Duration::from_secs_f64(1.5));
    }

    #[test]
    fn test_http_fetcher_builds_from_defaults() {
        assert!(HttpFetcher::new(&FetchConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_read_saved_page_missing_file() {
        let err = read_saved_page(std::path::Path::new("/no/such/snapshot.html"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }

    #[tokio::test]
    async fn test_refused_connection_is_a_fetch_error() {
        let config = FetchConfig {
            timeout_secs: 2,
            min_delay_secs: 0.0,
            max_delay_secs: 0.0,
            ..FetchConfig::default()
        };
        let fetcher = HttpFetcher::new(&config).unwrap();
        // bind then drop so the port is known to be closed
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let result = fetcher.fetch(&format!("http://127.0.0.1:{port}/")).await;
        assert!(matches!(
            result,
            Err(FetchError::Transport { .. } | FetchError::Timeout { .. })
        ));
    }
}
