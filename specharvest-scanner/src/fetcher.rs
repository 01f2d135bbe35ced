use crate::error::{Result, ScanError};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How often and how patiently a failed request is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before retry number `attempt` (0-based): `base_delay * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

/// The single I/O boundary of the harvester: HTTP GET with retries.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl PageFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(
                "specharvest/",
                env!("CARGO_PKG_VERSION"),
                " (https://github.com/trapdoorsec/specharvest)"
            ))
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs((timeout_secs / 2).max(1)))
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Fetch `url` and return its body, retrying transient failures.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        "Request to {} failed: {}. Retrying in {:?} (attempt {}/{})",
                        url,
                        e,
                        delay,
                        attempt + 1,
                        self.retry.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_transient() && self.retry.max_retries > 0 => {
                    return Err(ScanError::RetriesExhausted {
                        url: url.to_string(),
                        attempts: attempt + 1,
                        last_error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();
        debug!("{} -> {} in {:?}", url, status.as_u16(), start.elapsed());

        if !status.is_success() {
            return Err(ScanError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}
