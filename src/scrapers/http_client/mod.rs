//! HTTP fetching of careers pages.

mod user_agent;

pub use user_agent::{resolve_user_agent, USER_AGENT};

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, warn};

use super::error::FetchError;
use super::rate_limiter::{DomainStats, RateLimiter};

const ACCEPT_VALUE: &str = "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8";

/// Upper bound on a single retry wait.
const MAX_RETRY_WAIT: Duration = Duration::from_secs(60);

/// Wait before retry number `attempt` (0-based): `base` doubled per attempt, capped.
fn retry_wait(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
        .min(MAX_RETRY_WAIT)
}

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects; relative links resolve against this.
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl FetchedPage {
    /// Whether the body should be treated as JSON.
    pub fn is_json(&self) -> bool {
        if let Some(ref ct) = self.content_type {
            if ct.contains("json") {
                return true;
            }
            if ct.contains("html") {
                return false;
            }
        }
        let trimmed = self.body.trim_start();
        trimmed.starts_with('{') || trimmed.starts_with('[')
    }
}

/// Source of careers pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// reqwest-backed fetcher with per-domain rate limiting and retries.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter,
    max_retries: u32,
    retry_backoff: Duration,
}

impl HttpClient {
    /// Create a new HTTP client.
    /// - user_agent None: default internscout user agent
    /// - Some("impersonate"): random real browser user agent
    /// - Some(custom): custom user agent string
    pub fn new(
        timeout: Duration,
        user_agent: Option<&str>,
        rate_limiter: RateLimiter,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(resolve_user_agent(user_agent))
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| FetchError::Request {
                url: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            rate_limiter,
            max_retries: 2,
            retry_backoff: Duration::from_secs(2),
        })
    }

    /// Retry transient failures up to `max_retries` times, doubling the wait each time.
    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff = backoff;
        self
    }

    /// Per-domain request statistics gathered so far.
    pub async fn domain_stats(&self) -> HashMap<String, DomainStats> {
        self.rate_limiter.get_stats().await
    }

    async fn get_once(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let domain = self.rate_limiter.acquire(url).await;

        let response = match self.client.get(url).header(ACCEPT, ACCEPT_VALUE).send().await {
            Ok(r) => r,
            Err(e) => {
                if let Some(ref domain) = domain {
                    self.rate_limiter.report_server_error(domain).await;
                }
                return Err(FetchError::from_reqwest(url, e));
            }
        };

        let status = response.status();
        let status_code = status.as_u16();

        if let Some(ref domain) = domain {
            if status_code == 429 || status_code == 503 {
                self.rate_limiter
                    .report_rate_limit(domain, status_code)
                    .await;
            } else if status.is_server_error() {
                self.rate_limiter.report_server_error(domain).await;
            } else if status.is_success() {
                self.rate_limiter.report_success(domain).await;
            }
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status_code,
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        debug!("Fetched {} ({} bytes)", final_url, body.len());

        Ok(FetchedPage {
            url: final_url,
            status: status_code,
            content_type,
            body,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        url::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;

        let mut attempt = 0;
        loop {
            match self.get_once(url).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let wait = retry_wait(self.retry_backoff, attempt);
                    attempt += 1;
                    warn!(
                        "Fetch of {} failed ({}), retry {}/{} in {:?}",
                        url, e, attempt, self.max_retries, wait
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
