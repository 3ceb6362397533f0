//! Rate-limited request layer shared by the search and profile collaborators
//!
//! Every request goes through [`GithubHttpClient::fetch`], which never hands a
//! transient failure back to its caller:
//! - 404 is the only error returned ([`FetcherError::NotFound`])
//! - rate-limit responses pause every caller sharing the limiter until the
//!   provider's reset time, then the same URL is retried
//! - transport failures, unexpected statuses and unreadable bodies are retried
//!   after a fixed delay, without limit
//!
//! The only other way out of the loop is a shutdown request.

use chrono::Utc;
use reqwest::header::{HeaderMap, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::collector::config::RetryPolicy;
use crate::collector::rate_limit::{reset_wait, RateLimiter};
use crate::credentials::Credentials;
use crate::fetcher::retry_formatter::{extract_error_type, format_retry, RetryErrorType};
use crate::fetcher::{FetcherError, FetcherResult};
use crate::metrics::{record_rate_limit_wait, record_retry_backoff, HttpRequestMetrics};
use crate::shutdown::{sleep_or_shutdown, SharedShutdown};

/// Header carrying the Unix time at which the quota resets
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// Header carrying the remaining quota in the current window
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Decoded response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBody {
    /// Body text, decompressed
    pub body: String,
    /// Value of the `Content-Type` header, if any
    pub content_type: Option<String>,
}

/// Request layer for one remote source
pub struct GithubHttpClient {
    client: Arc<Client>,
    rate_limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    credentials: Option<Credentials>,
    shutdown: Option<SharedShutdown>,
    endpoint: &'static str,
}

impl GithubHttpClient {
    /// Create new request layer
    ///
    /// # Arguments
    /// * `client` - Shared HTTP client (Arc for cheap cloning)
    /// * `rate_limiter` - Limiter shared by every caller of the same source
    /// * `retry` - Delays applied between attempts
    /// * `endpoint` - Short label used in logs and metrics ("search", "profile")
    pub fn new(
        client: Arc<Client>,
        rate_limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
        endpoint: &'static str,
    ) -> Self {
        Self {
            client,
            rate_limiter,
            retry,
            credentials: None,
            shutdown: None,
            endpoint,
        }
    }

    /// Authenticate every request with basic auth
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Stop retrying once shutdown is requested
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Limiter this layer reports rate-limit pauses to
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// Fetch a URL until a usable response arrives
    ///
    /// # Errors
    /// [`FetcherError::NotFound`] on 404, [`FetcherError::Cancelled`] on shutdown.
    pub async fn fetch(&self, url: &str, params: &[(&str, String)]) -> FetcherResult<FetchedBody> {
        let mut attempt: u64 = 0;

        loop {
            self.acquire().await?;

            let mut request = self.client.get(url).query(params);
            if let Some(credentials) = &self.credentials {
                request = request.basic_auth(credentials.client_id(), Some(credentials.client_secret()));
            }

            let request_metrics = HttpRequestMetrics::start(self.endpoint, attempt + 1);
            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    request_metrics.record_network_error();
                    let error_type = extract_error_type(None, Some(&e));
                    self.retry_after(url, attempt, error_type, &e.to_string()).await?;
                    attempt += 1;
                    continue;
                }
            };

            let status = response.status();
            request_metrics.record_complete(status.as_u16());

            if status == StatusCode::NOT_FOUND {
                debug!(url = %url, "Resource not found");
                return Err(FetcherError::NotFound(url.to_string()));
            }

            if is_rate_limited(status, response.headers()) {
                let wait = rate_limit_wait(
                    response.headers(),
                    Utc::now().timestamp(),
                    self.retry.rate_limit_fallback,
                );
                self.rate_limiter.pause_for(wait);
                record_rate_limit_wait(self.endpoint, wait);
                warn!(
                    endpoint = self.endpoint,
                    status = status.as_u16(),
                    wait_secs = wait.as_secs(),
                    "{}",
                    format_retry(self.endpoint, attempt, RetryErrorType::RateLimit, wait)
                );
                attempt += 1;
                continue;
            }

            if !status.is_success() {
                let error_type = extract_error_type(Some(status), None);
                self.retry_after(url, attempt, error_type, status.as_str()).await?;
                attempt += 1;
                continue;
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);

            match response.text().await {
                Ok(body) => {
                    if attempt > 0 {
                        debug!(endpoint = self.endpoint, attempts = attempt + 1, "Request succeeded after retry");
                    }
                    return Ok(FetchedBody { body, content_type });
                }
                Err(e) => {
                    let error_type = extract_error_type(None, Some(&e));
                    self.retry_after(url, attempt, error_type, &e.to_string()).await?;
                    attempt += 1;
                }
            }
        }
    }

    /// Fetch a URL and deserialize its JSON body
    ///
    /// A body that does not decode is treated like any other transient failure.
    pub async fn get_json<T>(&self, url: &str, params: &[(&str, String)]) -> FetcherResult<T>
    where
        T: DeserializeOwned,
    {
        let mut attempt: u64 = 0;
        loop {
            let fetched = self.fetch(url, params).await?;
            match serde_json::from_str::<T>(&fetched.body) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    self.retry_after(url, attempt, RetryErrorType::MalformedBody, &e.to_string())
                        .await?;
                    attempt += 1;
                }
            }
        }
    }

    async fn acquire(&self) -> FetcherResult<()> {
        match &self.shutdown {
            Some(shutdown) => {
                if shutdown.is_shutdown_requested() {
                    return Err(FetcherError::Cancelled);
                }
                tokio::select! {
                    result = self.rate_limiter.acquire() => {
                        result.map_err(|e| FetcherError::NetworkError(format!("Rate limiter error: {e}")))
                    }
                    _ = shutdown.wait_for_shutdown() => Err(FetcherError::Cancelled),
                }
            }
            None => self
                .rate_limiter
                .acquire()
                .await
                .map_err(|e| FetcherError::NetworkError(format!("Rate limiter error: {e}"))),
        }
    }

    async fn retry_after(
        &self,
        url: &str,
        attempt: u64,
        error_type: RetryErrorType,
        detail: &str,
    ) -> FetcherResult<()> {
        let wait = self.retry.retry_delay;
        warn!(
            endpoint = self.endpoint,
            url = %url,
            error = %detail,
            "{}",
            format_retry(self.endpoint, attempt, error_type, wait)
        );
        record_retry_backoff(self.endpoint, wait);

        if sleep_or_shutdown(wait, self.shutdown.as_ref()).await {
            Ok(())
        } else {
            Err(FetcherError::Cancelled)
        }
    }
}

/// Whether a response signals an exhausted quota
///
/// 429 always does. 403 does only with `Retry-After` or a remaining quota of
/// zero; the reset header alone is present on every API response.
pub fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    status == StatusCode::FORBIDDEN
        && (headers.contains_key(RETRY_AFTER)
            || header_str(headers, RATE_LIMIT_REMAINING_HEADER).map(str::trim) == Some("0"))
}

/// How long to pause after a rate-limit response
///
/// `Retry-After` wins when present, then `max(0, reset - now)` from the reset
/// header, then `fallback`.
pub fn rate_limit_wait(headers: &HeaderMap, now_epoch_secs: i64, fallback: Duration) -> Duration {
    if let Some(secs) = header_str(headers, RETRY_AFTER.as_str()).and_then(|v| v.trim().parse::<u64>().ok()) {
        return Duration::from_secs(secs);
    }

    match header_str(headers, RATE_LIMIT_RESET_HEADER).and_then(|v| v.trim().parse::<i64>().ok()) {
        Some(reset) => reset_wait(reset, now_epoch_secs),
        None => fallback,
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
