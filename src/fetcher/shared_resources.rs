//! HTTP client construction
//!
//! One [`reqwest::Client`] is built per run and shared by the search and profile
//! request layers so connection pooling works across every worker.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::collector::config::{HTTP_CONNECT_TIMEOUT_SECS, HTTP_REQUEST_TIMEOUT_SECS, USER_AGENT};
use crate::fetcher::{FetcherError, FetcherResult};

/// Build the shared HTTP client
///
/// Configured with explicit timeouts to prevent indefinite hangs:
/// - Connect timeout: 10 seconds
/// - Request timeout: 30 seconds
///
/// Compressed bodies are decoded transparently.
pub fn build_http_client() -> FetcherResult<Arc<Client>> {
    Client::builder()
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .gzip(true)
        .build()
        .map(Arc::new)
        .map_err(|e| {
            FetcherError::HttpError(format!(
                "Failed to build HTTP client: {e}. Check system TLS configuration."
            ))
        })
}
