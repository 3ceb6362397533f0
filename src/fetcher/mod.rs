//! Remote collaborators: the user search API and profile pages

use crate::{Interval, UserRecord};
use async_trait::async_trait;
use serde::Deserialize;

pub mod github_http;
pub mod pagination;
pub mod profile;
pub mod retry_formatter;
pub mod search;
pub mod shared_resources;

/// Fetcher errors
///
/// Transient failures never reach callers; the request layer retries them.
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// The resource does not exist (HTTP 404), never retried
    #[error("not found: {0}")]
    NotFound(String),

    /// Shutdown was requested while the request was waiting or retrying
    #[error("request cancelled by shutdown")]
    Cancelled,

    /// HTTP client could not be built or a request could not be formed
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Response parse error
    #[error("parse error: {0}")]
    ParseError(String),

    /// Network error
    #[error("network error: {0}")]
    NetworkError(String),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// One login from a search page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchItem {
    /// Account login
    pub login: String,
}

/// One page of user search results
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchPage {
    /// Number of matches the API reports for the whole query
    pub total_count: u64,
    /// Whether the API gave up before counting every match
    #[serde(default)]
    pub incomplete_results: bool,
    /// Logins on this page
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

impl SearchPage {
    /// Logins on this page, in API order
    pub fn logins(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.login.as_str())
    }
}

/// User search collaborator
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// Fetch one page of results, optionally restricted to a creation-date range
    ///
    /// # Arguments
    /// * `range` - Creation-date restriction, `None` for the unrestricted query
    /// * `page` - 1-based page number
    async fn search_page(&self, range: Option<Interval>, page: u32) -> FetcherResult<SearchPage>;

    /// Total number of matches for a range
    async fn total_count(&self, range: Option<Interval>) -> FetcherResult<u64> {
        Ok(self.search_page(range, 1).await?.total_count)
    }
}

/// Enrichment collaborator
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetch full profile attributes for a login
    ///
    /// # Errors
    /// Returns [`FetcherError::NotFound`] when the account no longer exists.
    async fn fetch_profile(&self, login: &str) -> FetcherResult<UserRecord>;
}
