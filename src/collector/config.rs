//! Collection configuration constants and run settings

use std::time::Duration;

/// Maximum number of results the search API reports reliably for one query.
/// An interval is valid only while its total count stays strictly below this.
pub const RESULT_CAP: u64 = 1000;

/// Results per search page (the API maximum).
pub const PAGE_SIZE: u64 = 100;

/// Default number of concurrent enrichment workers.
pub const DEFAULT_WORKERS: usize = 20;

/// Upper bound for the worker pool; beyond this the profile site throttles hard.
pub const MAX_WORKERS: usize = 64;

/// Fixed delay before retrying a search request after a transport failure
/// or an unusable response.
pub const NETWORK_RETRY_DELAY_MS: u64 = 10_000; // 10 seconds

/// Fixed delay before retrying a profile page after a transport failure.
pub const PROFILE_RETRY_DELAY_MS: u64 = 3_000; // 3 seconds

/// Wait applied to a rate-limit response that carries no usable reset header.
pub const RATE_LIMIT_FALLBACK_WAIT_SECS: u64 = 30;

/// Search requests allowed per window for an authenticated client.
pub const SEARCH_REQUESTS_PER_WINDOW: usize = 30;

/// Length of the search request window (seconds).
pub const SEARCH_WINDOW_SECS: u64 = 60;

/// Pause between two profile page requests issued by the same worker.
pub const PROFILE_REQUEST_PAUSE_MS: u64 = 10;

/// HTTP connect timeout (seconds) - time to establish TCP connection
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// HTTP request timeout (seconds) - overall time for the entire request
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Base URL of the REST API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Base URL of the profile pages.
pub const DEFAULT_PROFILE_URL: &str = "https://github.com";

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("github-city/", env!("CARGO_PKG_VERSION"));

/// Retry delays used by a request client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay after a transport failure, a server error or a malformed body
    pub retry_delay: Duration,
    /// Wait used when a rate-limit response has no reset header
    pub rate_limit_fallback: Duration,
}

impl RetryPolicy {
    /// Policy for the search API
    pub fn search() -> Self {
        Self {
            retry_delay: Duration::from_millis(NETWORK_RETRY_DELAY_MS),
            rate_limit_fallback: Duration::from_secs(RATE_LIMIT_FALLBACK_WAIT_SECS),
        }
    }

    /// Policy for profile pages
    pub fn profile() -> Self {
        Self {
            retry_delay: Duration::from_millis(PROFILE_RETRY_DELAY_MS),
            rate_limit_fallback: Duration::from_secs(RATE_LIMIT_FALLBACK_WAIT_SECS),
        }
    }

    /// Use the same short delay for everything (tests)
    pub fn immediate(delay: Duration) -> Self {
        Self {
            retry_delay: delay,
            rate_limit_fallback: delay,
        }
    }
}

/// Request budget: at most `max_requests` within any `window`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestBudget {
    /// Requests allowed per window
    pub max_requests: usize,
    /// Window length
    pub window: Duration,
}

impl RequestBudget {
    /// Budget of the search API
    pub fn search() -> Self {
        Self {
            max_requests: SEARCH_REQUESTS_PER_WINDOW,
            window: Duration::from_secs(SEARCH_WINDOW_SECS),
        }
    }
}

/// Tunables for one collection run
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    /// Number of enrichment workers
    pub workers: usize,
    /// Per-query result cap used by the planner
    pub result_cap: u64,
    /// Search page size used by the enumerator
    pub page_size: u64,
    /// REST API base URL
    pub api_url: String,
    /// Profile pages base URL
    pub profile_url: String,
    /// Retry policy for search requests
    pub search_retry: RetryPolicy,
    /// Retry policy for profile requests
    pub profile_retry: RetryPolicy,
    /// Pacing of search requests; `None` only honours rate-limit pauses
    pub search_budget: Option<RequestBudget>,
    /// Scrape monthly overview pages to split contributions into public/private
    pub contribution_breakdown: bool,
    /// Extra search qualifiers as `(field, value)` pairs
    pub filters: Vec<(String, String)>,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            result_cap: RESULT_CAP,
            page_size: PAGE_SIZE,
            api_url: DEFAULT_API_URL.to_string(),
            profile_url: DEFAULT_PROFILE_URL.to_string(),
            search_retry: RetryPolicy::search(),
            profile_retry: RetryPolicy::profile(),
            search_budget: Some(RequestBudget::search()),
            contribution_breakdown: true,
            filters: Vec::new(),
        }
    }
}

impl CollectorSettings {
    /// Set the number of enrichment workers (clamped to `1..=MAX_WORKERS`)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.clamp(1, MAX_WORKERS);
        self
    }

    /// Point both collaborators at other base URLs
    pub fn with_base_urls(mut self, api_url: impl Into<String>, profile_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self.profile_url = profile_url.into();
        self
    }

    /// Override both retry policies
    pub fn with_retry(mut self, search: RetryPolicy, profile: RetryPolicy) -> Self {
        self.search_retry = search;
        self.profile_retry = profile;
        self
    }

    /// Override the search request budget
    pub fn with_search_budget(mut self, budget: Option<RequestBudget>) -> Self {
        self.search_budget = budget;
        self
    }

    /// Add a search qualifier, e.g. `("followers", ">10")`
    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// Enable or disable the public/private contribution breakdown
    pub fn with_contribution_breakdown(mut self, enabled: bool) -> Self {
        self.contribution_breakdown = enabled;
        self
    }
}

/// Number of pages needed to walk `total_count` results
pub fn pages_for(total_count: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_count.div_ceil(page_size)
}
