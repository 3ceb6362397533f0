//! Collection orchestration
//!
//! # Overview
//!
//! A run proceeds in three steps:
//!
//! 1. **Planning**: the date domain is bisected into capped intervals
//!    ([`crate::planner`]), or saved intervals are reused
//! 2. **Enumeration**: one coordinator walks every interval in order and pushes
//!    each login onto the [`queue::WorkQueue`]
//! 3. **Enrichment**: a fixed pool of workers drains the queue concurrently,
//!    admitting each login once ([`context::RunContext`]) and storing the
//!    enriched record
//!
//! The run returns once enumeration is done, the queue is closed and drained,
//! and every worker has been joined.
//!
//! # Components
//!
//! - [`executor`] - [`CityCollector`], the run entry point
//! - [`context`] - Shared run state, admission and exclusion logic
//! - [`queue`] - Work queue between coordinator and workers
//! - [`rate_limit`] - Shared rate limiter with provider-driven pauses
//! - [`progress`] - Progress reporting
//! - [`config`] - Constants and run settings
//!
//! # Error Handling
//!
//! Transient failures never surface: the request layer retries them. What does
//! surface is fatal: an invalid configuration at construction, a day that
//! cannot be split under the cap, or a shutdown request.

pub mod config;
pub mod context;
pub mod executor;
pub mod progress;
pub mod queue;
pub mod rate_limit;

pub use config::{CollectorSettings, RequestBudget, RetryPolicy};
pub use context::{ExclusionSet, ProcessOutcome, RunContext};
pub use executor::{CityCollector, RunSummary};
pub use progress::LiveCounters;
pub use rate_limit::{RateLimitError, RateLimiter};

use crate::credentials::CredentialsError;
use crate::fetcher::FetcherError;
use crate::planner::PlannerError;
use crate::state::StateError;

/// Collection errors
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    /// Configuration cannot seed a run
    #[error("configuration error: {0}")]
    Config(#[from] StateError),

    /// Credentials are missing or blank
    #[error("credentials error: {0}")]
    Credentials(#[from] CredentialsError),

    /// Planning failed
    #[error("planning error: {0}")]
    Planner(PlannerError),

    /// A remote collaborator failed
    #[error("fetcher error: {0}")]
    Fetcher(FetcherError),

    /// Shutdown was requested before the run finished
    #[error("collection cancelled by shutdown")]
    Cancelled,

    /// A worker task panicked
    #[error("worker failed: {0}")]
    WorkerFailed(String),
}

impl From<FetcherError> for CollectorError {
    fn from(err: FetcherError) -> Self {
        match err {
            FetcherError::Cancelled => CollectorError::Cancelled,
            other => CollectorError::Fetcher(other),
        }
    }
}

impl From<PlannerError> for CollectorError {
    fn from(err: PlannerError) -> Self {
        match err {
            PlannerError::Fetch(FetcherError::Cancelled) => CollectorError::Cancelled,
            other => CollectorError::Planner(other),
        }
    }
}

impl CollectorError {
    /// Whether the error came from a shutdown request
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CollectorError::Cancelled)
    }
}
