//! Partitioning of the account-creation date domain
//!
//! A search query reports at most [`RESULT_CAP`](crate::collector::config::RESULT_CAP)
//! results, so the domain is bisected until every sub-range reports a total
//! strictly below the cap. The left half of a split ends at the floor midpoint
//! and the right half starts the next day, so no day is skipped or counted twice.

use chrono::{Days, NaiveDate};
use tracing::{debug, info};

use crate::fetcher::{FetcherError, SearchSource};
use crate::shutdown::{is_requested, SharedShutdown};
use crate::Interval;

/// Planner errors
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// A single day still reports at least the cap; it cannot be split and
    /// enumerating it would silently lose accounts
    #[error("{day} alone reports {total_count} users, at or above the search cap")]
    DomainExhausted {
        /// The day that cannot be split further
        day: NaiveDate,
        /// Total reported for that day
        total_count: u64,
    },

    /// Domain start is after its end
    #[error("invalid domain: {start} is after {end}")]
    InvalidDomain {
        /// Domain start
        start: NaiveDate,
        /// Domain end
        end: NaiveDate,
    },

    /// Search failed (shutdown)
    #[error(transparent)]
    Fetch(#[from] FetcherError),
}

/// Bisects a date domain against a search collaborator
pub struct IntervalPlanner<'a> {
    source: &'a dyn SearchSource,
    result_cap: u64,
    shutdown: Option<&'a SharedShutdown>,
}

impl<'a> IntervalPlanner<'a> {
    /// Create a planner
    pub fn new(source: &'a dyn SearchSource, result_cap: u64) -> Self {
        Self {
            source,
            result_cap,
            shutdown: None,
        }
    }

    /// Stop between count queries once shutdown is requested
    pub fn with_shutdown(mut self, shutdown: Option<&'a SharedShutdown>) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Partition `[start, end]` into chronologically ordered intervals each
    /// reporting fewer results than the cap
    ///
    /// # Errors
    /// [`PlannerError::DomainExhausted`] when a single day reaches the cap.
    pub async fn plan(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Interval>, PlannerError> {
        let domain = Interval::new(start, end).map_err(|_| PlannerError::InvalidDomain { start, end })?;

        // Right halves are pushed first so the left one is counted next.
        let mut pending = vec![domain];
        let mut intervals = Vec::new();

        while let Some(interval) = pending.pop() {
            if is_requested(self.shutdown) {
                return Err(FetcherError::Cancelled.into());
            }

            let total_count = self.source.total_count(Some(interval)).await?;

            if total_count < self.result_cap {
                info!(
                    interval = %interval,
                    total_count = total_count,
                    "New valid interval"
                );
                intervals.push(interval);
                continue;
            }

            match interval.split() {
                Some((left, right)) => {
                    debug!(
                        interval = %interval,
                        total_count = total_count,
                        "Interval over cap, splitting"
                    );
                    pending.push(right);
                    pending.push(left);
                }
                None => {
                    return Err(PlannerError::DomainExhausted {
                        day: interval.start(),
                        total_count,
                    })
                }
            }
        }

        info!(intervals = intervals.len(), "Total number of intervals");
        Ok(intervals)
    }
}

/// Whether `intervals` reconstruct `[start, end]` exactly, in order, without gaps or overlaps
pub fn covers_domain(intervals: &[Interval], start: NaiveDate, end: NaiveDate) -> bool {
    let (Some(first), Some(last)) = (intervals.first(), intervals.last()) else {
        return false;
    };
    if first.start() != start || last.end() != end {
        return false;
    }
    intervals
        .windows(2)
        .all(|pair| pair[0].end().checked_add_days(Days::new(1)) == Some(pair[1].start()))
}
