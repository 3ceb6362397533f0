//! Pagination of one search interval
//!
//! Walks pages 1..N of an interval and hands every login on every page to the
//! caller, duplicates included. Termination is driven by the API's reported
//! total, recomputed from each response since it can drift between requests.
//!
//! Includes safety mechanisms:
//! - A page limit derived from the per-query result cap
//! - Empty page detection
//! - No-progress detection (a page that repeats only logins already seen)

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::collector::config::pages_for;
use crate::fetcher::{FetcherError, FetcherResult, SearchSource};
use crate::shutdown::{is_requested, SharedShutdown};
use crate::Interval;

/// Why pagination of an interval stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Fetched as many pages as the latest total requires
    Completed,
    /// A page came back with no items
    EmptyPage,
    /// A page contained only logins already seen in this interval
    NoProgress,
    /// The cap-derived page limit was reached
    PageLimit,
}

/// Summary of one interval's enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumerationStats {
    /// Pages requested
    pub pages: u32,
    /// Logins handed to the sink, duplicates included
    pub pushed: u64,
    /// Distinct logins seen in this interval
    pub distinct: u64,
    /// Total reported by the last page
    pub total_count: u64,
    /// Why pagination stopped
    pub stop_reason: StopReason,
}

/// Paginates intervals of one search query
pub struct Enumerator<'a> {
    source: &'a dyn SearchSource,
    page_size: u64,
    result_cap: u64,
    shutdown: Option<&'a SharedShutdown>,
}

impl<'a> Enumerator<'a> {
    /// Create an enumerator
    ///
    /// # Arguments
    /// * `source` - Search collaborator
    /// * `page_size` - Results per page requested from `source`
    /// * `result_cap` - Per-query cap; bounds the number of pages per interval
    pub fn new(source: &'a dyn SearchSource, page_size: u64, result_cap: u64) -> Self {
        Self {
            source,
            page_size,
            result_cap,
            shutdown: None,
        }
    }

    /// Stop between pages once shutdown is requested
    pub fn with_shutdown(mut self, shutdown: Option<&'a SharedShutdown>) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Walk every page of `interval`, calling `push` for each login
    ///
    /// # Errors
    /// Only [`FetcherError::Cancelled`] in practice; the request layer absorbs
    /// everything else.
    pub async fn enumerate<F>(&self, interval: Interval, mut push: F) -> FetcherResult<EnumerationStats>
    where
        F: FnMut(&str),
    {
        let max_pages = pages_for(self.result_cap, self.page_size).max(1);
        let mut seen_here: HashSet<String> = HashSet::new();
        let mut stats = EnumerationStats {
            pages: 0,
            pushed: 0,
            distinct: 0,
            total_count: 0,
            stop_reason: StopReason::Completed,
        };
        let mut page: u32 = 1;

        loop {
            if is_requested(self.shutdown) {
                return Err(FetcherError::Cancelled);
            }

            if u64::from(page) > max_pages {
                warn!(
                    interval = %interval,
                    total_count = stats.total_count,
                    max_pages = max_pages,
                    "Page limit reached before the reported total was walked"
                );
                stats.stop_reason = StopReason::PageLimit;
                break;
            }

            let result = self.source.search_page(Some(interval), page).await?;
            stats.pages = page;
            stats.total_count = result.total_count;

            if result.incomplete_results {
                warn!(interval = %interval, page = page, "Search reported incomplete results");
            }

            if result.items.is_empty() {
                debug!(interval = %interval, page = page, "Empty page, interval done");
                stats.stop_reason = StopReason::EmptyPage;
                break;
            }

            let mut new_logins = 0;
            for login in result.logins() {
                push(login);
                stats.pushed += 1;
                if seen_here.insert(login.to_string()) {
                    new_logins += 1;
                }
            }
            stats.distinct = seen_here.len() as u64;

            debug!(
                interval = %interval,
                page = page,
                items = result.items.len(),
                new_logins = new_logins,
                total_count = result.total_count,
                "Page processed"
            );

            if new_logins == 0 {
                warn!(interval = %interval, page = page, "Page repeated known logins only, stopping");
                stats.stop_reason = StopReason::NoProgress;
                break;
            }

            if u64::from(page) >= pages_for(result.total_count, self.page_size) {
                stats.stop_reason = StopReason::Completed;
                break;
            }

            page += 1;
        }

        debug!(
            interval = %interval,
            pages = stats.pages,
            pushed = stats.pushed,
            "Interval enumerated"
        );

        Ok(stats)
    }
}
