//! Run context shared by the coordinator and every enrichment worker
//!
//! Owns the work queue, the set of seen logins, the exclusions and the result
//! store for one run. Two locks are involved and never held together:
//! admission (seen set) and storage (inside [`ResultStore`]).

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::collector::progress::{LiveCounters, ProgressState};
use crate::collector::queue::WorkQueue;
use crate::fetcher::{FetcherError, ProfileSource};
use crate::metrics::record_user_outcome;
use crate::store::ResultStore;

/// Logins and location substrings kept out of the results
///
/// Empty location substrings are ignored, since they would match every location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    users: HashSet<String>,
    location_substrings: Vec<String>,
}

impl ExclusionSet {
    /// Build an exclusion set
    pub fn new<U, L>(users: U, location_substrings: L) -> Self
    where
        U: IntoIterator<Item = String>,
        L: IntoIterator<Item = String>,
    {
        Self {
            users: users.into_iter().collect(),
            location_substrings: location_substrings
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Whether a login is excluded
    pub fn is_user_excluded(&self, login: &str) -> bool {
        self.users.contains(login)
    }

    /// Whether a location contains any excluded substring (case-sensitive)
    pub fn is_location_excluded(&self, location: &str) -> bool {
        self.location_substrings
            .iter()
            .any(|excluded| location.contains(excluded.as_str()))
    }
}

/// What happened to one login taken from the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Enriched and stored
    Stored,
    /// Already admitted earlier in the run
    AlreadySeen,
    /// Login is on the exclusion list
    ExcludedUser,
    /// Enriched, but its location is excluded
    ExcludedLocation,
    /// The account no longer exists
    NotFound,
    /// Enriched record is inconsistent
    Invalid,
    /// Enrichment failed for another reason
    Failed,
    /// Shutdown interrupted the enrichment
    Cancelled,
}

impl ProcessOutcome {
    /// Short label used for metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::AlreadySeen => "already_seen",
            Self::ExcludedUser => "excluded_user",
            Self::ExcludedLocation => "excluded_location",
            Self::NotFound => "not_found",
            Self::Invalid => "invalid",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Per-worker counters returned when a worker exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Logins taken from the queue
    pub processed: u64,
    /// Records added to the store
    pub stored: u64,
}

enum Admission {
    Admitted,
    AlreadySeen,
    Excluded,
}

/// State of one collection run
pub struct RunContext {
    queue: WorkQueue,
    seen: Mutex<HashSet<String>>,
    exclusions: ExclusionSet,
    store: Arc<ResultStore>,
    profiles: Arc<dyn ProfileSource>,
    progress: Mutex<ProgressState>,
    counters: Arc<LiveCounters>,
}

impl RunContext {
    /// Create a context with an open queue and an empty seen set
    pub fn new(exclusions: ExclusionSet, store: Arc<ResultStore>, profiles: Arc<dyn ProfileSource>) -> Self {
        Self {
            queue: WorkQueue::new(),
            seen: Mutex::new(HashSet::new()),
            exclusions,
            store,
            profiles,
            progress: Mutex::new(ProgressState::new(None)),
            counters: Arc::new(LiveCounters::default()),
        }
    }

    /// Replace the progress state (e.g. once the reported total is known)
    pub fn with_progress(self, progress: ProgressState) -> Self {
        Self {
            progress: Mutex::new(progress),
            ..self
        }
    }

    /// Report into shared counters
    pub fn with_counters(self, counters: Arc<LiveCounters>) -> Self {
        Self { counters, ..self }
    }

    /// Live counters of this run
    pub fn counters(&self) -> &Arc<LiveCounters> {
        &self.counters
    }

    /// The work queue
    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    /// The result store
    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    /// Exclusions applied by this run
    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// Whether a login was admitted
    pub fn has_seen(&self, login: &str) -> bool {
        self.lock_seen().contains(login)
    }

    /// Number of admitted logins
    pub fn seen_count(&self) -> usize {
        self.lock_seen().len()
    }

    /// Label the current phase in progress lines
    pub fn set_phase(&self, phase: impl Into<String>) {
        self.lock_progress().set_phase(Some(phase));
    }

    fn lock_seen(&self) -> MutexGuard<'_, HashSet<String>> {
        self.seen.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_progress(&self) -> MutexGuard<'_, ProgressState> {
        self.progress.lock().unwrap_or_else(|e| e.into_inner())
    }

    // Check and insert under one lock acquisition.
    fn admit(&self, login: &str) -> Admission {
        let mut seen = self.lock_seen();
        if seen.contains(login) {
            return Admission::AlreadySeen;
        }
        if self.exclusions.is_user_excluded(login) {
            return Admission::Excluded;
        }
        seen.insert(login.to_string());
        Admission::Admitted
    }

    /// Admit, enrich and store one login
    pub async fn process_login(&self, login: &str) -> ProcessOutcome {
        let outcome = match self.admit(login) {
            Admission::AlreadySeen => {
                debug!(login = %login, "Skipping already seen user");
                ProcessOutcome::AlreadySeen
            }
            Admission::Excluded => {
                debug!(login = %login, "Skipping excluded user");
                ProcessOutcome::ExcludedUser
            }
            Admission::Admitted => self.enrich(login).await,
        };

        record_user_outcome(outcome.label());
        self.counters.record_processed(outcome == ProcessOutcome::Stored);
        self.record_processed();
        outcome
    }

    async fn enrich(&self, login: &str) -> ProcessOutcome {
        match self.profiles.fetch_profile(login).await {
            Ok(record) => {
                if self.exclusions.is_location_excluded(&record.location) {
                    debug!(login = %login, location = %record.location, "Dropping user in excluded location");
                    return ProcessOutcome::ExcludedLocation;
                }
                if let Err(reason) = record.validate() {
                    warn!(login = %login, reason = %reason, "Dropping inconsistent profile");
                    return ProcessOutcome::Invalid;
                }
                self.store.push(record);
                ProcessOutcome::Stored
            }
            Err(FetcherError::NotFound(_)) => {
                debug!(login = %login, "User vanished, dropping");
                ProcessOutcome::NotFound
            }
            Err(FetcherError::Cancelled) => ProcessOutcome::Cancelled,
            Err(e) => {
                warn!(login = %login, error = %e, "Failed to enrich user");
                ProcessOutcome::Failed
            }
        }
    }

    fn record_processed(&self) {
        let mut progress = self.lock_progress();
        progress.update(1);
        if progress.should_emit_update() {
            info!("{}", progress.format_progress());
            progress.mark_emitted();
        }
    }

    /// Drain the queue until it is closed and empty, or shutdown interrupts enrichment
    pub async fn run_worker(self: Arc<Self>, worker_id: usize) -> WorkerStats {
        let mut stats = WorkerStats::default();
        debug!(worker_id = worker_id, "Worker started");

        while let Some(login) = self.queue.next().await {
            let outcome = self.process_login(&login).await;
            stats.processed += 1;
            match outcome {
                ProcessOutcome::Stored => stats.stored += 1,
                ProcessOutcome::Cancelled => {
                    debug!(worker_id = worker_id, "Worker stopping on shutdown");
                    break;
                }
                _ => {}
            }
        }

        debug!(
            worker_id = worker_id,
            processed = stats.processed,
            stored = stats.stored,
            "Worker finished"
        );
        stats
    }
}
