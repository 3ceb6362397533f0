//! Progress tracking for long-running collections.
//!
//! The unrestricted search query gives an estimate of how many logins a run will see; workers
//! update a shared [`ProgressState`] and emit a `[PROGRESS]` line whenever the
//! completion percentage moves by a step or enough time has passed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(60);
const MIN_RUN_DURATION: Duration = Duration::from_secs(30);
const DEFAULT_PERCENTAGE_STEP: f64 = 10.0;

/// Progress tracking state for one collection run.
#[derive(Debug, Clone)]
pub struct ProgressState {
    /// Number of logins taken from the queue so far.
    pub processed: u64,
    /// Logins the unrestricted search reported (if known).
    pub total_expected: Option<u64>,
    /// Timestamp when the run started.
    pub start_time: Instant,
    /// Last time progress was reported.
    pub last_update: Instant,
    /// Minimum interval between time-based updates.
    pub update_interval: Duration,
    /// Current processing rate (logins per second).
    pub current_rate: f64,
    /// Interval currently being enumerated (e.g., "interval 3/12").
    pub current_phase: Option<String>,
    /// Last reported completion percentage (0-100).
    pub last_reported_percentage: f64,
    /// Minimum percentage delta required to emit a new update.
    pub min_percentage_step: f64,
}

impl ProgressState {
    /// Create a new progress state with default cadence.
    pub fn new(total_expected: Option<u64>) -> Self {
        let now = Instant::now();
        Self {
            processed: 0,
            total_expected,
            start_time: now,
            last_update: now,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            current_rate: 0.0,
            current_phase: None,
            last_reported_percentage: 0.0,
            min_percentage_step: DEFAULT_PERCENTAGE_STEP,
        }
    }

    /// Override the emission cadence.
    pub fn with_cadence(mut self, update_interval: Duration, min_percentage_step: f64) -> Self {
        self.update_interval = update_interval;
        self.min_percentage_step = min_percentage_step;
        self
    }

    /// Count newly processed logins.
    pub fn update(&mut self, new_items: u64) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        self.processed = self.processed.saturating_add(new_items);
        if elapsed > 0.0 {
            self.current_rate = self.processed as f64 / elapsed;
        }
    }

    /// Whether a progress update should be emitted based on time or percentage.
    pub fn should_emit_update(&self) -> bool {
        if self.processed == 0 {
            return false;
        }

        let percentage_jump = self
            .percentage()
            .map(|pct| pct - self.last_reported_percentage >= self.min_percentage_step)
            .unwrap_or(false);

        if percentage_jump {
            return true;
        }

        self.start_time.elapsed() >= MIN_RUN_DURATION
            && self.last_update.elapsed() >= self.update_interval
    }

    /// Call after emitting a progress log to reset timers and cached percentage.
    pub fn mark_emitted(&mut self) {
        self.last_update = Instant::now();
        if let Some(pct) = self.percentage() {
            self.last_reported_percentage = pct;
        }
    }

    /// Set descriptive phase label.
    pub fn set_phase<S: Into<String>>(&mut self, phase: Option<S>) {
        self.current_phase = phase.map(|s| s.into());
    }

    /// Completion percentage (0-100), capped since the reported total is only an estimate.
    pub fn percentage(&self) -> Option<f64> {
        let total = self.total_expected?;
        if total == 0 {
            return Some(100.0);
        }
        Some(((self.processed as f64 / total as f64) * 100.0).min(100.0))
    }

    /// Estimate remaining time based on counts.
    pub fn estimate_remaining(&self) -> Option<Duration> {
        if self.current_rate <= 0.0 {
            return None;
        }
        let remaining = self.total_expected?.saturating_sub(self.processed);
        if remaining == 0 {
            return None;
        }
        Some(Duration::from_secs_f64(remaining as f64 / self.current_rate))
    }

    /// Human-readable progress string for logging.
    pub fn format_progress(&self) -> String {
        let mut parts = vec![format!("[PROGRESS] Processed {} users", self.processed)];

        if let Some(pct) = self.percentage() {
            parts.push(format!("- {pct:.1}% complete"));
        }

        if let Some(phase) = &self.current_phase {
            parts.push(format!("({phase})"));
        }

        if self.current_rate > 0.0 {
            parts.push(format!("at {:.1} users/sec", self.current_rate));
        }

        if let Some(remaining) = self.estimate_remaining() {
            parts.push(format!("- ~{} remaining", format_duration(remaining)));
        }

        parts.join(" ")
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{:.1}h", secs as f64 / 3600.0)
    }
}

/// Counters that can be read while a run is in flight
#[derive(Debug, Default)]
pub struct LiveCounters {
    discovered: AtomicU64,
    processed: AtomicU64,
    stored: AtomicU64,
}

impl LiveCounters {
    /// Zero every counter
    pub fn reset(&self) {
        self.discovered.store(0, Ordering::Relaxed);
        self.processed.store(0, Ordering::Relaxed);
        self.stored.store(0, Ordering::Relaxed);
    }

    /// A login was pushed onto the queue
    pub fn record_discovered(&self) {
        self.discovered.fetch_add(1, Ordering::Relaxed);
    }

    /// A worker finished with a login
    pub fn record_processed(&self, stored: bool) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        if stored {
            self.stored.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Logins pushed so far, duplicates included
    pub fn discovered(&self) -> u64 {
        self.discovered.load(Ordering::Relaxed)
    }

    /// Logins processed so far
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Records stored so far
    pub fn stored(&self) -> u64 {
        self.stored.load(Ordering::Relaxed)
    }
}
