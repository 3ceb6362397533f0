//! Rate limiting shared by every caller of one remote source
//!
//! Two mechanisms are combined:
//! - an optional request-based budget (N requests per rolling window)
//! - a shared pause: when any caller sees a rate-limit response, the provider's
//!   reset time is recorded and every subsequent `acquire` blocks until it passes

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::debug;

use crate::collector::config::RequestBudget;

/// Rate limiter with an optional request budget and a shared pause
#[derive(Clone)]
pub struct RateLimiter {
    limiter_type: RateLimiterType,
    semaphore: Option<Arc<Semaphore>>,
    window: Duration,
    paused_until: Arc<Mutex<Option<Instant>>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RateLimiterType {
    Unlimited,
    RequestBased { max_requests: usize },
}

impl RateLimiter {
    /// Create a limiter that only honours pauses
    pub fn unlimited() -> Self {
        Self {
            limiter_type: RateLimiterType::Unlimited,
            semaphore: None,
            window: Duration::ZERO,
            paused_until: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a request-based rate limiter
    ///
    /// # Arguments
    /// * `max_requests` - Maximum requests per window
    /// * `window` - Time window for rate limit
    pub fn request_based(max_requests: usize, window: Duration) -> Self {
        Self {
            limiter_type: RateLimiterType::RequestBased { max_requests },
            semaphore: Some(Arc::new(Semaphore::new(max_requests))),
            window,
            paused_until: Arc::new(Mutex::new(None)),
        }
    }

    /// Check if this limiter enforces a request budget
    pub fn is_request_based(&self) -> bool {
        matches!(self.limiter_type, RateLimiterType::RequestBased { .. })
    }

    /// Maximum requests per window, if budgeted
    pub fn max_requests(&self) -> Option<usize> {
        match self.limiter_type {
            RateLimiterType::RequestBased { max_requests } => Some(max_requests),
            RateLimiterType::Unlimited => None,
        }
    }

    /// Wait for any shared pause to pass, then take one request permit
    ///
    /// The permit is held for the window duration, then released.
    pub async fn acquire(&self) -> Result<(), RateLimitError> {
        while let Some(deadline) = self.current_pause() {
            debug!(
                wait_ms = deadline.saturating_duration_since(Instant::now()).as_millis(),
                "Waiting for rate limit pause"
            );
            sleep_until(deadline).await;
        }

        if let Some(semaphore) = &self.semaphore {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| RateLimitError::AcquireError(e.to_string()))?;

            let window = self.window;
            tokio::spawn(async move {
                sleep(window).await;
                drop(permit);
            });
        }

        Ok(())
    }

    /// Block every caller until `deadline`; an earlier deadline never shortens a pause
    pub fn pause_until(&self, deadline: Instant) {
        let mut paused = self.paused_until.lock().unwrap_or_else(|e| e.into_inner());
        match *paused {
            Some(existing) if existing >= deadline => {}
            _ => *paused = Some(deadline),
        }
    }

    /// Block every caller for `duration` from now
    pub fn pause_for(&self, duration: Duration) {
        self.pause_until(Instant::now() + duration);
    }

    /// Limiter for an optional budget
    pub fn from_budget(budget: Option<RequestBudget>) -> Self {
        match budget {
            Some(budget) => Self::request_based(budget.max_requests, budget.window),
            None => Self::unlimited(),
        }
    }

    /// Whether a pause is currently in effect
    pub fn is_paused(&self) -> bool {
        self.current_pause().is_some()
    }

    fn current_pause(&self) -> Option<Instant> {
        let mut paused = self.paused_until.lock().unwrap_or_else(|e| e.into_inner());
        match *paused {
            Some(deadline) if deadline > Instant::now() => Some(deadline),
            Some(_) => {
                *paused = None;
                None
            }
            None => None,
        }
    }
}

/// Time to wait until a provider reset timestamp: `max(0, reset - now)`
pub fn reset_wait(reset_epoch_secs: i64, now_epoch_secs: i64) -> Duration {
    let secs = reset_epoch_secs.saturating_sub(now_epoch_secs).max(0);
    Duration::from_secs(secs as u64)
}

/// Rate limiter errors
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// Failed to acquire permits
    #[error("failed to acquire rate limit permits: {0}")]
    AcquireError(String),
}
