//! Graceful shutdown coordination utilities.
//!
//! Provides a lightweight [`ShutdownCoordinator`] that is handed to the request
//! layer, the planner and the collector so a Ctrl+C stops retries and
//! enumeration while still letting every worker finish and be joined.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Shared handle to a shutdown coordinator.
pub type SharedShutdown = Arc<ShutdownCoordinator>;

/// Coordinates graceful shutdown across async tasks.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    is_shutdown: AtomicBool,
    notify: Notify,
}

impl ShutdownCoordinator {
    /// Create a new coordinator.
    pub fn new() -> Self {
        Self {
            is_shutdown: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Create a new shared coordinator wrapped in [`Arc`].
    pub fn shared() -> SharedShutdown {
        Arc::new(Self::new())
    }

    /// Request shutdown. Notifies all registered waiters exactly once.
    pub fn request_shutdown(&self) {
        if !self.is_shutdown.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.is_shutdown.load(Ordering::SeqCst)
    }

    /// Wait until shutdown is requested. Returns immediately if already set.
    pub async fn wait_for_shutdown(&self) {
        let notified = self.notify.notified();
        if self.is_shutdown_requested() {
            return;
        }
        notified.await;
    }
}

/// Sleep for `duration` unless shutdown is requested first.
///
/// Returns `false` when the sleep was interrupted by shutdown.
pub async fn sleep_or_shutdown(duration: Duration, shutdown: Option<&SharedShutdown>) -> bool {
    match shutdown {
        Some(shutdown) => {
            if shutdown.is_shutdown_requested() {
                return false;
            }
            tokio::select! {
                _ = tokio::time::sleep(duration) => true,
                _ = shutdown.wait_for_shutdown() => false,
            }
        }
        None => {
            tokio::time::sleep(duration).await;
            true
        }
    }
}

/// Whether an optional shutdown handle has been triggered.
pub fn is_requested(shutdown: Option<&SharedShutdown>) -> bool {
    shutdown
        .map(|s| s.is_shutdown_requested())
        .unwrap_or(false)
}
