//! Run observability metrics
//!
//! Counts requests, rate-limit waits, retries and per-login outcomes so a long
//! collection run can be watched from a Prometheus scrape endpoint.
//!
//! ## Architecture
//!
//! - Uses `metrics` crate for low-overhead metric collection
//! - Prometheus exporter for scraping endpoint (enabled with `--metrics-addr`)
//! - Without an installed exporter every call is a cheap no-op

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

static METRICS_INITIALIZED: Lazy<RwLock<bool>> = Lazy::new(|| RwLock::new(false));

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(0);

enum Kind {
    Counter,
    Histogram,
}

const DESCRIPTIONS: &[(&str, Kind, Unit, &str)] = &[
    ("http_requests_total", Kind::Counter, Unit::Count, "HTTP requests made to GitHub, by endpoint and status"),
    ("http_rate_limited_total", Kind::Counter, Unit::Count, "Rate-limit responses received"),
    ("http_retries_total", Kind::Counter, Unit::Count, "Retries after a transient failure"),
    ("http_request_duration_seconds", Kind::Histogram, Unit::Seconds, "HTTP request duration"),
    ("rate_limit_wait_seconds", Kind::Histogram, Unit::Seconds, "Pause imposed by a rate-limit response"),
    ("users_processed_total", Kind::Counter, Unit::Count, "Logins taken from the work queue, by outcome"),
    ("collections_completed_total", Kind::Counter, Unit::Count, "Completed collection runs"),
    ("collections_failed_total", Kind::Counter, Unit::Count, "Failed collection runs"),
];

/// Initialize metrics system with Prometheus exporter
///
/// Idempotent: later calls are ignored.
///
/// # Arguments
/// * `addr` - Socket address to bind Prometheus scrape endpoint (e.g., "0.0.0.0:9090")
pub async fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    for (name, kind, unit, description) in DESCRIPTIONS {
        match kind {
            Kind::Counter => describe_counter!(*name, *unit, *description),
            Kind::Histogram => describe_histogram!(*name, *unit, *description),
        }
    }

    *initialized = true;
    info!(%addr, "Prometheus exporter listening");
    Ok(())
}

/// Timing and outcome of one HTTP attempt
pub struct HttpRequestMetrics {
    endpoint: &'static str,
    started: Instant,
    request_id: u64,
    attempt: u64,
}

impl HttpRequestMetrics {
    /// Start timing an attempt against `endpoint`
    pub fn start(endpoint: &'static str, attempt: u64) -> Self {
        let request_id = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(request_id, endpoint, attempt, "Sending request");

        Self {
            endpoint,
            started: Instant::now(),
            request_id,
            attempt,
        }
    }

    /// Record an attempt that produced a response
    pub fn record_complete(&self, status_code: u16) {
        self.finish(status_code.to_string());
    }

    /// Record an attempt that failed before any response
    pub fn record_network_error(&self) {
        self.finish("network_error".to_string());
    }

    /// Sequence number shared by the log lines of this attempt
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    fn finish(&self, status: String) {
        let elapsed = self.started.elapsed();
        debug!(
            request_id = self.request_id,
            endpoint = self.endpoint,
            attempt = self.attempt,
            status = %status,
            duration_ms = elapsed.as_millis(),
            "Request finished"
        );

        counter!("http_requests_total", "endpoint" => self.endpoint, "status" => status).increment(1);
        histogram!("http_request_duration_seconds", "endpoint" => self.endpoint)
            .record(elapsed.as_secs_f64());
    }
}

/// Record a retry after a transient failure
pub fn record_retry_backoff(endpoint: &'static str, duration: Duration) {
    counter!("http_retries_total", "endpoint" => endpoint).increment(1);

    debug!(
        endpoint = endpoint,
        backoff_ms = duration.as_millis(),
        "Retry backoff recorded"
    );
}

/// Record a rate-limit response and the pause it imposed
pub fn record_rate_limit_wait(endpoint: &'static str, wait: Duration) {
    counter!("http_rate_limited_total", "endpoint" => endpoint).increment(1);
    histogram!("rate_limit_wait_seconds", "endpoint" => endpoint).record(wait.as_secs_f64());
}

/// Record what happened to one login taken from the work queue
pub fn record_user_outcome(outcome: &'static str) {
    counter!("users_processed_total", "outcome" => outcome).increment(1);
}

/// Collection run metrics
pub struct CollectionMetrics {
    city: String,
    start_time: Instant,
}

impl CollectionMetrics {
    /// Start tracking a collection run
    pub fn start(city: impl Into<String>) -> Self {
        let city = city.into();
        info!(city = %city, "Collection started");

        Self {
            city,
            start_time: Instant::now(),
        }
    }

    /// Record successful completion
    pub fn record_success(&self, users: usize) {
        let duration = self.start_time.elapsed();

        counter!("collections_completed_total", "city" => self.city.clone()).increment(1);

        info!(
            city = %self.city,
            users = users,
            duration_secs = duration.as_secs(),
            "Collection completed successfully"
        );
    }

    /// Record a failed run
    pub fn record_failure(&self, error: &str) {
        let duration = self.start_time.elapsed();

        counter!("collections_failed_total", "city" => self.city.clone()).increment(1);

        error!(
            city = %self.city,
            error = %error,
            duration_secs = duration.as_secs(),
            "Collection failed"
        );
    }

    /// Record a run stopped by shutdown
    pub fn record_interrupted(&self, users: usize) {
        warn!(
            city = %self.city,
            users = users,
            duration_secs = self.start_time.elapsed().as_secs(),
            "Collection interrupted"
        );
    }
}

/// Check if metrics system is initialized
pub async fn is_initialized() -> bool {
    *METRICS_INITIALIZED.read().await
}
