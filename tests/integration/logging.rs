//! Integration tests for logging and tracing

use tracing::{debug, info, info_span, warn};
use tracing_subscriber::EnvFilter;

#[test]
fn test_tracing_subscriber_initialization() {
    // Another test may have installed a subscriber already
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("github_city=debug")),
        )
        .with_test_writer()
        .try_init();

    info!("subscriber ready");
}

#[test]
fn test_tracing_json_format() {
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new("github_city=info"))
        .with_test_writer()
        .try_init();

    warn!(endpoint = "search", wait_secs = 30u64, "Rate limited");
}

#[test]
fn test_env_filter_directives_parse() {
    for directive in [
        "info",
        "github_city=debug",
        "warn,github_city=trace",
        "github_city::fetcher=debug,github_city=info",
    ] {
        assert!(EnvFilter::try_new(directive).is_ok(), "{directive}");
    }
}

#[test]
fn test_run_and_interval_spans() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("github_city=debug"))
        .with_test_writer()
        .try_init();

    let run = info_span!("collect", city = "Granada");
    let _run = run.enter();
    let interval = info_span!("interval", range = "2008-01-01..2008-02-01");
    let _interval = interval.enter();

    debug!(login = "nitehack", "Profile enriched");
    info!(pages = 1u32, pushed = 16u64, "Interval enumerated");
}
