//! Integration tests for the Prometheus exporter

use github_city::metrics::{self, record_rate_limit_wait, record_user_outcome, HttpRequestMetrics};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::sleep;

async fn fetch_metrics_text(addr: &str) -> Result<String, Box<dyn std::error::Error>> {
    let url = format!("http://{addr}/metrics");
    let resp = reqwest::get(&url).await?;
    Ok(resp.text().await?)
}

// The exporter installs a process-wide recorder, so one test covers it end to end.
#[tokio::test]
async fn test_exporter_serves_collection_metrics() {
    let addr: SocketAddr = "127.0.0.1:19190".parse().unwrap();

    assert!(metrics::init_metrics(addr).await.is_ok());
    // Idempotent
    assert!(metrics::init_metrics(addr).await.is_ok());
    assert!(metrics::is_initialized().await);

    sleep(Duration::from_millis(100)).await;

    let request = HttpRequestMetrics::start("search", 1);
    request.record_complete(200);
    record_rate_limit_wait("search", Duration::from_secs(30));
    record_user_outcome("stored");
    record_user_outcome("not_found");

    let text = fetch_metrics_text("127.0.0.1:19190").await.unwrap();

    assert!(text.contains("# TYPE"));
    assert!(text.contains("http_requests_total"));
    assert!(text.contains("http_rate_limited_total"));
    assert!(text.contains("users_processed_total"));
    assert!(text.contains("outcome=\"not_found\""));
}
