//! Integration tests for the profile scraper against a mock profile site

use chrono::Utc;
use github_city::collector::rate_limit::RateLimiter;
use github_city::collector::RetryPolicy;
use github_city::fetcher::github_http::GithubHttpClient;
use github_city::fetcher::profile::{overview_windows, ProfileScraper};
use github_city::fetcher::shared_resources::build_http_client;
use github_city::fetcher::{FetcherError, ProfileSource};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::unit::profile_parser::PROFILE_PAGE;

fn scraper(server: &MockServer, breakdown: bool) -> ProfileScraper {
    let http = GithubHttpClient::new(
        build_http_client().unwrap(),
        Arc::new(RateLimiter::unlimited()),
        RetryPolicy::immediate(Duration::from_millis(10)),
        "profile",
    );
    ProfileScraper::new(http, &server.uri(), breakdown, Duration::ZERO)
}

#[tokio::test]
async fn test_profile_without_breakdown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nitehack"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PROFILE_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let user = scraper(&server, false).fetch_profile("nitehack").await.unwrap();

    assert_eq!(user.contributions, 1024);
    assert_eq!(user.public_contributions, 1024);
    assert_eq!(user.private_contributions, 0);
    assert_eq!(user.followers, 3456);
}

#[tokio::test]
async fn test_profile_with_breakdown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/nitehack"))
        .and(query_param("tab", "overview"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<span class="f4 lh-condensed m-0 text-gray">3 contributions in private repositories</span>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/nitehack"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PROFILE_PAGE))
        .mount(&server)
        .await;

    let user = scraper(&server, true).fetch_profile("nitehack").await.unwrap();
    let windows = overview_windows(Utc::now().date_naive()).len() as u64;

    assert_eq!(user.private_contributions, 3 * windows);
    assert_eq!(user.public_contributions, 1024 - 3 * windows);
    assert_eq!(user.contributions, 1024);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len() as u64, 1 + windows);
}

#[tokio::test]
async fn test_vanished_profile_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ghost123"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let result = scraper(&server, true).fetch_profile("ghost123").await;

    assert!(matches!(result, Err(FetcherError::NotFound(_))));
}
