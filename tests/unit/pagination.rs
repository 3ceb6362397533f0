//! Unit tests for interval pagination

use github_city::fetcher::pagination::{Enumerator, StopReason};
use github_city::fetcher::FetcherError;
use github_city::shutdown::ShutdownCoordinator;

use crate::support::{interval, search_page, MockSearch, ScriptedSearch};

#[tokio::test]
async fn test_single_page_interval() {
    let search = MockSearch::new(MockSearch::accounts_on("granadino", "2008-01-10", 16));
    let enumerator = Enumerator::new(&search, 100, 1000);

    let mut pushed = Vec::new();
    let stats = enumerator
        .enumerate(interval("2008-01-01", "2008-02-01"), |login| pushed.push(login.to_string()))
        .await
        .unwrap();

    assert_eq!(pushed.len(), 16);
    assert_eq!(stats.pages, 1);
    assert_eq!(stats.pushed, 16);
    assert_eq!(stats.total_count, 16);
    assert_eq!(stats.stop_reason, StopReason::Completed);
    assert_eq!(search.page_requests(), 1);
}

#[tokio::test]
async fn test_walks_every_page_of_total() {
    let search = MockSearch::new(MockSearch::accounts_on("user", "2011-03-03", 250));
    let enumerator = Enumerator::new(&search, 100, 1000);

    let mut pushed = Vec::new();
    let stats = enumerator
        .enumerate(interval("2011-01-01", "2011-12-31"), |login| pushed.push(login.to_string()))
        .await
        .unwrap();

    assert_eq!(stats.pages, 3);
    assert_eq!(pushed.len(), 250);
    assert_eq!(stats.distinct, 250);
    let pages: Vec<u32> = search.calls().into_iter().map(|(_, page)| page).collect();
    assert_eq!(pages, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_empty_interval_stops_after_first_page() {
    let search = MockSearch::new(Vec::new());
    let stats = Enumerator::new(&search, 100, 1000)
        .enumerate(interval("2009-01-01", "2009-01-31"), |_| panic!("nothing to push"))
        .await
        .unwrap();

    assert_eq!(stats.pages, 1);
    assert_eq!(stats.pushed, 0);
    assert_eq!(stats.stop_reason, StopReason::EmptyPage);
}

#[tokio::test]
async fn test_duplicates_within_interval_are_pushed() {
    // Page 2 overlaps page 1 because the result set shifted between requests
    let search = ScriptedSearch::new(search_page(4, &[]))
        .with_page(1, search_page(4, &["a", "b"]))
        .with_page(2, search_page(4, &["b", "c"]));

    let mut pushed = Vec::new();
    let stats = Enumerator::new(&search, 2, 1000)
        .enumerate(interval("2015-01-01", "2015-01-31"), |login| pushed.push(login.to_string()))
        .await
        .unwrap();

    assert_eq!(pushed, vec!["a", "b", "b", "c"]);
    assert_eq!(stats.pushed, 4);
    assert_eq!(stats.distinct, 3);
    assert_eq!(stats.stop_reason, StopReason::Completed);
}

#[tokio::test]
async fn test_total_is_recomputed_per_page() {
    // The total grows from 3 to 5 after page 1, adding a third page
    let search = ScriptedSearch::new(search_page(5, &["e"]))
        .with_page(1, search_page(3, &["a", "b"]))
        .with_page(2, search_page(5, &["c", "d"]));

    let mut pushed = Vec::new();
    let stats = Enumerator::new(&search, 2, 1000)
        .enumerate(interval("2015-01-01", "2015-01-31"), |login| pushed.push(login.to_string()))
        .await
        .unwrap();

    assert_eq!(stats.pages, 3);
    assert_eq!(stats.total_count, 5);
    assert_eq!(pushed, vec!["a", "b", "c", "d", "e"]);
    assert_eq!(stats.stop_reason, StopReason::Completed);
}

#[tokio::test]
async fn test_repeated_page_stops_with_no_progress() {
    let search = ScriptedSearch::new(search_page(500, &["same", "logins"]));

    let stats = Enumerator::new(&search, 2, 1000)
        .enumerate(interval("2015-01-01", "2015-01-31"), |_| {})
        .await
        .unwrap();

    assert_eq!(stats.stop_reason, StopReason::NoProgress);
    assert_eq!(search.requests(), 2);
}

#[tokio::test]
async fn test_page_limit_bounds_overfull_interval() {
    let search = MockSearch::new(MockSearch::accounts_on("user", "2014-02-10", 1500));

    let stats = Enumerator::new(&search, 100, 1000)
        .enumerate(interval("2014-02-10", "2014-02-10"), |_| {})
        .await
        .unwrap();

    assert_eq!(stats.pages, 10);
    assert_eq!(stats.pushed, 1000);
    assert_eq!(stats.stop_reason, StopReason::PageLimit);
}

#[tokio::test]
async fn test_enumeration_stops_on_shutdown() {
    let search = MockSearch::new(MockSearch::accounts_on("user", "2011-03-03", 250));
    let shutdown = ShutdownCoordinator::shared();
    shutdown.request_shutdown();

    let result = Enumerator::new(&search, 100, 1000)
        .with_shutdown(Some(&shutdown))
        .enumerate(interval("2011-01-01", "2011-12-31"), |_| {})
        .await;

    assert!(matches!(result, Err(FetcherError::Cancelled)));
    assert_eq!(search.page_requests(), 0);
}
