//! Integration tests for interval planning

use chrono::Days;
use github_city::fetcher::FetcherError;
use github_city::planner::{covers_domain, IntervalPlanner, PlannerError};
use github_city::shutdown::ShutdownCoordinator;

use crate::support::{date, interval, MockSearch};

#[tokio::test]
async fn test_domain_over_cap_splits_once() {
    // 1500 matches in total, 750 on each side of the midpoint
    let mut accounts = MockSearch::accounts_on("early", "2008-01-05", 750);
    accounts.extend(MockSearch::accounts_on("late", "2008-01-20", 750));
    let search = MockSearch::new(accounts);

    let planner = IntervalPlanner::new(&search, 1000);
    let intervals = planner.plan(date("2008-01-01"), date("2008-02-01")).await.unwrap();

    assert_eq!(
        intervals,
        vec![
            interval("2008-01-01", "2008-01-16"),
            interval("2008-01-17", "2008-02-01"),
        ]
    );
    assert!(covers_domain(&intervals, date("2008-01-01"), date("2008-02-01")));

    // Whole domain, then left, then right
    let counted: Vec<_> = search.calls().into_iter().map(|(range, _)| range.unwrap()).collect();
    assert_eq!(counted.len(), 3);
    assert_eq!(counted[1], intervals[0]);
    assert_eq!(counted[2], intervals[1]);
}

#[tokio::test]
async fn test_domain_under_cap_is_one_interval() {
    let search = MockSearch::new(MockSearch::accounts_on("user", "2010-06-01", 999));

    let intervals = IntervalPlanner::new(&search, 1000)
        .plan(date("2008-01-01"), date("2012-12-31"))
        .await
        .unwrap();

    assert_eq!(intervals, vec![interval("2008-01-01", "2012-12-31")]);
    assert_eq!(search.page_requests(), 1);
}

#[tokio::test]
async fn test_count_equal_to_cap_is_split() {
    let mut accounts = MockSearch::accounts_on("a", "2008-01-01", 500);
    accounts.extend(MockSearch::accounts_on("b", "2008-01-02", 500));
    let search = MockSearch::new(accounts);

    let intervals = IntervalPlanner::new(&search, 1000)
        .plan(date("2008-01-01"), date("2008-01-02"))
        .await
        .unwrap();

    assert_eq!(
        intervals,
        vec![
            interval("2008-01-01", "2008-01-01"),
            interval("2008-01-02", "2008-01-02"),
        ]
    );
}

#[tokio::test]
async fn test_busy_single_day_exhausts_domain() {
    let mut accounts = MockSearch::accounts_on("quiet", "2008-03-01", 10);
    accounts.extend(MockSearch::accounts_on("busy", "2014-02-10", 1200));
    let search = MockSearch::new(accounts);

    let result = IntervalPlanner::new(&search, 1000)
        .plan(date("2008-01-01"), date("2016-01-01"))
        .await;

    match result {
        Err(PlannerError::DomainExhausted { day, total_count }) => {
            assert_eq!(day, date("2014-02-10"));
            assert_eq!(total_count, 1200);
        }
        other => panic!("expected DomainExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn test_dense_domain_tiles_without_gaps() {
    // 30 accounts per day for two years; every interval must stay under the cap
    let start = date("2012-01-01");
    let mut accounts = Vec::new();
    for day in 0..730u64 {
        let created = start.checked_add_days(Days::new(day)).unwrap();
        for i in 0..30 {
            accounts.push((format!("u{day}-{i}"), created));
        }
    }
    let search = MockSearch::new(accounts);
    let end = date("2013-12-30");

    let intervals = IntervalPlanner::new(&search, 1000).plan(start, end).await.unwrap();

    assert!(intervals.len() > 1);
    assert!(covers_domain(&intervals, start, end));
    for planned in &intervals {
        assert!(planned.days() * 30 < 1000, "{planned} is over the cap");
    }
}

#[tokio::test]
async fn test_reversed_domain_rejected() {
    let search = MockSearch::new(Vec::new());
    let result = IntervalPlanner::new(&search, 1000)
        .plan(date("2010-01-02"), date("2010-01-01"))
        .await;

    assert!(matches!(result, Err(PlannerError::InvalidDomain { .. })));
    assert_eq!(search.page_requests(), 0);
}

#[tokio::test]
async fn test_planning_stops_on_shutdown() {
    let search = MockSearch::new(MockSearch::accounts_on("user", "2010-06-01", 10));
    let shutdown = ShutdownCoordinator::shared();
    shutdown.request_shutdown();

    let result = IntervalPlanner::new(&search, 1000)
        .with_shutdown(Some(&shutdown))
        .plan(date("2008-01-01"), date("2012-12-31"))
        .await;

    assert!(matches!(result, Err(PlannerError::Fetch(FetcherError::Cancelled))));
    assert_eq!(search.page_requests(), 0);
}
