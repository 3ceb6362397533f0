//! Unit tests for search query construction

use github_city::fetcher::search::{SearchQuery, SortOrder};

use crate::support::interval;

#[test]
fn test_unrestricted_query() {
    let query = SearchQuery::new(vec!["Granada".to_string()]);
    assert_eq!(query.query_string(None), r#"type:user location:"Granada""#);
}

#[test]
fn test_locations_filters_and_range() {
    let mut query = SearchQuery::new(vec!["Granada".to_string(), "Armilla".to_string()]);
    query.add_filter("followers", ">10");
    query.add_filter("repos", ":>1");

    assert_eq!(
        query.query_string(Some(interval("2008-01-01", "2008-02-01"))),
        r#"type:user location:"Granada" location:"Armilla" followers:>10 repos:>1 created:2008-01-01..2008-02-01"#
    );
}

#[test]
fn test_params_default_to_ascending_join_order() {
    let query = SearchQuery::new(vec!["Granada".to_string()]);
    let params = query.to_params(Some(interval("2010-01-01", "2010-01-31")), 1, 100);

    let get = |name: &str| {
        params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.clone())
            .unwrap()
    };
    assert_eq!(get("sort"), "joined");
    assert_eq!(get("order"), "asc");
    assert_eq!(get("per_page"), "100");
    assert_eq!(get("page"), "1");
    assert!(get("q").ends_with("created:2010-01-01..2010-01-31"));
}

#[test]
fn test_descending_order() {
    let query = SearchQuery::new(vec!["Granada".to_string()]).with_order(SortOrder::Desc);
    let params = query.to_params(None, 2, 50);
    assert!(params.contains(&("order", "desc".to_string())));
}
