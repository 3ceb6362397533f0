//! Unit tests for the result store

use github_city::store::ResultStore;
use github_city::{SortField, UserRecord};
use std::sync::Arc;

use crate::support::date;

fn user(login: &str) -> UserRecord {
    UserRecord::new(login)
}

#[test]
fn test_concurrent_pushes_are_all_kept() {
    let store = Arc::new(ResultStore::new());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 0..100 {
                    store.push(user(&format!("t{t}-u{i}")));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.count(), 800);
}

#[test]
fn test_every_field_sorts_descending() {
    let mut a = user("alpha");
    a.contributions = 10;
    a.public_contributions = 1;
    a.private_contributions = 9;
    a.followers = 100;
    a.repositories = 3;
    a.organizations = 0;
    a.joined = Some(date("2009-01-01"));

    let mut b = user("bravo");
    b.contributions = 20;
    b.public_contributions = 20;
    b.private_contributions = 0;
    b.followers = 5;
    b.repositories = 30;
    b.organizations = 4;
    b.joined = Some(date("2015-01-01"));

    let store = ResultStore::from_users(vec![a, b]);
    let first = |field: SortField| store.sorted_by(field)[0].login.clone();

    assert_eq!(first(SortField::Contributions), "bravo");
    assert_eq!(first(SortField::Public), "bravo");
    assert_eq!(first(SortField::Private), "alpha");
    assert_eq!(first(SortField::Name), "bravo");
    assert_eq!(first(SortField::Followers), "alpha");
    assert_eq!(first(SortField::Join), "bravo");
    assert_eq!(first(SortField::Organizations), "bravo");
    assert_eq!(first(SortField::Repositories), "bravo");
}

#[test]
fn test_unknown_join_date_sorts_last() {
    let mut dated = user("dated");
    dated.joined = Some(date("2010-05-05"));
    let store = ResultStore::from_users(vec![user("undated"), dated]);

    let logins: Vec<_> = store.sorted_by(SortField::Join).into_iter().map(|u| u.login).collect();
    assert_eq!(logins, vec!["dated", "undated"]);
}

#[test]
fn test_export_limit_larger_than_store() {
    let store = ResultStore::from_users(vec![user("a"), user("b")]);

    let exported = store.export_top_n(50, SortField::Public);
    assert_eq!(exported.len(), 2);
    assert_eq!(exported[1].position, 2);

    assert!(ResultStore::new().export_top_n(0, SortField::Public).is_empty());
}

#[test]
fn test_ranked_user_serializes_flat() {
    let store = ResultStore::from_users(vec![user("nitehack")]);
    let exported = store.export_top_n(1, SortField::Public);

    let value = serde_json::to_value(&exported[0]).unwrap();
    assert_eq!(value["position"], 1);
    assert_eq!(value["name"], "nitehack");
    assert!(value.get("user").is_none());
}
