//! Integration tests for city configuration persistence

use github_city::state::city::MAX_CONFIG_FILE_SIZE;
use github_city::state::lock::lock_path;
use github_city::state::{CityConfig, StateError};
use std::fs::File;
use tempfile::TempDir;

use crate::support::{date, interval};

#[test]
fn test_saved_file_uses_wire_keys() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("granada.json");

    let mut config = CityConfig::new("Granada", vec!["Granada".to_string(), "Armilla".to_string()])
        .with_excluded_users(vec!["iblancasa".to_string()])
        .with_excluded_locations(vec!["Nicaragua".to_string()]);
    config.set_intervals(
        vec![
            interval("2008-01-01", "2012-06-30"),
            interval("2012-07-01", "2024-06-15"),
        ],
        date("2024-06-15"),
    );
    config.save(&path).unwrap();

    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["name"], "Granada");
    assert_eq!(raw["last_date"], "2024-06-15");
    assert_eq!(raw["intervals"][1][0], "2012-07-01");
    assert_eq!(raw["excludedUsers"][0], "iblancasa");
    assert_eq!(raw["excludedLocations"][0], "Nicaragua");
    assert!(lock_path(&path).exists());
}

#[test]
fn test_save_overwrites_previous_plan() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("granada.json");

    let mut config = CityConfig::new("Granada", vec!["Granada".to_string()]);
    config.set_intervals(vec![interval("2008-01-01", "2020-01-01")], date("2020-01-01"));
    config.save(&path).unwrap();

    config.extend_intervals(vec![interval("2020-01-02", "2024-01-01")], date("2024-01-01"));
    config.save(&path).unwrap();

    let loaded = CityConfig::load(&path).unwrap();
    assert_eq!(loaded.intervals.len(), 2);
    assert_eq!(loaded.last_date, Some(date("2024-01-01")));
    assert!(loaded.intervals_are_contiguous());
}

#[test]
fn test_oversized_file_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("huge.json");
    File::create(&path).unwrap().set_len(MAX_CONFIG_FILE_SIZE + 1).unwrap();

    assert!(matches!(
        CityConfig::load(&path),
        Err(StateError::FileTooLarge { .. })
    ));
}

#[test]
fn test_malformed_file_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, r#"{"name": "Granada", "intervals": [["2010-01-02", "2010-01-01"]]}"#).unwrap();

    assert!(matches!(
        CityConfig::load(&path),
        Err(StateError::DeserializationError(_))
    ));
}

#[test]
fn test_non_contiguous_plan_still_loads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gappy.json");
    std::fs::write(
        &path,
        r#"{"name": "Granada", "locations": ["Granada"],
            "intervals": [["2008-01-01", "2009-01-01"], ["2010-01-01", "2011-01-01"]]}"#,
    )
    .unwrap();

    let config = CityConfig::load(&path).unwrap();
    assert!(!config.intervals_are_contiguous());
    assert_eq!(config.intervals.len(), 2);
}
