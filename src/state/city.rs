//! City configuration persistence
//!
//! A city is described by a JSON document:
//!
//! ```json
//! {
//!   "name": "Granada",
//!   "locations": ["Granada", "Graná"],
//!   "intervals": [["2008-01-01", "2012-03-04"], ["2012-03-05", "2024-06-15"]],
//!   "last_date": "2024-06-15",
//!   "excludedUsers": ["some-bot"],
//!   "excludedLocations": ["Granada, Nicaragua"]
//! }
//! ```
//!
//! Saved intervals let later runs skip planning; `last_date` marks the day the
//! plan was computed so a refresh only searches the days after it.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

use super::lock::{with_lock, LockMode};
use super::StateError;
use crate::collector::context::ExclusionSet;
use crate::planner::covers_domain;
use crate::{domain_epoch, Interval};

/// Maximum allowed configuration file size (10 MB) to prevent memory exhaustion
pub const MAX_CONFIG_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Configuration of one city
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityConfig {
    /// City name
    pub name: String,
    /// Free-text locations searched (OR-combined)
    #[serde(default)]
    pub locations: Vec<String>,
    /// Planned intervals, in chronological order
    #[serde(default)]
    pub intervals: Vec<Interval>,
    /// Day the intervals were last computed up to
    #[serde(default)]
    pub last_date: Option<NaiveDate>,
    /// Logins never included
    #[serde(default, rename = "excludedUsers")]
    pub excluded_users: Vec<String>,
    /// Location substrings whose users are dropped
    #[serde(default, rename = "excludedLocations")]
    pub excluded_locations: Vec<String>,
}

impl CityConfig {
    /// Create a configuration without intervals or exclusions
    pub fn new(name: impl Into<String>, locations: Vec<String>) -> Self {
        Self {
            name: name.into(),
            locations,
            intervals: Vec::new(),
            last_date: None,
            excluded_users: Vec::new(),
            excluded_locations: Vec::new(),
        }
    }

    /// Add logins to the exclusion list
    pub fn with_excluded_users<I: IntoIterator<Item = String>>(mut self, users: I) -> Self {
        self.excluded_users.extend(users);
        self
    }

    /// Add location substrings to the exclusion list
    pub fn with_excluded_locations<I: IntoIterator<Item = String>>(mut self, locations: I) -> Self {
        self.excluded_locations.extend(locations);
        self
    }

    /// Check the configuration can seed a run
    ///
    /// # Errors
    /// [`StateError::InvalidConfig`] for an empty name or no usable location.
    pub fn validate(&self) -> Result<(), StateError> {
        if self.name.trim().is_empty() {
            return Err(StateError::InvalidConfig("city name cannot be empty".to_string()));
        }

        if self.locations.iter().all(|l| l.trim().is_empty()) {
            return Err(StateError::InvalidConfig(format!(
                "city '{}' has no locations",
                self.name
            )));
        }

        if let (Some(last), Some(interval)) = (self.last_date, self.intervals.last()) {
            if interval.end() > last {
                return Err(StateError::InvalidConfig(format!(
                    "last interval ends {} after last_date {}",
                    interval.end(),
                    last
                )));
            }
        }

        Ok(())
    }

    /// Exclusions to apply during a run
    pub fn exclusions(&self) -> ExclusionSet {
        ExclusionSet::new(
            self.excluded_users.iter().cloned(),
            self.excluded_locations.iter().cloned(),
        )
    }

    /// Whether intervals were already planned
    pub fn has_intervals(&self) -> bool {
        !self.intervals.is_empty()
    }

    /// Whether the saved intervals tile `[epoch, last interval end]` without gaps
    pub fn intervals_are_contiguous(&self) -> bool {
        match self.intervals.last() {
            Some(last) => covers_domain(&self.intervals, domain_epoch(), last.end()),
            None => true,
        }
    }

    /// First day not covered by the saved plan: the day after the last interval
    pub fn next_domain_start(&self) -> NaiveDate {
        match self.intervals.last() {
            Some(last) => last.end().checked_add_days(Days::new(1)).unwrap_or(last.end()),
            None => domain_epoch(),
        }
    }

    /// Replace the plan
    pub fn set_intervals(&mut self, intervals: Vec<Interval>, last_date: NaiveDate) {
        self.intervals = intervals;
        self.last_date = Some(last_date);
    }

    /// Append intervals planned after `last_date`
    pub fn extend_intervals(&mut self, intervals: Vec<Interval>, last_date: NaiveDate) {
        self.intervals.extend(intervals);
        self.last_date = Some(last_date);
    }

    /// Load a configuration file with a shared lock
    pub fn load(path: &Path) -> Result<Self, StateError> {
        debug!(path = %path.display(), "Loading city configuration");

        let config: CityConfig = with_lock(path, LockMode::Shared, || {
            let metadata = std::fs::metadata(path).map_err(|e| StateError::IoError(e.to_string()))?;
            if metadata.len() > MAX_CONFIG_FILE_SIZE {
                return Err(StateError::FileTooLarge {
                    size: metadata.len(),
                    max: MAX_CONFIG_FILE_SIZE,
                });
            }

            let contents =
                std::fs::read_to_string(path).map_err(|e| StateError::IoError(e.to_string()))?;

            serde_json::from_str(&contents).map_err(|e| {
                warn!(error = %e, "Failed to deserialize city configuration");
                StateError::DeserializationError(e.to_string())
            })
        })?;

        if !config.intervals_are_contiguous() {
            warn!(city = %config.name, "Saved intervals are not contiguous");
        }

        info!(
            city = %config.name,
            intervals = config.intervals.len(),
            locations = config.locations.len(),
            "City configuration loaded"
        );
        Ok(config)
    }

    /// Save atomically with an exclusive lock
    ///
    /// Writes to a temporary file in the same directory, syncs it, then renames it
    /// over `path`.
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        debug!(path = %path.display(), "Saving city configuration");

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| StateError::SerializationError(e.to_string()))?;

        with_lock(path, LockMode::Exclusive, || {
            let parent_dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let mut temp_file = tempfile::NamedTempFile::new_in(parent_dir)
                .map_err(|e| StateError::IoError(format!("Failed to create temp file: {e}")))?;

            temp_file
                .write_all(json.as_bytes())
                .map_err(|e| StateError::IoError(format!("Failed to write to temp file: {e}")))?;
            temp_file
                .flush()
                .map_err(|e| StateError::IoError(format!("Failed to flush temp file: {e}")))?;
            temp_file
                .as_file()
                .sync_all()
                .map_err(|e| StateError::IoError(format!("Failed to sync temp file: {e}")))?;

            temp_file
                .persist(path)
                .map_err(|e| StateError::IoError(format!("Failed to persist temp file: {e}")))?;

            if let Ok(dir) = std::fs::File::open(parent_dir) {
                let _ = dir.sync_all();
            }
            Ok(())
        })?;

        info!(
            path = %path.display(),
            city = %self.name,
            intervals = self.intervals.len(),
            "City configuration saved"
        );
        Ok(())
    }
}
