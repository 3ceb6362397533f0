//! # GitHub City Library
//!
//! Enumerates every GitHub account whose profile location matches a city (or a
//! set of locations) and enriches each one with data scraped from its profile
//! page, producing a deduplicated ranking that can be sorted and exported.
//!
//! ## Features
//!
//! - **Cap-aware enumeration**: the user search API never returns more than 1000
//!   results per query, so the account-creation date domain is bisected into
//!   intervals that each stay under the cap
//! - **Rate-limit aware**: every request waits out the provider's reset window
//!   instead of failing
//! - **Concurrent enrichment**: a fixed pool of workers drains discovered logins
//!   while enumeration is still running
//! - **Exclusions**: users and location substrings can be excluded up front
//! - **Persistent city configuration**: computed intervals are saved and reused
//!
//! ## Quick Start
//!
//! ```no_run
//! use github_city::collector::{CityCollector, CollectorSettings};
//! use github_city::credentials::Credentials;
//! use github_city::state::CityConfig;
//! use github_city::SortField;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Credentials::new("client-id", "client-secret")?;
//! let config = CityConfig::new("Granada", vec!["Granada".to_string()]);
//!
//! let mut collector =
//!     CityCollector::connect(config, credentials, CollectorSettings::default())?;
//! collector.get_city_users().await?;
//!
//! for entry in collector.export_top_n(10, SortField::Public) {
//!     println!("{} {}", entry.position, entry.user.login);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`fetcher`] - Rate-limited request layer, search and profile collaborators, pagination
//! - [`planner`] - Recursive bisection of the date domain into capped intervals
//! - [`collector`] - Run context, work queue and the enrichment worker pool
//! - [`store`] - Deduplicated result store with sorting and bounded export
//! - [`state`] - City configuration persistence
//! - [`output`] - JSON/CSV ranking writers and region merging

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// CLI command implementations
pub mod cli;

/// Enumeration and enrichment orchestration
pub mod collector;

/// API credentials
pub mod credentials;

/// Request layer and remote collaborators
pub mod fetcher;

/// Prometheus metrics
pub mod metrics;

/// Ranking output writers
pub mod output;

/// Date domain partitioning
pub mod planner;

/// City configuration persistence
pub mod state;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

/// Enriched user storage
pub mod store;

pub use credentials::Credentials;
pub use store::ResultStore;

/// First day accounts could be created; the lower bound of every search domain.
pub fn domain_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2008, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Closed range of account-creation dates used to restrict one search query
///
/// Serialized as a two-element array `["YYYY-MM-DD", "YYYY-MM-DD"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "[NaiveDate; 2]", try_from = "[NaiveDate; 2]")]
pub struct Interval {
    start: NaiveDate,
    end: NaiveDate,
}

impl Interval {
    /// Create an interval, rejecting `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, String> {
        if start > end {
            return Err(format!("Interval start ({start}) must not be after end ({end})"));
        }
        Ok(Self { start, end })
    }

    /// First day (inclusive)
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day (inclusive)
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days covered, counting both ends
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Whether the interval covers exactly one day and cannot be split further
    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }

    /// Split at the floor midpoint: `[start, middle]` and `[middle + 1, end]`
    ///
    /// Returns `None` for single-day intervals.
    pub fn split(&self) -> Option<(Interval, Interval)> {
        if self.is_single_day() {
            return None;
        }
        let half = ((self.end - self.start).num_days() / 2) as u64;
        let middle = self.start.checked_add_days(Days::new(half))?;
        let right_start = middle.checked_add_days(Days::new(1))?;
        Some((
            Interval {
                start: self.start,
                end: middle,
            },
            Interval {
                start: right_start,
                end: self.end,
            },
        ))
    }

    /// Search qualifier value, e.g. `2008-01-01..2008-02-01`
    pub fn to_query_range(&self) -> String {
        format!(
            "{}..{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_query_range())
    }
}

impl From<Interval> for [NaiveDate; 2] {
    fn from(interval: Interval) -> Self {
        [interval.start, interval.end]
    }
}

impl TryFrom<[NaiveDate; 2]> for Interval {
    type Error = String;

    fn try_from(value: [NaiveDate; 2]) -> Result<Self, Self::Error> {
        Interval::new(value[0], value[1])
    }
}

/// An enriched GitHub user
///
/// Field names on the wire follow the ranking export format (`name` is the login).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UserRecord {
    /// Login, the deduplication key
    #[serde(rename = "name")]
    pub login: String,
    /// Contributions in the last year as shown on the profile
    pub contributions: u64,
    /// Public contributions in the last year
    #[serde(rename = "public")]
    pub public_contributions: u64,
    /// Private contributions in the last year
    #[serde(rename = "private")]
    pub private_contributions: u64,
    /// Number of followers
    pub followers: u64,
    /// Number of public repositories
    pub repositories: u64,
    /// Number of public organizations
    pub organizations: u64,
    /// Day the account was created
    #[serde(rename = "join", default, deserialize_with = "deserialize_join")]
    pub joined: Option<NaiveDate>,
    /// Free-text profile location
    #[serde(default)]
    pub location: String,
    /// Free-text bio
    #[serde(default)]
    pub bio: String,
    /// Avatar URL
    #[serde(default)]
    pub avatar: String,
}

// Older exports write an empty string for an unknown join date.
fn deserialize_join<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

impl UserRecord {
    /// Create an empty record for a login
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            ..Default::default()
        }
    }

    /// Validate record integrity
    pub fn validate(&self) -> Result<(), String> {
        if self.login.is_empty() {
            return Err("Login cannot be empty".to_string());
        }

        if self.public_contributions > self.contributions {
            return Err(format!(
                "Public contributions ({}) exceed total ({})",
                self.public_contributions, self.contributions
            ));
        }

        Ok(())
    }
}

/// Field a ranking can be sorted by (always descending)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    /// Total contributions
    Contributions,
    /// Public contributions
    #[default]
    Public,
    /// Private contributions
    Private,
    /// Login
    Name,
    /// Followers
    Followers,
    /// Join date
    Join,
    /// Organizations
    Organizations,
    /// Repositories
    Repositories,
}

impl SortField {
    /// Every sortable field, in documentation order
    pub const ALL: [SortField; 8] = [
        SortField::Contributions,
        SortField::Public,
        SortField::Private,
        SortField::Name,
        SortField::Followers,
        SortField::Join,
        SortField::Organizations,
        SortField::Repositories,
    ];

    /// Compare two records by this field in ascending natural order
    pub fn compare(&self, a: &UserRecord, b: &UserRecord) -> std::cmp::Ordering {
        match self {
            SortField::Contributions => a.contributions.cmp(&b.contributions),
            SortField::Public => a.public_contributions.cmp(&b.public_contributions),
            SortField::Private => a.private_contributions.cmp(&b.private_contributions),
            SortField::Name => a.login.cmp(&b.login),
            SortField::Followers => a.followers.cmp(&b.followers),
            SortField::Join => a.joined.cmp(&b.joined),
            SortField::Organizations => a.organizations.cmp(&b.organizations),
            SortField::Repositories => a.repositories.cmp(&b.repositories),
        }
    }
}

impl std::fmt::Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SortField::Contributions => "contributions",
            SortField::Public => "public",
            SortField::Private => "private",
            SortField::Name => "name",
            SortField::Followers => "followers",
            SortField::Join => "join",
            SortField::Organizations => "organizations",
            SortField::Repositories => "repositories",
        };
        write!(f, "{s}")
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contributions" => Ok(SortField::Contributions),
            "public" => Ok(SortField::Public),
            "private" => Ok(SortField::Private),
            "name" => Ok(SortField::Name),
            "followers" => Ok(SortField::Followers),
            "join" => Ok(SortField::Join),
            "organizations" => Ok(SortField::Organizations),
            "repositories" => Ok(SortField::Repositories),
            _ => Err(format!("Invalid sort field: {s}")),
        }
    }
}
