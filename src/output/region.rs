//! Rankings spanning several cities
//!
//! A region merges the JSON rankings of its cities. A login that appears in
//! more than one city keeps the record from the first file that listed it.

use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use super::json::read_ranking;
use super::OutputResult;
use crate::store::{RankedUser, ResultStore};
use crate::SortField;

/// Users merged from several city rankings
#[derive(Debug, Default)]
pub struct Region {
    store: ResultStore,
    logins: HashSet<String>,
}

impl Region {
    /// Create an empty region
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a city ranking file; returns how many new users it contributed
    pub fn add_city(&mut self, path: &Path) -> OutputResult<usize> {
        let ranking = read_ranking(path)?;
        let total = ranking.users.len();
        let mut added = 0;

        for user in ranking.users {
            if self.logins.insert(user.login.clone()) {
                self.store.push(user);
                added += 1;
            } else {
                debug!(login = %user.login, "User already in region");
            }
        }

        info!(
            path = %path.display(),
            users = total,
            added = added,
            "City merged into region"
        );
        Ok(added)
    }

    /// Number of distinct users
    pub fn total_users(&self) -> usize {
        self.store.count()
    }

    /// Top `n` users by `field` with positions; `n == 0` exports all
    pub fn export_top_n(&self, n: usize, field: SortField) -> Vec<RankedUser> {
        self.store.export_top_n(n, field)
    }
}
