//! Enriched user storage
//!
//! The store has its own lock, independent of the admission lock guarding the
//! set of seen logins. Appends are O(1); insertion order is whatever order the
//! workers finish in and carries no meaning.

use serde::Serialize;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

use crate::{SortField, UserRecord};

/// A user with its 1-based rank in an export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedUser {
    /// 1-based rank
    pub position: usize,
    /// The user
    #[serde(flatten)]
    pub user: UserRecord,
}

/// Thread-safe collection of enriched users
#[derive(Debug, Default)]
pub struct ResultStore {
    users: Mutex<Vec<UserRecord>>,
}

impl ResultStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `users`
    pub fn from_users(users: Vec<UserRecord>) -> Self {
        Self {
            users: Mutex::new(users),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<UserRecord>> {
        self.users.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a record
    pub fn push(&self, user: UserRecord) {
        self.lock().push(user);
    }

    /// Number of stored records
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Whether a login is stored
    pub fn contains(&self, login: &str) -> bool {
        self.lock().iter().any(|user| user.login == login)
    }

    /// Records in insertion order
    pub fn users(&self) -> Vec<UserRecord> {
        self.lock().clone()
    }

    /// Records sorted by `field`, descending; ties keep insertion order
    pub fn sorted_by(&self, field: SortField) -> Vec<UserRecord> {
        let mut users = self.users();
        users.sort_by(|a, b| field.compare(b, a));
        users
    }

    /// Records sorted by a field name
    ///
    /// An unknown name leaves insertion order unchanged and logs a warning.
    pub fn sorted_by_name(&self, field: &str) -> Vec<UserRecord> {
        match SortField::from_str(field) {
            Ok(field) => self.sorted_by(field),
            Err(e) => {
                warn!(field = %field, "{e}, keeping current order");
                self.users()
            }
        }
    }

    /// The first `n` records by `field` with 1-based positions; `n == 0` exports all
    pub fn export_top_n(&self, n: usize, field: SortField) -> Vec<RankedUser> {
        let sorted = self.sorted_by(field);
        let limit = if n == 0 { sorted.len() } else { n };

        sorted
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, user)| RankedUser { position: i + 1, user })
            .collect()
    }
}
