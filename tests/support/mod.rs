//! In-process search and profile collaborators shared by the tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use github_city::fetcher::{FetcherError, FetcherResult, ProfileSource, SearchItem, SearchPage, SearchSource};
use github_city::{Interval, UserRecord};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn interval(start: &str, end: &str) -> Interval {
    Interval::new(date(start), date(end)).unwrap()
}

/// Search index over accounts with known creation dates
///
/// Behaves like the real API: pages of `page_size`, and no result past `cap`
/// is ever returned even though `total_count` reports every match.
pub struct MockSearch {
    accounts: Vec<(String, NaiveDate)>,
    page_size: usize,
    cap: usize,
    calls: Mutex<Vec<(Option<Interval>, u32)>>,
}

impl MockSearch {
    pub fn new(accounts: Vec<(String, NaiveDate)>) -> Self {
        Self {
            accounts,
            page_size: 100,
            cap: 1000,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `count` accounts named `<prefix><n>` created on `day`
    pub fn accounts_on(prefix: &str, day: &str, count: usize) -> Vec<(String, NaiveDate)> {
        (0..count).map(|i| (format!("{prefix}{i}"), date(day))).collect()
    }

    pub fn calls(&self) -> Vec<(Option<Interval>, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn page_requests(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn matching(&self, range: Option<Interval>) -> Vec<&str> {
        self.accounts
            .iter()
            .filter(|(_, created)| match range {
                Some(range) => *created >= range.start() && *created <= range.end(),
                None => true,
            })
            .map(|(login, _)| login.as_str())
            .collect()
    }
}

#[async_trait]
impl SearchSource for MockSearch {
    async fn search_page(&self, range: Option<Interval>, page: u32) -> FetcherResult<SearchPage> {
        self.calls.lock().unwrap().push((range, page));

        let matching = self.matching(range);
        let visible = &matching[..matching.len().min(self.cap)];
        let start = (page as usize - 1) * self.page_size;
        let items = visible
            .iter()
            .skip(start)
            .take(self.page_size)
            .map(|login| SearchItem {
                login: login.to_string(),
            })
            .collect();

        Ok(SearchPage {
            total_count: matching.len() as u64,
            incomplete_results: false,
            items,
        })
    }
}

/// Search source replaying scripted pages per page number
pub struct ScriptedSearch {
    pages: HashMap<u32, SearchPage>,
    fallback: SearchPage,
    requests: AtomicUsize,
}

impl ScriptedSearch {
    pub fn new(fallback: SearchPage) -> Self {
        Self {
            pages: HashMap::new(),
            fallback,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn with_page(mut self, page: u32, result: SearchPage) -> Self {
        self.pages.insert(page, result);
        self
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

pub fn search_page(total_count: u64, logins: &[&str]) -> SearchPage {
    SearchPage {
        total_count,
        incomplete_results: false,
        items: logins
            .iter()
            .map(|login| SearchItem {
                login: login.to_string(),
            })
            .collect(),
    }
}

#[async_trait]
impl SearchSource for ScriptedSearch {
    async fn search_page(&self, _range: Option<Interval>, page: u32) -> FetcherResult<SearchPage> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.pages.get(&page).cloned().unwrap_or_else(|| self.fallback.clone()))
    }
}

/// Profile source building records from the login
///
/// Contributions are the login length so rankings are deterministic.
#[derive(Default)]
pub struct MockProfiles {
    missing: HashSet<String>,
    failing: HashSet<String>,
    locations: HashMap<String, String>,
    inconsistent: HashSet<String>,
    delay: Option<Duration>,
    fetches: Mutex<Vec<String>>,
}

impl MockProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing(mut self, login: &str) -> Self {
        self.missing.insert(login.to_string());
        self
    }

    pub fn with_failing(mut self, login: &str) -> Self {
        self.failing.insert(login.to_string());
        self
    }

    pub fn with_location(mut self, login: &str, location: &str) -> Self {
        self.locations.insert(login.to_string(), location.to_string());
        self
    }

    /// Report more public contributions than the total for `login`
    pub fn with_inconsistent(mut self, login: &str) -> Self {
        self.inconsistent.insert(login.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn fetch_count(&self, login: &str) -> usize {
        self.fetches.lock().unwrap().iter().filter(|l| *l == login).count()
    }
}

#[async_trait]
impl ProfileSource for MockProfiles {
    async fn fetch_profile(&self, login: &str) -> FetcherResult<UserRecord> {
        self.fetches.lock().unwrap().push(login.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.missing.contains(login) {
            return Err(FetcherError::NotFound(login.to_string()));
        }
        if self.failing.contains(login) {
            return Err(FetcherError::ParseError(format!("unparseable profile for {login}")));
        }

        let mut user = UserRecord::new(login);
        user.contributions = login.len() as u64;
        user.public_contributions = login.len() as u64;
        if self.inconsistent.contains(login) {
            user.public_contributions += 1;
        }
        user.location = self
            .locations
            .get(login)
            .cloned()
            .unwrap_or_else(|| "Granada, Spain".to_string());
        Ok(user)
    }
}
