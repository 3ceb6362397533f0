//! Enrichment collaborator that scrapes public profile pages
//!
//! Field extraction is lenient: a missing element leaves the field at its
//! default instead of failing the whole profile.

use async_trait::async_trait;
use chrono::{Days, Months, NaiveDate, Utc};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::debug;

use crate::fetcher::github_http::{FetchedBody, GithubHttpClient};
use crate::fetcher::{FetcherResult, ProfileSource};
use crate::UserRecord;

/// Marker text of an overview window without any activity
const NO_ACTIVITY_MARKER: &str = "had no activity during this period.";

/// Days of history covered by the contribution breakdown
const BREAKDOWN_DAYS: u64 = 366;

/// [`ProfileSource`] reading `{base}/{login}`
pub struct ProfileScraper {
    http: GithubHttpClient,
    base_url: String,
    contribution_breakdown: bool,
    request_pause: Duration,
}

impl ProfileScraper {
    /// Create a scraper
    ///
    /// # Arguments
    /// * `http` - Rate-limited request layer for profile pages
    /// * `base_url` - Profile site base URL
    /// * `contribution_breakdown` - Also walk monthly overview pages to split
    ///   contributions into public and private
    /// * `request_pause` - Pause after every page request
    pub fn new(
        http: GithubHttpClient,
        base_url: &str,
        contribution_breakdown: bool,
        request_pause: Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            contribution_breakdown,
            request_pause,
        }
    }

    async fn fetch_page(&self, url: &str, params: &[(&str, String)]) -> FetcherResult<FetchedBody> {
        let page = self.http.fetch(url, params).await?;
        if !self.request_pause.is_zero() {
            tokio::time::sleep(self.request_pause).await;
        }
        Ok(page)
    }

    async fn private_contributions(&self, url: &str, today: NaiveDate) -> FetcherResult<u64> {
        let mut private = 0;
        for (from, to) in overview_windows(today) {
            let params = [
                ("tab", "overview".to_string()),
                ("from", from.format("%Y-%m-%d").to_string()),
                ("to", to.format("%Y-%m-%d").to_string()),
            ];
            let page = self.fetch_page(url, &params).await?;
            private += parse_private_contributions(&page.body);
        }
        Ok(private)
    }
}

#[async_trait]
impl ProfileSource for ProfileScraper {
    async fn fetch_profile(&self, login: &str) -> FetcherResult<UserRecord> {
        let url = format!("{}/{}", self.base_url, login);
        let page = self.fetch_page(&url, &[]).await?;
        let mut record = parse_profile(login, &page.body);

        if self.contribution_breakdown {
            let private = self
                .private_contributions(&url, Utc::now().date_naive())
                .await?;
            record.private_contributions = private;
            record.public_contributions = record.contributions.saturating_sub(private);
        } else {
            record.public_contributions = record.contributions;
        }

        debug!(
            login = %login,
            contributions = record.contributions,
            private = record.private_contributions,
            "Profile enriched"
        );
        Ok(record)
    }
}

/// Monthly `(from, to)` windows covering the last 366 days
pub fn overview_windows(today: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
    let Some(start) = today.checked_sub_days(Days::new(BREAKDOWN_DAYS)) else {
        return Vec::new();
    };

    let mut windows = Vec::new();
    let mut month = 0;
    while let Some(from) = start.checked_add_months(Months::new(month)) {
        if from >= today {
            break;
        }
        let to = from
            .checked_add_months(Months::new(1))
            .and_then(|d| d.checked_sub_days(Days::new(1)))
            .unwrap_or(today);
        windows.push((from, to));
        month += 1;
    }
    windows
}

/// Extract a record from a profile page
pub fn parse_profile(login: &str, html: &str) -> UserRecord {
    let document = Html::parse_document(html);
    let mut record = UserRecord::new(login);

    record.contributions = first_text(&document, "h2.f4.text-normal.mb-2")
        .and_then(|text| parse_count(first_token(&text)))
        .unwrap_or(0);

    record.avatar = first_element(&document, "img.avatar")
        .and_then(|img| img.value().attr("src"))
        .map(strip_query)
        .unwrap_or_default();

    let counters: Vec<String> = select_all(&document, "span.Counter")
        .into_iter()
        .map(element_text)
        .collect();
    record.repositories = counters.first().and_then(|c| parse_counter(c)).unwrap_or(0);
    record.followers = counters.get(2).and_then(|c| parse_counter(c)).unwrap_or(0);

    record.location = first_text(&document, "li[itemprop=homeLocation]")
        .map(|text| collapse_whitespace(&text))
        .unwrap_or_default();

    record.joined = select_all(&document, "a.dropdown-item")
        .into_iter()
        .find(|a| element_text(*a).contains("Joined GitHub"))
        .and_then(|a| a.value().attr("href"))
        .and_then(parse_join_href);

    record.bio = first_text(&document, "div.user-profile-bio")
        .map(|text| clean_bio(&text))
        .unwrap_or_default();

    record.organizations = select_all(&document, "a.avatar-group-item").len() as u64;

    record
}

/// Sum of contributions on one overview page (private ones included)
pub fn parse_private_contributions(html: &str) -> u64 {
    let document = Html::parse_document(html);

    let idle = select_all(&document, "span.text-gray.m-0")
        .into_iter()
        .any(|span| element_text(span).contains(NO_ACTIVITY_MARKER));
    if idle {
        return 0;
    }

    select_all(&document, "span.f4.lh-condensed.m-0.text-gray")
        .into_iter()
        .filter_map(|span| parse_count(first_token(&element_text(span))))
        .sum()
}

/// Parse a profile counter: `"42"`, `"1,234"`, `"1.2k"`, `"12k"`, `"1.5m"`
///
/// Returns `None` for anything unparseable, including values beyond `u64`.
pub fn parse_counter(text: &str) -> Option<u64> {
    let compact: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    let (number, scale) = if let Some(number) = compact.strip_suffix('k') {
        (number, 1_000)
    } else if let Some(number) = compact.strip_suffix('m') {
        (number, 1_000_000)
    } else {
        return parse_count(&compact);
    };

    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    let whole: u64 = whole.parse().ok()?;
    let tenths = fraction
        .chars()
        .next()
        .and_then(|c| c.to_digit(10))
        .unwrap_or(0) as u64;
    whole.checked_mul(scale)?.checked_add(tenths * scale / 10)
}

fn parse_count(text: &str) -> Option<u64> {
    text.replace(',', "").parse().ok()
}

fn first_token(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or("")
}

fn parse_join_href(href: &str) -> Option<NaiveDate> {
    let tail = href.get(href.len().saturating_sub(10)..)?;
    NaiveDate::parse_from_str(tail, "%Y-%m-%d").ok()
}

fn strip_query(src: &str) -> String {
    src.split('?').next().unwrap_or(src).to_string()
}

fn clean_bio(text: &str) -> String {
    if !text.is_ascii() {
        return String::new();
    }
    text.replace('\n', "")
        .replace('\t', " ")
        .replace(['"', '\'', '\\'], "")
        .trim()
        .to_string()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(selector) => document.select(&selector).collect(),
        None => Vec::new(),
    }
}

fn first_element<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = selector(css)?;
    document.select(&selector).next()
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    first_element(document, css).map(element_text)
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}
