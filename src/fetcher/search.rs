//! User search collaborator backed by the REST search endpoint

use async_trait::async_trait;
use tracing::debug;

use crate::fetcher::github_http::GithubHttpClient;
use crate::fetcher::{FetcherResult, SearchPage, SearchSource};
use crate::Interval;

/// Order of results by join date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Oldest accounts first
    #[default]
    Asc,
    /// Newest accounts first
    Desc,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Filter expression of a user search
///
/// Produces `type:user`, one quoted `location:` qualifier per location, any
/// extra `field:value` filters and an optional `created:START..END` range.
///
/// # Examples
///
/// ```
/// use github_city::fetcher::search::SearchQuery;
///
/// let mut query = SearchQuery::new(vec!["Granada".to_string()]);
/// query.add_filter("repos", ">1");
/// assert_eq!(query.query_string(None), r#"type:user location:"Granada" repos:>1"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    locations: Vec<String>,
    filters: Vec<(String, String)>,
    order: SortOrder,
}

impl SearchQuery {
    /// Query matching any of `locations`
    pub fn new(locations: Vec<String>) -> Self {
        Self {
            locations,
            filters: Vec::new(),
            order: SortOrder::Asc,
        }
    }

    /// Add an extra search qualifier (e.g. `followers`, `>10`)
    pub fn add_filter(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.filters.push((field.into(), value.into()));
    }

    /// Change the join-date order
    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Locations this query matches
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// The `q` parameter, unescaped
    pub fn query_string(&self, range: Option<Interval>) -> String {
        let mut terms = vec!["type:user".to_string()];

        for location in &self.locations {
            let location = location.replace('"', "");
            if !location.trim().is_empty() {
                terms.push(format!("location:\"{}\"", location.trim()));
            }
        }

        for (field, value) in &self.filters {
            terms.push(format!("{}:{}", field, value.trim_start_matches(':')));
        }

        if let Some(range) = range {
            terms.push(format!("created:{}", range.to_query_range()));
        }

        terms.join(" ")
    }

    /// Full parameter list for one page
    pub fn to_params(&self, range: Option<Interval>, page: u32, per_page: u64) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.query_string(range)),
            ("sort", "joined".to_string()),
            ("order", self.order.as_str().to_string()),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
        ]
    }
}

/// [`SearchSource`] that queries `GET {api}/search/users`
pub struct GithubSearch {
    http: GithubHttpClient,
    url: String,
    query: SearchQuery,
    page_size: u64,
}

impl GithubSearch {
    /// Create a search collaborator
    ///
    /// # Arguments
    /// * `http` - Rate-limited request layer (authenticated)
    /// * `api_url` - REST API base URL
    /// * `query` - Filter expression
    /// * `page_size` - Results per page
    pub fn new(http: GithubHttpClient, api_url: &str, query: SearchQuery, page_size: u64) -> Self {
        Self {
            http,
            url: format!("{}/search/users", api_url.trim_end_matches('/')),
            query,
            page_size,
        }
    }

    /// Filter expression used by this collaborator
    pub fn query(&self) -> &SearchQuery {
        &self.query
    }
}

#[async_trait]
impl SearchSource for GithubSearch {
    async fn search_page(&self, range: Option<Interval>, page: u32) -> FetcherResult<SearchPage> {
        let params = self.query.to_params(range, page, self.page_size);
        debug!(q = %params[0].1, page = page, "Searching users");
        self.http.get_json::<SearchPage>(&self.url, &params).await
    }
}
