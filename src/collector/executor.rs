//! Collection run entry point

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::collector::config::{CollectorSettings, PROFILE_REQUEST_PAUSE_MS};
use crate::collector::context::{RunContext, WorkerStats};
use crate::collector::progress::{LiveCounters, ProgressState};
use crate::collector::rate_limit::RateLimiter;
use crate::collector::CollectorError;
use crate::credentials::Credentials;
use crate::fetcher::github_http::GithubHttpClient;
use crate::fetcher::pagination::Enumerator;
use crate::fetcher::profile::ProfileScraper;
use crate::fetcher::search::{GithubSearch, SearchQuery};
use crate::fetcher::shared_resources::build_http_client;
use crate::fetcher::{ProfileSource, SearchSource};
use crate::metrics::CollectionMetrics;
use crate::planner::IntervalPlanner;
use crate::shutdown::SharedShutdown;
use crate::state::CityConfig;
use crate::store::{RankedUser, ResultStore};
use crate::{domain_epoch, Interval, SortField, UserRecord};

/// Counters of one finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Total the unrestricted search query reported
    pub reported_total: u64,
    /// Intervals enumerated
    pub intervals: usize,
    /// Search pages requested
    pub pages: u64,
    /// Logins pushed onto the queue, duplicates included
    pub discovered: u64,
    /// Logins taken from the queue by workers
    pub processed: u64,
    /// Distinct logins admitted
    pub admitted: usize,
    /// Records in the store
    pub stored: usize,
}

/// Enumerates and enriches every user of one city
pub struct CityCollector {
    config: CityConfig,
    settings: CollectorSettings,
    search: Arc<dyn SearchSource>,
    profiles: Arc<dyn ProfileSource>,
    store: Arc<ResultStore>,
    counters: Arc<LiveCounters>,
    shutdown: Option<SharedShutdown>,
}

impl CityCollector {
    /// Build a collector talking to GitHub
    ///
    /// # Errors
    /// Fails immediately on an invalid configuration or when the HTTP client
    /// cannot be built; no request is made.
    pub fn connect(
        config: CityConfig,
        credentials: Credentials,
        settings: CollectorSettings,
    ) -> Result<Self, CollectorError> {
        Self::connect_with_shutdown(config, credentials, settings, None)
    }

    /// Same as [`connect`](Self::connect), with retries and waits cut short on shutdown
    pub fn connect_with_shutdown(
        config: CityConfig,
        credentials: Credentials,
        settings: CollectorSettings,
        shutdown: Option<SharedShutdown>,
    ) -> Result<Self, CollectorError> {
        config.validate()?;
        let client = build_http_client()?;

        let mut search_http = GithubHttpClient::new(
            client.clone(),
            Arc::new(RateLimiter::from_budget(settings.search_budget)),
            settings.search_retry,
            "search",
        )
        .with_credentials(credentials);
        let mut profile_http = GithubHttpClient::new(
            client,
            Arc::new(RateLimiter::unlimited()),
            settings.profile_retry,
            "profile",
        );
        if let Some(shutdown) = &shutdown {
            search_http = search_http.with_shutdown(shutdown.clone());
            profile_http = profile_http.with_shutdown(shutdown.clone());
        }

        let mut query = SearchQuery::new(config.locations.clone());
        for (field, value) in &settings.filters {
            query.add_filter(field.clone(), value.clone());
        }

        let search = GithubSearch::new(search_http, &settings.api_url, query, settings.page_size);
        let profiles = ProfileScraper::new(
            profile_http,
            &settings.profile_url,
            settings.contribution_breakdown,
            Duration::from_millis(PROFILE_REQUEST_PAUSE_MS),
        );

        let collector = Self::with_sources(config, settings, Arc::new(search), Arc::new(profiles))?;
        Ok(match shutdown {
            Some(shutdown) => collector.with_shutdown(shutdown),
            None => collector,
        })
    }

    /// Build a collector over arbitrary collaborators
    pub fn with_sources(
        config: CityConfig,
        settings: CollectorSettings,
        search: Arc<dyn SearchSource>,
        profiles: Arc<dyn ProfileSource>,
    ) -> Result<Self, CollectorError> {
        config.validate()?;
        Ok(Self {
            config,
            settings,
            search,
            profiles,
            store: Arc::new(ResultStore::new()),
            counters: Arc::new(LiveCounters::default()),
            shutdown: None,
        })
    }

    /// Stop planning, enumeration and workers once shutdown is requested
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// The city configuration, including any intervals planned so far
    pub fn config(&self) -> &CityConfig {
        &self.config
    }

    /// Planned intervals
    pub fn intervals(&self) -> &[Interval] {
        &self.config.intervals
    }

    async fn plan(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Interval>, CollectorError> {
        let planner = IntervalPlanner::new(self.search.as_ref(), self.settings.result_cap)
            .with_shutdown(self.shutdown.as_ref());
        Ok(planner.plan(start, end).await?)
    }

    async fn city_total(&self) -> Result<u64, CollectorError> {
        let total = self.search.total_count(None).await?;
        info!(city = %self.config.name, total_count = total, "Users in city");
        Ok(total)
    }

    /// Plan intervals covering every account created up to today
    ///
    /// Replaces any saved plan.
    pub async fn calculate_best_intervals(&mut self) -> Result<&[Interval], CollectorError> {
        self.calculate_intervals_until(Utc::now().date_naive()).await
    }

    /// Plan intervals covering `[epoch, today]`
    pub async fn calculate_intervals_until(&mut self, today: NaiveDate) -> Result<&[Interval], CollectorError> {
        let span = info_span!("plan", city = %self.config.name);
        async {
            self.city_total().await?;
            let intervals = self.plan(domain_epoch(), today).await?;
            self.config.set_intervals(intervals, today);
            Ok::<(), CollectorError>(())
        }
        .instrument(span)
        .await?;
        Ok(&self.config.intervals)
    }

    /// Plan only the days after the saved intervals; returns how many intervals were added
    pub async fn extend_to_today(&mut self) -> Result<usize, CollectorError> {
        self.extend_until(Utc::now().date_naive()).await
    }

    /// Plan only the days between the last saved interval and `today`
    ///
    /// A saved plan with gaps, or one not starting at the epoch, is replaced by
    /// a full plan.
    pub async fn extend_until(&mut self, today: NaiveDate) -> Result<usize, CollectorError> {
        if !self.config.has_intervals() {
            return Ok(self.calculate_intervals_until(today).await?.len());
        }
        if !self.config.intervals_are_contiguous() {
            warn!(city = %self.config.name, "Saved intervals leave days uncovered, planning from scratch");
            return Ok(self.calculate_intervals_until(today).await?.len());
        }

        let start = self.config.next_domain_start();
        if start > today {
            debug!(city = %self.config.name, "Intervals already up to date");
            return Ok(0);
        }

        let intervals = self.plan(start, today).await?;
        let added = intervals.len();
        self.config.extend_intervals(intervals, today);
        info!(city = %self.config.name, added = added, from = %start, "Intervals extended");
        Ok(added)
    }

    /// Enumerate every interval and enrich every discovered user
    ///
    /// Plans intervals first when none are saved. Previous results are discarded.
    pub async fn get_city_users(&mut self) -> Result<RunSummary, CollectorError> {
        if !self.config.has_intervals() {
            debug!("No saved intervals, calculating best intervals");
            self.calculate_best_intervals().await?;
        }

        let metrics = CollectionMetrics::start(self.config.name.clone());
        let span = info_span!("collect", city = %self.config.name);

        let result = self.run_collection().instrument(span).await;
        match &result {
            Ok(summary) => metrics.record_success(summary.stored),
            Err(CollectorError::Cancelled) => metrics.record_interrupted(self.store.count()),
            Err(e) => metrics.record_failure(&e.to_string()),
        }
        result
    }

    async fn run_collection(&mut self) -> Result<RunSummary, CollectorError> {
        let reported_total = self.city_total().await?;

        self.store = Arc::new(ResultStore::new());
        self.counters.reset();
        let context = Arc::new(
            RunContext::new(self.config.exclusions(), self.store.clone(), self.profiles.clone())
                .with_progress(ProgressState::new(Some(reported_total)))
                .with_counters(self.counters.clone()),
        );

        let workers = self.settings.workers.max(1);
        info!(workers = workers, "Launching workers");
        let handles: Vec<JoinHandle<WorkerStats>> = (0..workers)
            .map(|id| tokio::spawn(context.clone().run_worker(id)))
            .collect();

        let enumeration = self.enumerate_intervals(&context).await;

        context.queue().close();
        debug!("Enumeration finished, queue closed");

        let mut processed = 0;
        let mut worker_failure = None;
        for joined in join_all(handles).await {
            match joined {
                Ok(stats) => processed += stats.processed,
                Err(e) => {
                    error!(error = %e, "Worker task failed");
                    worker_failure.get_or_insert_with(|| e.to_string());
                }
            }
        }
        debug!("Workers joined");

        let (pages, discovered) = enumeration?;
        if let Some(failure) = worker_failure {
            return Err(CollectorError::WorkerFailed(failure));
        }
        if self.shutdown.as_ref().is_some_and(|s| s.is_shutdown_requested()) {
            return Err(CollectorError::Cancelled);
        }

        Ok(RunSummary {
            reported_total,
            intervals: self.config.intervals.len(),
            pages,
            discovered,
            processed,
            admitted: context.seen_count(),
            stored: self.store.count(),
        })
    }

    async fn enumerate_intervals(&self, context: &RunContext) -> Result<(u64, u64), CollectorError> {
        let enumerator = Enumerator::new(
            self.search.as_ref(),
            self.settings.page_size,
            self.settings.result_cap,
        )
        .with_shutdown(self.shutdown.as_ref());

        let total = self.config.intervals.len();
        let mut pages = 0;
        let mut discovered = 0;

        for (i, interval) in self.config.intervals.iter().enumerate() {
            context.set_phase(format!("interval {}/{}", i + 1, total));
            info!(interval = %interval, index = i + 1, total = total, "Getting users");

            let stats = enumerator
                .enumerate(*interval, |login| {
                    if context.queue().push(login) {
                        context.counters().record_discovered();
                    }
                })
                .instrument(info_span!("interval", range = %interval))
                .await?;

            pages += u64::from(stats.pages);
            discovered += stats.pushed;
        }

        Ok((pages, discovered))
    }

    /// Counters of the current or last run, readable while it is in flight
    pub fn live_counters(&self) -> Arc<LiveCounters> {
        self.counters.clone()
    }

    /// Shared handle to the result store
    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    /// Number of stored users
    pub fn total_users(&self) -> usize {
        self.store.count()
    }

    /// Users sorted by `field`, descending
    pub fn sorted_users(&self, field: SortField) -> Vec<UserRecord> {
        self.store.sorted_by(field)
    }

    /// Users sorted by a field name; an unknown name keeps the current order
    pub fn sorted_users_by_name(&self, field: &str) -> Vec<UserRecord> {
        self.store.sorted_by_name(field)
    }

    /// Top `n` users by `field` with positions; `n == 0` exports all
    pub fn export_top_n(&self, n: usize, field: SortField) -> Vec<RankedUser> {
        self.store.export_top_n(n, field)
    }
}
