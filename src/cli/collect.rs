//! `collect` command

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::{default_output_path, extra_data, parse_extra, parse_workers, CliError, ConnectionArgs};
use crate::collector::config::DEFAULT_WORKERS;
use crate::collector::{CityCollector, CollectorError, CollectorSettings, LiveCounters};
use crate::output::{write_ranking, OutputFormat};
use crate::shutdown::SharedShutdown;
use crate::state::CityConfig;
use crate::SortField;

const SPINNER_REFRESH_MS: u64 = 250;

/// Arguments for a full collection run
#[derive(Parser, Debug)]
pub struct CollectArgs {
    /// City configuration file
    #[arg(long)]
    pub config: PathBuf,

    /// Number of enrichment workers
    #[arg(long, default_value_t = DEFAULT_WORKERS, value_parser = parse_workers)]
    pub workers: usize,

    /// Field the ranking is sorted by (descending)
    #[arg(long, default_value_t = SortField::Public)]
    pub sort: SortField,

    /// Number of users exported; 0 exports everyone
    #[arg(long, default_value_t = 0)]
    pub limit: usize,

    /// Ranking file (default: `<city>.ranking.<format>` next to the config file)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Ranking file format: json or csv
    #[arg(long, default_value = "json")]
    pub format: OutputFormat,

    /// Extra `KEY=VALUE` data written next to the ranking (JSON only)
    #[arg(long, value_parser = parse_extra)]
    pub extra: Vec<(String, Value)>,

    /// Save intervals computed during the run back into the config file
    #[arg(long, default_value_t = false)]
    pub save_config: bool,

    /// Skip the public/private contribution breakdown
    #[arg(long, default_value_t = false)]
    pub no_breakdown: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

impl CollectArgs {
    fn settings(&self) -> CollectorSettings {
        CollectorSettings::default()
            .with_workers(self.workers)
            .with_base_urls(
                self.connection.api_url.clone(),
                self.connection.profile_url.clone(),
            )
            .with_contribution_breakdown(!self.no_breakdown)
    }

    /// Run enumeration and enrichment, then export the ranking
    ///
    /// An interrupted run still exports what it collected before failing.
    pub async fn execute(&self, shutdown: SharedShutdown) -> Result<(), CliError> {
        let config = CityConfig::load(&self.config)?;
        let credentials = self.connection.credentials()?;
        let mut collector =
            CityCollector::connect_with_shutdown(config, credentials, self.settings(), Some(shutdown))?;

        let (spinner, ticker) = start_spinner(&collector.config().name, collector.live_counters());
        let result = collector.get_city_users().await;
        ticker.abort();
        spinner.finish_and_clear();

        let interrupted = match result {
            Ok(summary) => {
                info!(
                    stored = summary.stored,
                    discovered = summary.discovered,
                    pages = summary.pages,
                    "Collection finished"
                );
                false
            }
            Err(CollectorError::Cancelled) => {
                warn!(stored = collector.total_users(), "Collection interrupted, exporting partial results");
                true
            }
            Err(e) => {
                error!("Collection failed: {}", e);
                return Err(e.into());
            }
        };

        if self.save_config {
            collector.config().save(&self.config)?;
            info!(path = %self.config.display(), "City configuration saved");
        }

        let output = self.output.clone().unwrap_or_else(|| {
            default_output_path(&self.config, &collector.config().name, self.format)
        });
        let ranking = collector.export_top_n(self.limit, self.sort);
        let written = write_ranking(&output, self.format, &ranking, extra_data(&self.extra))?;

        println!("City: {}", collector.config().name);
        println!("Users found: {}", collector.total_users());
        println!("Sorted by: {}", self.sort);
        println!("Exported: {} users to {}", written, output.display());

        if interrupted {
            return Err(CollectorError::Cancelled.into());
        }
        Ok(())
    }
}

fn start_spinner(city: &str, counters: Arc<LiveCounters>) -> (ProgressBar, JoinHandle<()>) {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(SPINNER_REFRESH_MS));

    let city = city.to_string();
    let ticker = tokio::spawn({
        let spinner = spinner.clone();
        async move {
            let mut interval = tokio::time::interval(Duration::from_millis(SPINNER_REFRESH_MS));
            loop {
                interval.tick().await;
                spinner.set_message(format!(
                    "{city}: {} found, {} processed, {} stored",
                    counters.discovered(),
                    counters.processed(),
                    counters.stored()
                ));
            }
        }
    });

    (spinner, ticker)
}
