//! `intervals` and `refresh` commands

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use super::{CliError, ConnectionArgs};
use crate::collector::{CityCollector, CollectorSettings};
use crate::shutdown::SharedShutdown;
use crate::state::CityConfig;

/// Arguments for computing intervals from scratch
#[derive(Parser, Debug)]
pub struct IntervalsArgs {
    /// City configuration file
    #[arg(long)]
    pub config: PathBuf,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Arguments for extending saved intervals
#[derive(Parser, Debug)]
pub struct RefreshArgs {
    /// City configuration file
    #[arg(long)]
    pub config: PathBuf,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

fn connect(
    config: CityConfig,
    connection: &ConnectionArgs,
    shutdown: SharedShutdown,
) -> Result<CityCollector, CliError> {
    let credentials = connection.credentials()?;
    let settings = CollectorSettings::default()
        .with_base_urls(connection.api_url.clone(), connection.profile_url.clone());
    Ok(CityCollector::connect_with_shutdown(
        config,
        credentials,
        settings,
        Some(shutdown),
    )?)
}

impl IntervalsArgs {
    /// Plan `[epoch, today]` and save the intervals
    pub async fn execute(&self, shutdown: SharedShutdown) -> Result<(), CliError> {
        let config = CityConfig::load(&self.config)?;
        let mut collector = connect(config, &self.connection, shutdown)?;

        let count = collector.calculate_best_intervals().await?.len();
        collector.config().save(&self.config)?;

        info!(path = %self.config.display(), intervals = count, "Intervals saved");
        println!("{}: {} intervals saved to {}", collector.config().name, count, self.config.display());
        Ok(())
    }
}

impl RefreshArgs {
    /// Plan the days after `last_date` and append them
    pub async fn execute(&self, shutdown: SharedShutdown) -> Result<(), CliError> {
        let config = CityConfig::load(&self.config)?;
        let mut collector = connect(config, &self.connection, shutdown)?;

        let added = collector.extend_to_today().await?;
        collector.config().save(&self.config)?;

        println!(
            "{}: {} intervals added ({} total)",
            collector.config().name,
            added,
            collector.intervals().len()
        );
        Ok(())
    }
}
