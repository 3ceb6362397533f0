//! CLI command implementations

pub mod collect;
pub mod error;
pub mod intervals;
pub mod merge;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::collector::config::{DEFAULT_API_URL, DEFAULT_PROFILE_URL, MAX_WORKERS};
use crate::credentials::Credentials;
use crate::output::{ExtraData, OutputFormat};
use crate::shutdown::SharedShutdown;

pub use collect::CollectArgs;
pub use error::CliError;
pub use intervals::{IntervalsArgs, RefreshArgs};
pub use merge::MergeArgs;

/// GitHub city ranking CLI
#[derive(Parser, Debug)]
#[command(name = "github-city")]
#[command(about = "Enumerate and rank the GitHub users of a city", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9000)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the best search intervals and save them into the city file
    Intervals(IntervalsArgs),

    /// Extend the saved intervals up to today
    Refresh(RefreshArgs),

    /// Enumerate, enrich and export every user of a city
    Collect(CollectArgs),

    /// Merge several city rankings into a region ranking
    Merge(MergeArgs),
}

impl Cli {
    /// Run the selected command
    pub async fn execute(&self, shutdown: SharedShutdown) -> Result<(), CliError> {
        match &self.command {
            Commands::Intervals(args) => args.execute(shutdown).await,
            Commands::Refresh(args) => args.execute(shutdown).await,
            Commands::Collect(args) => args.execute(shutdown).await,
            Commands::Merge(args) => args.execute(),
        }
    }
}

/// Flags shared by every command that talks to GitHub
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// OAuth application client ID
    #[arg(long, env = "GITHUB_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// OAuth application client secret
    #[arg(long, env = "GITHUB_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL, hide = true)]
    pub api_url: String,

    /// Profile pages base URL
    #[arg(long, env = "GITHUB_PROFILE_URL", default_value = DEFAULT_PROFILE_URL, hide = true)]
    pub profile_url: String,
}

impl ConnectionArgs {
    /// Build credentials, failing when either part is missing or blank
    pub fn credentials(&self) -> Result<Credentials, CliError> {
        Ok(Credentials::from_parts(
            self.client_id.as_deref(),
            self.client_secret.as_deref(),
        )?)
    }
}

/// Parse and validate the worker count
fn parse_workers(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("workers must be at least 1".to_string());
    }
    if value > MAX_WORKERS {
        return Err(format!("workers {value} exceeds maximum of {MAX_WORKERS}"));
    }
    Ok(value)
}

/// Parse `KEY=VALUE`; the value is taken as JSON when it parses, as a string otherwise
fn parse_extra(s: &str) -> Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("'{s}' is not KEY=VALUE"))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("'{s}' has an empty key"));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn extra_data(pairs: &[(String, Value)]) -> ExtraData {
    pairs.iter().cloned().collect()
}

/// `<dir>/<name>.ranking.<ext>` next to the city file
fn default_output_path(config_path: &Path, name: &str, format: OutputFormat) -> PathBuf {
    let extension = match format {
        OutputFormat::Json => "json",
        OutputFormat::Csv => "csv",
    };
    let file_name = format!(
        "{}.ranking.{extension}",
        name.trim().to_lowercase().replace(' ', "_")
    );
    config_path
        .parent()
        .map(|dir| dir.join(&file_name))
        .unwrap_or_else(|| PathBuf::from(&file_name))
}
