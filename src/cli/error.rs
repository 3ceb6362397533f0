//! CLI error types and conversions

use crate::collector::CollectorError;
use crate::credentials::CredentialsError;
use crate::output::OutputError;
use crate::state::StateError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// City configuration could not be loaded or saved
    #[error("configuration error: {0}")]
    ConfigError(#[from] StateError),

    /// Credentials missing or blank
    #[error("credentials error: {0}")]
    CredentialsError(#[from] CredentialsError),

    /// Planning or collection failed
    #[error("collector error: {0}")]
    CollectorError(#[from] CollectorError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
