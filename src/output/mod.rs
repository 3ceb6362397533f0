//! Ranking output writers

use crate::store::RankedUser;
use serde_json::{Map, Value};
use std::path::Path;
use std::str::FromStr;

pub mod csv;
pub mod json;
pub mod region;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// A ranking file could not be read back
    #[error("invalid ranking file {path}: {reason}")]
    InvalidRanking {
        /// File path
        path: String,
        /// What was wrong
        reason: String,
    },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Extra key/value data written next to a ranking
pub type ExtraData = Map<String, Value>;

/// Generic output writer trait
pub trait OutputWriter {
    /// Flush any buffered data to disk
    fn flush(&mut self) -> OutputResult<()>;

    /// Close the writer and finalize output
    fn close(self) -> OutputResult<()>;
}

/// Trait for writing ranked users
pub trait RankingWriter: OutputWriter {
    /// Write a single ranked user
    fn write_user(&mut self, user: &RankedUser) -> OutputResult<()>;

    /// Write multiple ranked users at once
    fn write_users(&mut self, users: &[RankedUser]) -> OutputResult<()> {
        for user in users {
            self.write_user(user)?;
        }
        Ok(())
    }
}

/// Ranking file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `{"users": [...], "extraData": {...}}`
    #[default]
    Json,
    /// One row per user with a header line
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Invalid output format: {s}. Expected json or csv")),
        }
    }
}

/// Write a ranking in `format`; returns the number of users written
///
/// `extra` only applies to JSON output.
pub fn write_ranking(
    path: &Path,
    format: OutputFormat,
    users: &[RankedUser],
    extra: ExtraData,
) -> OutputResult<usize> {
    match format {
        OutputFormat::Json => {
            let mut writer = json::JsonRankingWriter::new(path)?.with_extra_data(extra);
            writer.write_users(users)?;
            writer.close()?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::CsvRankingWriter::new(path)?;
            writer.write_users(users)?;
            writer.close()?;
        }
    }
    Ok(users.len())
}
