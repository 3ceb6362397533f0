//! CSV ranking writer

use crate::store::RankedUser;
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, info};

use super::{OutputError, OutputResult, OutputWriter, RankingWriter};

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// CSV row for one ranked user
#[derive(Debug, Serialize)]
struct UserRow<'a> {
    position: usize,
    name: &'a str,
    contributions: u64,
    public: u64,
    private: u64,
    followers: u64,
    repositories: u64,
    organizations: u64,
    join: String,
    location: &'a str,
    bio: &'a str,
    avatar: &'a str,
}

impl<'a> From<&'a RankedUser> for UserRow<'a> {
    fn from(ranked: &'a RankedUser) -> Self {
        let user = &ranked.user;
        Self {
            position: ranked.position,
            name: &user.login,
            contributions: user.contributions,
            public: user.public_contributions,
            private: user.private_contributions,
            followers: user.followers,
            repositories: user.repositories,
            organizations: user.organizations,
            join: user
                .joined
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            location: &user.location,
            bio: &user.bio,
            avatar: &user.avatar,
        }
    }
}

/// CSV writer for rankings
pub struct CsvRankingWriter {
    writer: Writer<BufWriter<File>>,
    users_written: u64,
}

impl CsvRankingWriter {
    /// Create a new CSV ranking writer
    ///
    /// Parent directories are created as needed.
    pub fn new<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        let path = path.as_ref();
        info!("Creating CSV writer: path={}", path.display());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("Failed to create directory: {e}")))?;
        }

        let file = File::create(path)
            .map_err(|e| OutputError::IoError(format!("Failed to create file: {e}")))?;

        let buf_writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);

        // Headers are written by csv::Writer on the first serialize()
        Ok(Self {
            writer: Writer::from_writer(buf_writer),
            users_written: 0,
        })
    }

    /// Get number of users written so far
    pub fn users_written(&self) -> u64 {
        self.users_written
    }
}

impl RankingWriter for CsvRankingWriter {
    fn write_user(&mut self, user: &RankedUser) -> OutputResult<()> {
        self.writer
            .serialize(UserRow::from(user))
            .map_err(|e| OutputError::CsvError(format!("Failed to write user: {e}")))?;
        self.users_written += 1;
        Ok(())
    }
}

impl OutputWriter for CsvRankingWriter {
    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::IoError(format!("Failed to flush: {e}")))
    }

    fn close(mut self) -> OutputResult<()> {
        debug!("Closing CSV writer: {} users written", self.users_written);

        self.flush()?;

        let buf_writer = self
            .writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get inner writer: {e}")))?;

        let file = buf_writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get file handle: {e}")))?;

        file.sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync file: {e}")))?;

        info!("CSV writer closed successfully: {} users written", self.users_written);
        Ok(())
    }
}
