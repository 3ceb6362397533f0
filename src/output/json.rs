//! JSON ranking writer and reader
//!
//! Document layout: `{"users": [{"position": 1, "name": ..., ...}], "extraData": {...}}`

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{ExtraData, OutputError, OutputResult, OutputWriter, RankingWriter};
use crate::store::RankedUser;
use crate::UserRecord;

#[derive(Serialize)]
struct RankingDocument<'a> {
    users: &'a [RankedUser],
    #[serde(rename = "extraData")]
    extra_data: &'a ExtraData,
}

/// Users read back from a ranking file
#[derive(Debug, Deserialize)]
pub struct RankingFile {
    /// Users in file order
    pub users: Vec<UserRecord>,
    /// Extra data, if any
    #[serde(default, rename = "extraData")]
    pub extra_data: Option<ExtraData>,
}

/// JSON writer for rankings
///
/// Users are buffered and the document is written atomically on [`close`](OutputWriter::close).
pub struct JsonRankingWriter {
    path: PathBuf,
    users: Vec<RankedUser>,
    extra_data: ExtraData,
}

impl JsonRankingWriter {
    /// Create a writer for `path`
    pub fn new<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        let path = path.as_ref().to_path_buf();
        info!("Creating JSON writer: path={}", path.display());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("Failed to create directory: {e}")))?;
        }

        Ok(Self {
            path,
            users: Vec::new(),
            extra_data: ExtraData::new(),
        })
    }

    /// Attach extra key/value data to the document
    pub fn with_extra_data(mut self, extra_data: ExtraData) -> Self {
        self.extra_data = extra_data;
        self
    }

    fn render(&self) -> OutputResult<String> {
        serde_json::to_string_pretty(&RankingDocument {
            users: &self.users,
            extra_data: &self.extra_data,
        })
        .map_err(|e| OutputError::SerializationError(e.to_string()))
    }
}

impl RankingWriter for JsonRankingWriter {
    fn write_user(&mut self, user: &RankedUser) -> OutputResult<()> {
        self.users.push(user.clone());
        Ok(())
    }
}

impl OutputWriter for JsonRankingWriter {
    fn flush(&mut self) -> OutputResult<()> {
        Ok(())
    }

    fn close(self) -> OutputResult<()> {
        let json = self.render()?;
        let parent_dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut temp_file = tempfile::NamedTempFile::new_in(parent_dir)
            .map_err(|e| OutputError::IoError(format!("Failed to create temp file: {e}")))?;
        temp_file
            .write_all(json.as_bytes())
            .map_err(|e| OutputError::IoError(format!("Failed to write to temp file: {e}")))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync temp file: {e}")))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| OutputError::IoError(format!("Failed to persist temp file: {e}")))?;

        info!(
            path = %self.path.display(),
            users = self.users.len(),
            "JSON ranking written"
        );
        Ok(())
    }
}

/// Read a ranking file written by [`JsonRankingWriter`]
pub fn read_ranking(path: &Path) -> OutputResult<RankingFile> {
    debug!(path = %path.display(), "Reading ranking file");
    let contents = std::fs::read_to_string(path)
        .map_err(|e| OutputError::IoError(format!("Failed to read {}: {e}", path.display())))?;

    serde_json::from_str(&contents).map_err(|e| OutputError::InvalidRanking {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
