//! `merge` command

use clap::Parser;
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

use super::{extra_data, parse_extra, CliError};
use crate::output::region::Region;
use crate::output::{write_ranking, OutputFormat};
use crate::SortField;

/// Arguments for merging city rankings into a region
#[derive(Parser, Debug)]
pub struct MergeArgs {
    /// City ranking files (JSON), merged in order
    #[arg(long = "input", required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Region ranking file
    #[arg(long)]
    pub output: PathBuf,

    /// Field the ranking is sorted by (descending)
    #[arg(long, default_value_t = SortField::Public)]
    pub sort: SortField,

    /// Number of users exported; 0 exports everyone
    #[arg(long, default_value_t = 0)]
    pub limit: usize,

    /// Ranking file format: json or csv
    #[arg(long, default_value = "json")]
    pub format: OutputFormat,

    /// Extra `KEY=VALUE` data written next to the ranking (JSON only)
    #[arg(long, value_parser = parse_extra)]
    pub extra: Vec<(String, Value)>,
}

impl MergeArgs {
    /// Merge every input and export the region ranking
    pub fn execute(&self) -> Result<(), CliError> {
        let mut region = Region::new();
        for input in &self.inputs {
            let added = region.add_city(input)?;
            println!("{}: {} new users", input.display(), added);
        }

        let ranking = region.export_top_n(self.limit, self.sort);
        let written = write_ranking(&self.output, self.format, &ranking, extra_data(&self.extra))?;

        info!(
            cities = self.inputs.len(),
            users = region.total_users(),
            "Region merged"
        );
        println!("Region users: {}", region.total_users());
        println!("Exported: {} users to {}", written, self.output.display());
        Ok(())
    }
}
