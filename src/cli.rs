//! Command-line interface definitions and argument parsing

use crate::config::{AnalysisWindow, RfmConfig};
use crate::segment::Segment;
use chrono::NaiveDate;
use clap::Parser;

/// Customer segmentation CLI using RFM quantile scoring
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "data.csv")]
    pub input: String,

    /// Output path for the segmented RFM table
    #[arg(short, long, default_value = "rfm.csv")]
    pub output: String,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Reference date for recency, e.g. 2010-12-11 (overrides the config file)
    #[arg(short, long)]
    pub reference_date: Option<NaiveDate>,

    /// First invoice date included in the analysis
    #[arg(long)]
    pub window_start: Option<NaiveDate>,

    /// Last invoice date included in the analysis
    #[arg(long)]
    pub window_end: Option<NaiveDate>,

    /// Export the ids of one segment, e.g. new_customers
    #[arg(short, long)]
    pub export_segment: Option<Segment>,

    /// Output path for the exported segment ids
    #[arg(long, default_value = "segment_customers.csv")]
    pub segment_output: String,

    /// Output path for the segment scatter plot; the size chart is written next to it
    #[arg(short, long)]
    pub plot: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Build the run configuration: defaults, then the config file, then flags
    pub fn resolve_config(&self) -> crate::Result<RfmConfig> {
        let mut config = match &self.config {
            Some(path) => RfmConfig::load(path)?,
            None => RfmConfig::default(),
        };

        if let Some(reference_date) = self.reference_date {
            config.reference_date = reference_date;
        }

        match (self.window_start, self.window_end) {
            (None, None) => {}
            (Some(start), Some(end)) => config.window = Some(AnalysisWindow { start, end }),
            (start, end) => {
                let existing = config.window;
                let start = start.or(existing.map(|w| w.start));
                let end = end.or(existing.map(|w| w.end));
                match (start, end) {
                    (Some(start), Some(end)) => config.window = Some(AnalysisWindow { start, end }),
                    _ => anyhow::bail!("Both --window-start and --window-end are required for an analysis window"),
                }
            }
        }

        Ok(config)
    }
}
