//! SegmentForge: A Rust CLI application for RFM customer segmentation
//!
//! This library cleans invoice-line data, computes per-customer
//! Recency, Frequency and Monetary metrics, scores them on quantile bands
//! and maps the score pairs to named marketing segments.

pub mod aggregate;
pub mod clean;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod score;
pub mod segment;
pub mod summary;
pub mod transaction;
pub mod viz;

// Re-export public items for easier access
pub use aggregate::{aggregate_customers, CustomerMetrics};
pub use clean::{clean_transactions, CleanOptions, CleanReport, Cleaned};
pub use cli::Args;
pub use config::{AnalysisWindow, RfmConfig};
pub use data::{load_transactions, write_rfm_csv, write_segment_ids};
pub use error::{PipelineResult, RfmError};
pub use pipeline::{run_pipeline, RfmAnalysis, RfmRecord};
pub use score::{score_customers, ScoredCustomer};
pub use segment::{segment_customers, Segment, SegmentRule, SegmentTable, SegmentedCustomer};
pub use summary::{summarize_segments, SegmentSummary};
pub use transaction::{CleanedLine, CustomerId, TransactionLine};

/// Common result type used at the application boundary (I/O, CLI, charts)
pub type Result<T> = anyhow::Result<T>;
