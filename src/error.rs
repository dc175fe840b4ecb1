//! Error types for the RFM pipeline stages

use polars::prelude::PolarsError;
use thiserror::Error;

/// Fatal errors raised by the aggregation, scoring and segmentation stages.
///
/// Row-level problems (missing customer, unparseable price, cancellations)
/// never show up here: the cleaner drops those rows and counts them in
/// [`crate::clean::CleanReport`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RfmError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Composite code '{code}' does not match any segment rule")]
    UnmappedSegment { code: String },

    #[error("Frame error: {0}")]
    Frame(String),
}

impl From<PolarsError> for RfmError {
    fn from(err: PolarsError) -> Self {
        RfmError::Frame(err.to_string())
    }
}

impl RfmError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        RfmError::Configuration(message.into())
    }
}

pub type PipelineResult<T> = std::result::Result<T, RfmError>;
