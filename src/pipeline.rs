//! The four-stage RFM pipeline: clean, aggregate, score, segment

use crate::aggregate::aggregate_customers;
use crate::clean::{clean_transactions, CleanReport};
use crate::config::RfmConfig;
use crate::error::PipelineResult;
use crate::score::score_customers;
use crate::segment::{segment_customers, Segment, SegmentedCustomer};
use crate::transaction::{CustomerId, TransactionLine};
use rust_decimal::Decimal;

/// One exported result row, keyed by customer id.
#[derive(Debug, Clone, PartialEq)]
pub struct RfmRecord {
    pub customer_id: CustomerId,
    pub segment: Segment,
    pub recency: i64,
    pub frequency: u32,
    pub monetary: Decimal,
}

impl From<&SegmentedCustomer> for RfmRecord {
    fn from(customer: &SegmentedCustomer) -> Self {
        let metrics = &customer.scored.metrics;
        RfmRecord {
            customer_id: metrics.customer_id.clone(),
            segment: customer.segment,
            recency: metrics.recency,
            frequency: metrics.frequency,
            monetary: metrics.monetary,
        }
    }
}

/// Result of a complete run.
#[derive(Debug, Clone, PartialEq)]
pub struct RfmAnalysis {
    /// Segmented customers in ascending customer id order
    pub customers: Vec<SegmentedCustomer>,
    pub cleaning: CleanReport,
}

impl RfmAnalysis {
    pub fn records(&self) -> Vec<RfmRecord> {
        self.customers.iter().map(RfmRecord::from).collect()
    }

    pub fn find(&self, customer_id: &str) -> Option<&SegmentedCustomer> {
        self.customers
            .iter()
            .find(|c| c.scored.metrics.customer_id.as_str() == customer_id)
    }
}

/// Run every stage over `lines` with `config`.
///
/// Any fatal stage error aborts the run; no partial table is returned.
pub fn run_pipeline(lines: &[TransactionLine], config: &RfmConfig) -> PipelineResult<RfmAnalysis> {
    let table = config.validate()?;

    let cleaned = clean_transactions(lines, &config.clean_options());
    let metrics = aggregate_customers(&cleaned.lines, config.reference_datetime())?;
    let scored = score_customers(metrics, config.buckets)?;
    let customers = segment_customers(scored, &table)?;

    Ok(RfmAnalysis {
        customers,
        cleaning: cleaned.report,
    })
}
