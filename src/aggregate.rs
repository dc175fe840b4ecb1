//! Per-customer recency, frequency and monetary metrics

use crate::error::{PipelineResult, RfmError};
use crate::transaction::{CleanedLine, CustomerId};
use chrono::NaiveDateTime;
use polars::prelude::*;
use rust_decimal::Decimal;
use std::collections::HashMap;

const MICROS_PER_DAY: i64 = 86_400 * 1_000_000;

/// RFM metrics for one customer.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerMetrics {
    pub customer_id: CustomerId,
    /// Whole days between the last purchase and the reference date
    pub recency: i64,
    /// Number of distinct invoices
    pub frequency: u32,
    /// Net spend across all cleaned lines
    pub monetary: Decimal,
}

/// Group cleaned lines by customer and compute their metrics.
///
/// Last purchase and distinct invoice counts come from a Polars group-by;
/// net spend is summed as `Decimal` so money stays exact. Customers with
/// zero or negative net spend are dropped and the rest are ordered by id.
/// An empty input yields an empty result. Fails if any line is dated at or
/// after `reference`, since recency would no longer be meaningful.
pub fn aggregate_customers(
    lines: &[CleanedLine],
    reference: NaiveDateTime,
) -> PipelineResult<Vec<CustomerMetrics>> {
    let mut spend: HashMap<&str, Decimal> = HashMap::new();
    for line in lines {
        if line.invoice_date >= reference {
            return Err(RfmError::config(format!(
                "reference date {} is not after invoice {} dated {}",
                reference, line.invoice_id, line.invoice_date
            )));
        }
        *spend.entry(line.customer_id.as_str()).or_default() += line.line_total;
    }

    if lines.is_empty() {
        tracing::info!(customers = 0, "aggregation complete");
        return Ok(Vec::new());
    }

    let df = df!(
        "customer_id" => lines.iter().map(|l| l.customer_id.as_str()).collect::<Vec<_>>(),
        "invoice_id" => lines.iter().map(|l| l.invoice_id.as_str()).collect::<Vec<_>>(),
        "invoice_ts" => lines.iter().map(|l| l.invoice_date.and_utc().timestamp_micros()).collect::<Vec<_>>(),
    )?;

    let grouped = df
        .lazy()
        .group_by([col("customer_id")])
        .agg([
            col("invoice_ts").max().alias("last_purchase"),
            col("invoice_id").n_unique().alias("frequency"),
        ])
        .collect()?;

    let reference_micros = reference.and_utc().timestamp_micros();
    let ids = grouped.column("customer_id")?.str()?;
    let last_purchases = grouped.column("last_purchase")?.i64()?;
    let frequencies = grouped.column("frequency")?.cast(&DataType::UInt32)?;
    let frequencies = frequencies.u32()?;

    let mut metrics: Vec<CustomerMetrics> = ids
        .into_iter()
        .zip(last_purchases)
        .zip(frequencies)
        .filter_map(|((id, last), frequency)| {
            let (id, last, frequency) = (id?, last?, frequency?);
            let monetary = spend.get(id).copied().unwrap_or_default();
            Some(CustomerMetrics {
                customer_id: CustomerId::from(id),
                recency: (reference_micros - last) / MICROS_PER_DAY,
                frequency,
                monetary,
            })
        })
        .filter(|m| m.monetary > Decimal::ZERO)
        .collect();
    metrics.sort_by(|a, b| a.customer_id.cmp(&b.customer_id));

    tracing::info!(
        customers = metrics.len(),
        dropped_non_positive = grouped.height() - metrics.len(),
        "aggregation complete"
    );

    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn at(date: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn line(invoice: &str, customer: &str, date: &str, quantity: i64, price: &str) -> CleanedLine {
        let unit_price = Decimal::from_str(price).unwrap();
        CleanedLine {
            invoice_id: invoice.to_string(),
            stock_code: "85123A".to_string(),
            description: None,
            quantity,
            invoice_date: at(date),
            unit_price,
            customer_id: CustomerId::from(customer),
            country: "United Kingdom".to_string(),
            line_total: Decimal::from(quantity) * unit_price,
        }
    }

    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2010, 12, 11)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_aggregate_customers() {
        let lines = vec![
            line("536365", "17850", "2010-12-01 08:26:00", 6, "2.55"),
            line("536365", "17850", "2010-12-01 08:26:00", 6, "3.39"),
            line("536366", "17850", "2010-12-09 08:28:00", 6, "1.85"),
            line("536367", "13047", "2010-11-30 23:59:00", 8, "2.75"),
        ];

        let metrics = aggregate_customers(&lines, reference()).unwrap();
        assert_eq!(metrics.len(), 2);

        assert_eq!(metrics[0].customer_id.as_str(), "13047");
        assert_eq!(metrics[0].recency, 10);
        assert_eq!(metrics[0].frequency, 1);
        assert_eq!(metrics[0].monetary, Decimal::from_str("22.00").unwrap());

        assert_eq!(metrics[1].customer_id.as_str(), "17850");
        assert_eq!(metrics[1].recency, 1);
        assert_eq!(metrics[1].frequency, 2);
        assert_eq!(metrics[1].monetary, Decimal::from_str("46.74").unwrap());
    }

    #[test]
    fn test_non_positive_spend_dropped() {
        let lines = vec![
            line("536370", "12583", "2010-12-01 08:45:00", -2, "5.00"),
            line("536371", "12583", "2010-12-02 08:45:00", 1, "10.00"),
            line("536372", "12662", "2010-12-03 08:45:00", -1, "4.00"),
            line("536373", "12680", "2010-12-04 08:45:00", 3, "1.00"),
        ];

        let metrics = aggregate_customers(&lines, reference()).unwrap();
        let ids: Vec<&str> = metrics.iter().map(|m| m.customer_id.as_str()).collect();
        assert_eq!(ids, vec!["12680"]);
        assert!(metrics.iter().all(|m| m.frequency >= 1 && m.monetary > Decimal::ZERO));
    }

    #[test]
    fn test_recency_counts_whole_days() {
        let lines = vec![
            line("536390", "12747", "2010-12-10 23:59:59", 1, "1.00"),
            line("536391", "12748", "2010-12-09 00:00:01", 1, "1.00"),
            line("536392", "12748", "2010-12-08 12:00:00", 1, "1.00"),
        ];

        let metrics = aggregate_customers(&lines, reference()).unwrap();
        assert_eq!(metrics[0].recency, 0);
        assert_eq!(metrics[1].recency, 1);
        assert_eq!(metrics[1].frequency, 2);
    }

    #[test]
    fn test_customers_ordered_by_id() {
        let lines = vec![
            line("536400", "17850", "2010-12-01 08:26:00", 1, "1.00"),
            line("536401", "9", "2010-12-01 08:26:00", 1, "1.00"),
            line("536402", "12583", "2010-12-01 08:26:00", 1, "1.00"),
            line("536403", "9", "2010-12-02 08:26:00", 1, "1.00"),
        ];

        let metrics = aggregate_customers(&lines, reference()).unwrap();
        let ids: Vec<&str> = metrics.iter().map(|m| m.customer_id.as_str()).collect();
        assert_eq!(ids, vec!["9", "12583", "17850"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate_customers(&[], reference()).unwrap().is_empty());
    }

    #[test]
    fn test_reference_date_must_follow_data() {
        let lines = vec![line("536380", "12700", "2010-12-11 00:00:00", 1, "1.00")];
        let err = aggregate_customers(&lines, reference()).unwrap_err();
        assert!(matches!(err, RfmError::Configuration(_)));
    }
}
