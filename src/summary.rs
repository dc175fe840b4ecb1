//! Per-segment statistics of a segmented population

use crate::segment::{Segment, SegmentedCustomer};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Count and metric means for one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSummary {
    pub segment: Segment,
    pub count: usize,
    /// Share of the whole population, 0.0 to 100.0
    pub percentage: f64,
    pub mean_recency: f64,
    pub mean_frequency: f64,
    pub mean_monetary: Decimal,
}

/// Summarise every non-empty segment, in segment declaration order.
pub fn summarize_segments(customers: &[SegmentedCustomer]) -> Vec<SegmentSummary> {
    let mut groups: BTreeMap<Segment, Vec<&SegmentedCustomer>> = BTreeMap::new();
    for customer in customers {
        groups.entry(customer.segment).or_default().push(customer);
    }

    let population = customers.len() as f64;
    groups
        .into_iter()
        .map(|(segment, members)| {
            let count = members.len();
            let n = count as f64;
            let recency_sum: i64 = members.iter().map(|c| c.scored.metrics.recency).sum();
            let frequency_sum: u64 = members.iter().map(|c| u64::from(c.scored.metrics.frequency)).sum();
            let monetary_sum: Decimal = members.iter().map(|c| c.scored.metrics.monetary).sum();

            SegmentSummary {
                segment,
                count,
                percentage: n / population * 100.0,
                mean_recency: recency_sum as f64 / n,
                mean_frequency: frequency_sum as f64 / n,
                mean_monetary: (monetary_sum / Decimal::from(count)).round_dp(2),
            }
        })
        .collect()
}

/// Print the segment summary table to stdout.
pub fn print_segment_statistics(summaries: &[SegmentSummary]) {
    let total: usize = summaries.iter().map(|s| s.count).sum();

    println!("\n=== Segment Statistics ===");
    println!("Total customers: {}", total);
    println!();
    println!("  Segment             | Count |     % | Recency | Frequency |   Monetary");
    println!("  --------------------|-------|-------|---------|-----------|-----------");
    for summary in summaries {
        println!(
            "  {:19} | {:5} | {:5.1} | {:7.1} | {:9.2} | {:>10}",
            summary.segment.as_str(),
            summary.count,
            summary.percentage,
            summary.mean_recency,
            summary.mean_frequency,
            summary.mean_monetary
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::CustomerMetrics;
    use crate::score::ScoredCustomer;
    use crate::transaction::CustomerId;

    fn customer(id: &str, segment: Segment, recency: i64, frequency: u32, monetary: i64) -> SegmentedCustomer {
        SegmentedCustomer {
            scored: ScoredCustomer {
                metrics: CustomerMetrics {
                    customer_id: CustomerId::from(id),
                    recency,
                    frequency,
                    monetary: Decimal::from(monetary),
                },
                recency_score: 1,
                frequency_score: 1,
                monetary_score: 1,
                composite_code: "11".to_string(),
            },
            segment,
        }
    }

    #[test]
    fn test_summarize_segments() {
        let customers = vec![
            customer("1", Segment::Champions, 2, 10, 900),
            customer("2", Segment::Hibernating, 300, 1, 20),
            customer("3", Segment::Champions, 4, 6, 100),
            customer("4", Segment::Hibernating, 200, 2, 30),
        ];

        let summaries = summarize_segments(&customers);
        assert_eq!(summaries.len(), 2);

        assert_eq!(summaries[0].segment, Segment::Hibernating);
        assert_eq!(summaries[0].count, 2);
        assert_eq!(summaries[0].mean_recency, 250.0);
        assert_eq!(summaries[0].mean_frequency, 1.5);
        assert_eq!(summaries[0].mean_monetary, Decimal::from(25));
        assert_eq!(summaries[0].percentage, 50.0);

        assert_eq!(summaries[1].segment, Segment::Champions);
        assert_eq!(summaries[1].mean_monetary, Decimal::from(500));
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize_segments(&[]).is_empty());
    }
}
