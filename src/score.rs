//! Quantile scoring of customer metrics
//!
//! Each metric is cut into `buckets` equal-frequency bands computed over the
//! current population. Bucket edges are the `i / buckets` quantiles of the
//! metric (linear interpolation between order statistics); a value lands in
//! the first band whose upper edge it does not exceed, and the population
//! minimum belongs to band 1.
//!
//! When repeated values collapse two or more edges, or pile up on one edge
//! so that a band ends up empty or bands differ in size by more than one
//! customer, the metric is re-cut on its stable ("first") ranking instead,
//! which is the transform always applied to frequency. A single-customer
//! population has no spread even in rank space and scores the middle band.

use crate::aggregate::CustomerMetrics;
use crate::error::{PipelineResult, RfmError};
use rust_decimal::prelude::ToPrimitive;

/// Customer metrics together with their quantile scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCustomer {
    pub metrics: CustomerMetrics,
    /// Inverted recency band; the most recent buyers score highest
    pub recency_score: u8,
    pub frequency_score: u8,
    pub monetary_score: u8,
    /// Recency score followed by frequency score, e.g. `"53"`
    pub composite_code: String,
}

/// Compute the `i / buckets` quantiles (i = 0..=buckets) of `values`.
pub fn quantile_edges(values: &[f64], buckets: u8) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    if sorted.is_empty() {
        return Vec::new();
    }

    let last = (sorted.len() - 1) as f64;
    (0..=buckets)
        .map(|i| {
            let position = last * f64::from(i) / f64::from(buckets);
            let lo = position.floor() as usize;
            let hi = position.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (position - lo as f64)
        })
        .collect()
}

/// Cut `values` into `buckets` quantile bands labelled `1..=buckets`.
///
/// Returns `None` when the edges are not strictly increasing, i.e. the
/// population has too few distinct values for the requested bands.
pub fn qcut(values: &[f64], buckets: u8) -> Option<Vec<u8>> {
    if values.is_empty() || buckets == 0 {
        return None;
    }

    let edges = quantile_edges(values, buckets);
    if edges.windows(2).any(|pair| pair[0] >= pair[1]) {
        return None;
    }

    let bands = values
        .iter()
        .map(|&value| {
            edges[1..]
                .iter()
                .position(|&edge| value <= edge)
                .map_or(buckets, |idx| idx as u8 + 1)
        })
        .collect();

    Some(bands)
}

/// Stable 1-based ranking: equal values rank in their original order.
pub fn rank_first(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    for (rank, idx) in order.into_iter().enumerate() {
        ranks[idx] = (rank + 1) as f64;
    }
    ranks
}

/// Quantile bands with the rank-based fallback for degenerate populations.
fn banded(metric: &str, values: &[f64], buckets: u8) -> Vec<u8> {
    match qcut(values, buckets) {
        Some(bands) if is_balanced(&bands, buckets) => return bands,
        Some(_) => tracing::debug!(metric, "ties left bands unbalanced, re-cutting on stable ranks"),
        None => tracing::debug!(metric, "quantile edges collapsed, re-cutting on stable ranks"),
    }

    qcut(&rank_first(values), buckets).unwrap_or_else(|| {
        tracing::debug!(metric, "single-value population, using the middle band");
        vec![buckets.div_ceil(2); values.len()]
    })
}

/// True when no band is empty and band sizes differ by at most one.
fn is_balanced(bands: &[u8], buckets: u8) -> bool {
    let mut sizes = vec![0usize; usize::from(buckets)];
    for &band in bands {
        sizes[usize::from(band - 1)] += 1;
    }
    match (sizes.iter().min(), sizes.iter().max()) {
        (Some(&min), Some(&max)) => min > 0 && max - min <= 1,
        _ => false,
    }
}

/// Score every customer of the population on `buckets` quantile bands.
///
/// Fails when the population is empty, since no quantile can be computed.
pub fn score_customers(
    metrics: Vec<CustomerMetrics>,
    buckets: u8,
) -> PipelineResult<Vec<ScoredCustomer>> {
    if metrics.is_empty() {
        return Err(RfmError::config(
            "cannot compute quantile scores over an empty customer population",
        ));
    }
    if !(1..=9).contains(&buckets) {
        return Err(RfmError::config(format!(
            "bucket count must be between 1 and 9, got {}",
            buckets
        )));
    }

    let recency: Vec<f64> = metrics.iter().map(|m| m.recency as f64).collect();
    let frequency: Vec<f64> = metrics.iter().map(|m| f64::from(m.frequency)).collect();
    let monetary: Vec<f64> = metrics
        .iter()
        .map(|m| m.monetary.to_f64().unwrap_or(f64::MAX))
        .collect();

    let recency_bands = banded("recency", &recency, buckets);
    let frequency_bands = qcut(&rank_first(&frequency), buckets)
        .unwrap_or_else(|| vec![buckets.div_ceil(2); frequency.len()]);
    let monetary_bands = banded("monetary", &monetary, buckets);

    let scored: Vec<ScoredCustomer> = metrics
        .into_iter()
        .enumerate()
        .map(|(i, metrics)| {
            let recency_score = buckets + 1 - recency_bands[i];
            let frequency_score = frequency_bands[i];
            ScoredCustomer {
                metrics,
                recency_score,
                frequency_score,
                monetary_score: monetary_bands[i],
                composite_code: format!("{}{}", recency_score, frequency_score),
            }
        })
        .collect();

    tracing::info!(customers = scored.len(), buckets, "scoring complete");
    Ok(scored)
}
