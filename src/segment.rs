//! Segment classification: maps (recency score, frequency score) pairs to
//! named marketing segments through a verified lookup table.

use crate::error::{PipelineResult, RfmError};
use crate::score::ScoredCustomer;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Named customer-value category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Hibernating,
    AtRisk,
    CantLose,
    AboutToSleep,
    NeedAttention,
    LoyalCustomers,
    Promising,
    NewCustomers,
    PotentialLoyalists,
    Champions,
}

impl Segment {
    pub const ALL: [Segment; 10] = [
        Segment::Hibernating,
        Segment::AtRisk,
        Segment::CantLose,
        Segment::AboutToSleep,
        Segment::NeedAttention,
        Segment::LoyalCustomers,
        Segment::Promising,
        Segment::NewCustomers,
        Segment::PotentialLoyalists,
        Segment::Champions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Hibernating => "hibernating",
            Segment::AtRisk => "at_risk",
            Segment::CantLose => "cant_lose",
            Segment::AboutToSleep => "about_to_sleep",
            Segment::NeedAttention => "need_attention",
            Segment::LoyalCustomers => "loyal_customers",
            Segment::Promising => "promising",
            Segment::NewCustomers => "new_customers",
            Segment::PotentialLoyalists => "potential_loyalists",
            Segment::Champions => "champions",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown segment name: {0}")]
pub struct ParseSegmentError(String);

impl FromStr for Segment {
    type Err = ParseSegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Segment::ALL
            .into_iter()
            .find(|segment| segment.as_str() == name)
            .ok_or_else(|| ParseSegmentError(name.to_string()))
    }
}

/// One rule of the segmentation table: inclusive score ranges on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SegmentRule {
    /// Inclusive `[low, high]` recency score range
    pub recency: (u8, u8),
    /// Inclusive `[low, high]` frequency score range
    pub frequency: (u8, u8),
    pub segment: Segment,
}

impl SegmentRule {
    pub const fn new(recency: (u8, u8), frequency: (u8, u8), segment: Segment) -> Self {
        SegmentRule {
            recency,
            frequency,
            segment,
        }
    }

    pub fn matches(&self, recency_score: u8, frequency_score: u8) -> bool {
        (self.recency.0..=self.recency.1).contains(&recency_score)
            && (self.frequency.0..=self.frequency.1).contains(&frequency_score)
    }
}

/// Canonical RFM rule set over the 5x5 recency/frequency grid.
pub const STANDARD_RULES: [SegmentRule; 10] = [
    SegmentRule::new((1, 2), (1, 2), Segment::Hibernating),
    SegmentRule::new((1, 2), (3, 4), Segment::AtRisk),
    SegmentRule::new((1, 2), (5, 5), Segment::CantLose),
    SegmentRule::new((3, 3), (1, 2), Segment::AboutToSleep),
    SegmentRule::new((3, 3), (3, 3), Segment::NeedAttention),
    SegmentRule::new((3, 4), (4, 5), Segment::LoyalCustomers),
    SegmentRule::new((4, 4), (1, 1), Segment::Promising),
    SegmentRule::new((5, 5), (1, 1), Segment::NewCustomers),
    SegmentRule::new((4, 5), (2, 3), Segment::PotentialLoyalists),
    SegmentRule::new((5, 5), (4, 5), Segment::Champions),
];

/// Dense lookup table over the `buckets x buckets` score grid.
///
/// Construction fails unless every cell is claimed by exactly one rule, so a
/// built table is always total and non-overlapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentTable {
    buckets: u8,
    cells: Vec<Segment>,
}

impl SegmentTable {
    pub fn new(rules: &[SegmentRule], buckets: u8) -> PipelineResult<Self> {
        if buckets == 0 {
            return Err(RfmError::config("segment table needs at least one bucket"));
        }

        let size = buckets as usize;
        let mut cells: Vec<Option<Segment>> = vec![None; size * size];

        for rule in rules {
            let (r_lo, r_hi) = rule.recency;
            let (f_lo, f_hi) = rule.frequency;
            if r_lo == 0 || f_lo == 0 || r_lo > r_hi || f_lo > f_hi || r_hi > buckets || f_hi > buckets {
                return Err(RfmError::config(format!(
                    "segment rule {} has ranges {:?}/{:?} outside the 1..={} grid",
                    rule.segment, rule.recency, rule.frequency, buckets
                )));
            }

            for r in r_lo..=r_hi {
                for f in f_lo..=f_hi {
                    let cell = &mut cells[Self::index(size, r, f)];
                    if let Some(existing) = *cell {
                        return Err(RfmError::config(format!(
                            "score pair ({}, {}) matched by both {} and {}",
                            r, f, existing, rule.segment
                        )));
                    }
                    *cell = Some(rule.segment);
                }
            }
        }

        let mut resolved = Vec::with_capacity(cells.len());
        for (idx, cell) in cells.into_iter().enumerate() {
            match cell {
                Some(segment) => resolved.push(segment),
                None => {
                    return Err(RfmError::config(format!(
                        "score pair ({}, {}) is not covered by any segment rule",
                        idx / size + 1,
                        idx % size + 1
                    )))
                }
            }
        }

        Ok(SegmentTable {
            buckets,
            cells: resolved,
        })
    }

    /// The canonical table built from [`STANDARD_RULES`].
    pub fn standard() -> PipelineResult<Self> {
        Self::new(&STANDARD_RULES, 5)
    }

    pub fn buckets(&self) -> u8 {
        self.buckets
    }

    pub fn classify(&self, recency_score: u8, frequency_score: u8) -> PipelineResult<Segment> {
        let in_grid = |score: u8| (1..=self.buckets).contains(&score);
        if !in_grid(recency_score) || !in_grid(frequency_score) {
            return Err(RfmError::UnmappedSegment {
                code: format!("{}{}", recency_score, frequency_score),
            });
        }

        Ok(self.cells[Self::index(self.buckets as usize, recency_score, frequency_score)])
    }

    /// Classify a two-digit composite code such as `"53"`.
    pub fn classify_code(&self, code: &str) -> PipelineResult<Segment> {
        let unmapped = || RfmError::UnmappedSegment {
            code: code.to_string(),
        };

        let digits: Vec<u8> = code
            .chars()
            .map(|c| c.to_digit(10).map(|d| d as u8))
            .collect::<Option<_>>()
            .ok_or_else(unmapped)?;

        match digits.as_slice() {
            [r, f] => self.classify(*r, *f),
            _ => Err(unmapped()),
        }
    }

    fn index(size: usize, recency_score: u8, frequency_score: u8) -> usize {
        (recency_score as usize - 1) * size + (frequency_score as usize - 1)
    }
}

/// A fully classified customer, the terminal row of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentedCustomer {
    pub scored: ScoredCustomer,
    pub segment: Segment,
}

/// Attach a segment to every scored customer.
///
/// Fails on the first customer whose composite code has no rule; no partial
/// table is returned.
pub fn segment_customers(
    scored: Vec<ScoredCustomer>,
    table: &SegmentTable,
) -> PipelineResult<Vec<SegmentedCustomer>> {
    let segmented = scored
        .into_iter()
        .map(|customer| {
            let segment = table.classify_code(&customer.composite_code)?;
            Ok(SegmentedCustomer {
                scored: customer,
                segment,
            })
        })
        .collect::<PipelineResult<Vec<_>>>()?;

    tracing::info!(customers = segmented.len(), "segmentation complete");
    Ok(segmented)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_rules_partition_the_grid() {
        for r in 1..=5u8 {
            for f in 1..=5u8 {
                let matching = STANDARD_RULES.iter().filter(|rule| rule.matches(r, f)).count();
                assert_eq!(matching, 1, "pair ({}, {}) matched {} rules", r, f, matching);
            }
        }

        let table = SegmentTable::standard().unwrap();
        let mut seen: Vec<Segment> = Vec::new();
        for r in 1..=5u8 {
            for f in 1..=5u8 {
                let segment = table.classify(r, f).unwrap();
                if !seen.contains(&segment) {
                    seen.push(segment);
                }
            }
        }
        assert_eq!(seen.len(), Segment::ALL.len());
    }

    #[test]
    fn test_classify_known_codes() {
        let table = SegmentTable::standard().unwrap();

        assert_eq!(table.classify_code("11").unwrap(), Segment::Hibernating);
        assert_eq!(table.classify_code("24").unwrap(), Segment::AtRisk);
        assert_eq!(table.classify_code("15").unwrap(), Segment::CantLose);
        assert_eq!(table.classify_code("32").unwrap(), Segment::AboutToSleep);
        assert_eq!(table.classify_code("33").unwrap(), Segment::NeedAttention);
        assert_eq!(table.classify_code("44").unwrap(), Segment::LoyalCustomers);
        assert_eq!(table.classify_code("41").unwrap(), Segment::Promising);
        assert_eq!(table.classify_code("51").unwrap(), Segment::NewCustomers);
        assert_eq!(table.classify_code("43").unwrap(), Segment::PotentialLoyalists);
        assert_eq!(table.classify_code("55").unwrap(), Segment::Champions);
    }

    #[test]
    fn test_unmapped_codes() {
        let table = SegmentTable::standard().unwrap();

        for code in ["06", "61", "5", "123", "x1", ""] {
            assert_eq!(
                table.classify_code(code),
                Err(RfmError::UnmappedSegment {
                    code: code.to_string()
                })
            );
        }
    }

    #[test]
    fn test_overlapping_rules_rejected() {
        let mut rules = STANDARD_RULES.to_vec();
        rules.push(SegmentRule::new((5, 5), (5, 5), Segment::Promising));

        let err = SegmentTable::new(&rules, 5).unwrap_err();
        assert!(matches!(err, RfmError::Configuration(msg) if msg.contains("(5, 5)")));
    }

    #[test]
    fn test_gaps_rejected() {
        let rules: Vec<SegmentRule> = STANDARD_RULES
            .iter()
            .copied()
            .filter(|rule| rule.segment != Segment::NeedAttention)
            .collect();

        let err = SegmentTable::new(&rules, 5).unwrap_err();
        assert!(matches!(err, RfmError::Configuration(msg) if msg.contains("(3, 3)")));
    }

    #[test]
    fn test_rules_outside_grid_rejected() {
        assert!(SegmentTable::new(&STANDARD_RULES, 4).is_err());

        let rules = [SegmentRule::new((0, 1), (1, 1), Segment::Hibernating)];
        assert!(SegmentTable::new(&rules, 1).is_err());
    }

    #[test]
    fn test_custom_small_grid() {
        let rules = [
            SegmentRule::new((1, 1), (1, 2), Segment::Hibernating),
            SegmentRule::new((2, 2), (1, 1), Segment::NewCustomers),
            SegmentRule::new((2, 2), (2, 2), Segment::Champions),
        ];
        let table = SegmentTable::new(&rules, 2).unwrap();

        assert_eq!(table.classify(2, 2).unwrap(), Segment::Champions);
        assert_eq!(table.classify(1, 2).unwrap(), Segment::Hibernating);
        assert!(table.classify(3, 1).is_err());
    }

    #[test]
    fn test_segment_names_round_trip_through_from_str() {
        for segment in Segment::ALL {
            assert_eq!(segment.as_str().parse::<Segment>().unwrap(), segment);
        }
        assert!("vip".parse::<Segment>().is_err());
    }
}
