//! Run configuration: reference date, bucket count, cleaning options and
//! the segmentation rule table

use crate::clean::CleanOptions;
use crate::error::{PipelineResult, RfmError};
use crate::segment::{SegmentRule, SegmentTable, STANDARD_RULES};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Inclusive calendar-date range of invoices taken into the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AnalysisWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AnalysisWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Configuration for one pipeline run.
///
/// | field | default | valid range |
/// |---|---|---|
/// | `reference_date` | 2010-12-11 | strictly after every analysed invoice |
/// | `buckets` | 5 | 1..=9, and equal to the rule table's grid |
/// | `cancellation_marker` | `'C'` | any character |
/// | `window` | none | `start <= end < reference_date` |
/// | `segments` | standard ten-segment table | total, non-overlapping |
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RfmConfig {
    /// Recency is measured from midnight at the start of this date
    pub reference_date: NaiveDate,
    pub buckets: u8,
    pub cancellation_marker: char,
    pub window: Option<AnalysisWindow>,
    pub segments: Option<Vec<SegmentRule>>,
}

impl Default for RfmConfig {
    fn default() -> Self {
        RfmConfig {
            reference_date: NaiveDate::from_ymd_opt(2010, 12, 11).unwrap_or_default(),
            buckets: 5,
            cancellation_marker: 'C',
            window: None,
            segments: None,
        }
    }
}

impl RfmConfig {
    /// Load a TOML configuration file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn reference_datetime(&self) -> NaiveDateTime {
        self.reference_date.and_time(NaiveTime::default())
    }

    pub fn clean_options(&self) -> CleanOptions {
        CleanOptions {
            cancellation_marker: self.cancellation_marker,
            window: self.window,
        }
    }

    /// Check the configuration and build the segment table it describes.
    pub fn validate(&self) -> PipelineResult<SegmentTable> {
        if !(1..=9).contains(&self.buckets) {
            return Err(RfmError::config(format!(
                "buckets must be between 1 and 9, got {}",
                self.buckets
            )));
        }

        if let Some(window) = &self.window {
            if window.start > window.end {
                return Err(RfmError::config(format!(
                    "analysis window starts ({}) after it ends ({})",
                    window.start, window.end
                )));
            }
            if self.reference_date <= window.end {
                return Err(RfmError::config(format!(
                    "reference date {} must be after the analysis window end {}",
                    self.reference_date, window.end
                )));
            }
        }

        let rules = self.segments.as_deref().unwrap_or(&STANDARD_RULES);
        SegmentTable::new(rules, self.buckets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Segment;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = RfmConfig::default();
        let table = config.validate().unwrap();

        assert_eq!(table.buckets(), 5);
        assert_eq!(config.reference_date, NaiveDate::from_ymd_opt(2010, 12, 11).unwrap());
        assert_eq!(config.reference_datetime().to_string(), "2010-12-11 00:00:00");
    }

    #[test]
    fn test_from_toml_partial() {
        let config = RfmConfig::from_toml(
            r#"
            reference_date = "2011-12-10"
            cancellation_marker = "R"

            [window]
            start = "2010-12-01"
            end = "2011-12-09"
            "#,
        )
        .unwrap();

        assert_eq!(config.reference_date, NaiveDate::from_ymd_opt(2011, 12, 10).unwrap());
        assert_eq!(config.buckets, 5);
        assert_eq!(config.cancellation_marker, 'R');
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_custom_segments() {
        let config = RfmConfig::from_toml(
            r#"
            buckets = 2

            [[segments]]
            recency = [1, 1]
            frequency = [1, 2]
            segment = "hibernating"

            [[segments]]
            recency = [2, 2]
            frequency = [1, 2]
            segment = "champions"
            "#,
        )
        .unwrap();

        let table = config.validate().unwrap();
        assert_eq!(table.classify(2, 1).unwrap(), Segment::Champions);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let mut config = RfmConfig {
            buckets: 0,
            ..RfmConfig::default()
        };
        assert!(config.validate().is_err());

        config.buckets = 4;
        assert!(config.validate().is_err(), "standard table needs a 5x5 grid");

        config.buckets = 5;
        config.window = Some(AnalysisWindow {
            start: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2010, 12, 31).unwrap(),
        });
        assert!(config.validate().is_err(), "window ends after the reference date");

        assert!(RfmConfig::from_toml("unknown_key = 1").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "reference_date = \"2010-01-01\"").unwrap();

        let config = RfmConfig::load(file.path()).unwrap();
        assert_eq!(config.reference_date, NaiveDate::from_ymd_opt(2010, 1, 1).unwrap());

        assert!(RfmConfig::load("/nonexistent/rfm.toml").is_err());
    }
}
