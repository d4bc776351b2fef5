//! Consumption pattern classification against whole-series statistics.
//!
//! Classification is two-pass: [`ConsumptionStats`] is computed over every
//! record first, then each record is labelled against those global
//! thresholds. A record's label therefore depends on the entire dataset.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use statrs::statistics::Statistics;

use crate::record::Record;

/// Default sunlight index above which low usage counts as wasted solar.
pub const DEFAULT_WASTE_SUNLIGHT_THRESHOLD: f64 = 0.6;

/// Usage class of a single record relative to the whole series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsumptionPattern {
    /// Above mean + one standard deviation.
    PeakUsage,
    /// Below mean − one standard deviation.
    LowUsage,
    /// Everything in between (inclusive).
    NormalUsage,
}

impl ConsumptionPattern {
    /// Stable column value.
    pub fn code(self) -> &'static str {
        match self {
            Self::PeakUsage => "PEAK_USAGE",
            Self::LowUsage => "LOW_USAGE",
            Self::NormalUsage => "NORMAL_USAGE",
        }
    }
}

impl fmt::Display for ConsumptionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ConsumptionPattern {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PEAK_USAGE" => Ok(Self::PeakUsage),
            "LOW_USAGE" => Ok(Self::LowUsage),
            "NORMAL_USAGE" => Ok(Self::NormalUsage),
            _ => Err(()),
        }
    }
}

/// Mean and sample standard deviation of consumption over all records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConsumptionStats {
    /// Mean consumption (kW).
    pub mean_kw: f64,
    /// Sample standard deviation (kW, n − 1 denominator).
    ///
    /// `NaN` for fewer than two records, in which case nothing is classified
    /// as peak or low.
    pub std_dev_kw: f64,
}

impl ConsumptionStats {
    /// First pass: computes statistics over every record's consumption.
    pub fn from_records(records: &[Record]) -> Self {
        let values: Vec<f64> = records.iter().map(|r| r.consumption_kw).collect();
        let stats = Self {
            mean_kw: values.iter().mean(),
            std_dev_kw: values.iter().std_dev(),
        };
        if !stats.std_dev_kw.is_finite() || stats.std_dev_kw == 0.0 {
            tracing::warn!(
                records = values.len(),
                "consumption has no spread; every record classifies as normal usage"
            );
        }
        stats
    }

    /// Upper threshold (mean + σ).
    pub fn peak_threshold_kw(&self) -> f64 {
        self.mean_kw + self.std_dev_kw
    }

    /// Lower threshold (mean − σ).
    pub fn low_threshold_kw(&self) -> f64 {
        self.mean_kw - self.std_dev_kw
    }

    /// Labels one consumption value against these thresholds.
    pub fn classify_value(&self, consumption_kw: f64) -> ConsumptionPattern {
        if consumption_kw > self.peak_threshold_kw() {
            ConsumptionPattern::PeakUsage
        } else if consumption_kw < self.low_threshold_kw() {
            ConsumptionPattern::LowUsage
        } else {
            ConsumptionPattern::NormalUsage
        }
    }
}

/// Labels every record, preserving order.
pub fn classify(records: &[Record]) -> Vec<ConsumptionPattern> {
    if records.is_empty() {
        return Vec::new();
    }
    let stats = ConsumptionStats::from_records(records);
    records
        .iter()
        .map(|r| stats.classify_value(r.consumption_kw))
        .collect()
}

/// Low usage while the sun is strong: energy that could have been used.
pub fn is_waste_period(pattern: ConsumptionPattern, sunlight_index: f64, threshold: f64) -> bool {
    pattern == ConsumptionPattern::LowUsage && sunlight_index > threshold
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn records(consumption: &[f64]) -> Vec<Record> {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        consumption
            .iter()
            .enumerate()
            .map(|(i, &c)| Record::new(start + chrono::Duration::hours(i as i64), 0.0, c))
            .collect()
    }

    #[test]
    fn stats_use_sample_standard_deviation() {
        // mean 2.5, sample variance = (2.25+0.25+0.25+2.25)/3 = 5/3
        let stats = ConsumptionStats::from_records(&records(&[1.0, 2.0, 3.0, 4.0]));
        assert!((stats.mean_kw - 2.5).abs() < 1e-12);
        assert!((stats.std_dev_kw - (5.0_f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn labels_peak_low_and_normal() {
        let patterns = classify(&records(&[2.0, 2.0, 2.0, 2.0, 5.0, 0.0, 2.0]));
        assert_eq!(patterns[4], ConsumptionPattern::PeakUsage);
        assert_eq!(patterns[5], ConsumptionPattern::LowUsage);
        assert_eq!(patterns[0], ConsumptionPattern::NormalUsage);
        assert_eq!(patterns.len(), 7);
    }

    #[test]
    fn label_depends_on_whole_series() {
        // 2.0 is peak among small values, normal once a larger value appears.
        let small = classify(&records(&[1.0, 1.0, 1.0, 2.0]));
        let wide = classify(&records(&[1.0, 1.0, 1.0, 2.0, 9.0]));
        assert_eq!(small[3], ConsumptionPattern::PeakUsage);
        assert_eq!(wide[3], ConsumptionPattern::NormalUsage);
    }

    #[test]
    fn single_record_is_normal() {
        assert_eq!(
            classify(&records(&[3.0])),
            vec![ConsumptionPattern::NormalUsage]
        );
    }

    #[test]
    fn constant_series_is_all_normal() {
        let patterns = classify(&records(&[2.0, 2.0, 2.0]));
        assert!(patterns.iter().all(|p| *p == ConsumptionPattern::NormalUsage));
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(classify(&[]).is_empty());
    }

    #[test]
    fn waste_requires_low_usage_and_strong_sun() {
        let t = DEFAULT_WASTE_SUNLIGHT_THRESHOLD;
        assert!(is_waste_period(ConsumptionPattern::LowUsage, 0.61, t));
        assert!(!is_waste_period(ConsumptionPattern::LowUsage, 0.6, t));
        assert!(!is_waste_period(ConsumptionPattern::NormalUsage, 0.9, t));
        assert!(!is_waste_period(ConsumptionPattern::PeakUsage, 0.9, t));
    }

    #[test]
    fn pattern_codes_parse_back() {
        for p in [
            ConsumptionPattern::PeakUsage,
            ConsumptionPattern::LowUsage,
            ConsumptionPattern::NormalUsage,
        ] {
            assert_eq!(p.code().parse::<ConsumptionPattern>(), Ok(p));
        }
        assert!("HIGH".parse::<ConsumptionPattern>().is_err());
    }
}
