//! Per-record operational recommendations.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::classify::ConsumptionPattern;

/// One of the five recommendations the advisor can give.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionLabel {
    /// Surplus during a waste period: move flexible loads here.
    ShiftLoad,
    /// Surplus otherwise: store it or export it.
    StoreOrExport,
    /// Deficit at peak usage: shed loads or import.
    ReduceOrImport,
    /// Deficit outside peak usage.
    Monitor,
    /// Forecast matches consumption.
    Balanced,
}

impl DecisionLabel {
    /// Every label, in table order.
    pub const ALL: [Self; 5] = [
        Self::ShiftLoad,
        Self::StoreOrExport,
        Self::ReduceOrImport,
        Self::Monitor,
        Self::Balanced,
    ];

    /// Stable column value.
    pub fn code(self) -> &'static str {
        match self {
            Self::ShiftLoad => "SHIFT_LOAD",
            Self::StoreOrExport => "STORE_OR_EXPORT",
            Self::ReduceOrImport => "REDUCE_OR_IMPORT",
            Self::Monitor => "MONITOR",
            Self::Balanced => "BALANCED",
        }
    }

    /// Recommendation shown to the operator.
    pub fn message(self) -> &'static str {
        match self {
            Self::ShiftLoad => "SURPLUS: Shift flexible loads (pumps, EV charging) to this time",
            Self::StoreOrExport => "SURPLUS: Store energy or export to grid",
            Self::ReduceOrImport => "DEFICIT: Reduce non-critical loads or import from grid",
            Self::Monitor => "DEFICIT: Monitor usage closely",
            Self::Balanced => "BALANCED: No action needed",
        }
    }
}

impl fmt::Display for DecisionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Accepts either the column code or the full message.
impl FromStr for DecisionLabel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.code() == s || d.message() == s)
            .ok_or(())
    }
}

/// Maps one record's forecast and usage to a recommendation.
///
/// Surplus and deficit are strict comparisons; equal values are balanced.
pub fn decide(
    predicted_kw: f64,
    consumed_kw: f64,
    pattern: ConsumptionPattern,
    waste_period: bool,
) -> DecisionLabel {
    if predicted_kw > consumed_kw {
        if waste_period {
            DecisionLabel::ShiftLoad
        } else {
            DecisionLabel::StoreOrExport
        }
    } else if predicted_kw < consumed_kw {
        if pattern == ConsumptionPattern::PeakUsage {
            DecisionLabel::ReduceOrImport
        } else {
            DecisionLabel::Monitor
        }
    } else {
        DecisionLabel::Balanced
    }
}
