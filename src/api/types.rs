//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::dispatch::{BatteryParams, ScenarioAdjustment, WhatIf};
use crate::report::{BaseTotals, DecisionSummary, PatternSummary};

/// Overview of the loaded record set.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    /// Totals before any scenario.
    pub base: BaseTotals,
    /// Usage-class counts and waste hours.
    pub patterns: PatternSummary,
    /// Recommendation counts.
    pub decisions: DecisionSummary,
    /// Slider values applied when `/simulate` omits a parameter.
    pub defaults: WhatIf,
}

/// Optional row range for the records endpoint (0-based, inclusive).
#[derive(Debug, Deserialize)]
pub struct RecordQuery {
    pub from: Option<usize>,
    pub to: Option<usize>,
}

/// Slider overrides for one what-if evaluation.
///
/// Omitted fields keep the server's configured defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulateQuery {
    pub capacity_kwh: Option<f64>,
    pub min_soc_pct: Option<f64>,
    pub initial_charge_pct: Option<f64>,
    pub panel_increase_pct: Option<f64>,
    pub load_reduction_pct: Option<f64>,
}

impl SimulateQuery {
    /// Overlays the supplied parameters onto `defaults`.
    pub fn apply(&self, defaults: WhatIf) -> WhatIf {
        let b = defaults.battery;
        let s = defaults.scenario;
        WhatIf {
            battery: BatteryParams {
                capacity_kwh: self.capacity_kwh.unwrap_or(b.capacity_kwh),
                min_soc_pct: self.min_soc_pct.unwrap_or(b.min_soc_pct),
                initial_charge_pct: self.initial_charge_pct.unwrap_or(b.initial_charge_pct),
            },
            scenario: ScenarioAdjustment {
                panel_increase_pct: self.panel_increase_pct.unwrap_or(s.panel_increase_pct),
                load_reduction_pct: self.load_reduction_pct.unwrap_or(s.load_reduction_pct),
            },
        }
    }
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_keeps_defaults() {
        let defaults = WhatIf::default();
        assert_eq!(SimulateQuery::default().apply(defaults), defaults);
    }

    #[test]
    fn supplied_fields_override_defaults() {
        let q = SimulateQuery {
            capacity_kwh: Some(120.0),
            load_reduction_pct: Some(10.0),
            ..SimulateQuery::default()
        };
        let w = q.apply(WhatIf::default());
        assert_eq!(w.battery.capacity_kwh, 120.0);
        assert_eq!(w.battery.min_soc_pct, 20.0);
        assert_eq!(w.scenario.load_reduction_pct, 10.0);
        assert_eq!(w.scenario.panel_increase_pct, 0.0);
    }
}
