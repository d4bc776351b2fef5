//! What-if scenario parameters and their evaluation.
//!
//! Every parameter change in a presentation layer is one call to
//! [`WhatIf::evaluate`] against the same base totals; nothing is carried
//! between calls.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TwinError};

use super::simulator::simulate;
use super::types::{BatteryConfig, DispatchResult, EnergyTotals};

/// Upper bound of the load reduction slider (%).
pub const MAX_LOAD_REDUCTION_PCT: f64 = 50.0;

/// Most points a single sweep may evaluate.
pub const MAX_SWEEP_POINTS: usize = 10_000;

/// Independent percentage multipliers applied to base totals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioAdjustment {
    /// Extra panel capacity (%, ≥ 0).
    pub panel_increase_pct: f64,
    /// Consumption cut (%, in [0, 50]).
    pub load_reduction_pct: f64,
}

impl ScenarioAdjustment {
    /// Checks both sliders against their declared ranges.
    ///
    /// # Errors
    ///
    /// Returns [`TwinError::InvalidConfiguration`] naming the offending slider.
    pub fn validate(&self) -> Result<()> {
        if !(self.panel_increase_pct.is_finite() && self.panel_increase_pct >= 0.0) {
            return Err(TwinError::invalid(
                "panelIncreasePct",
                self.panel_increase_pct,
                "a finite value >= 0",
            ));
        }
        if !(0.0..=MAX_LOAD_REDUCTION_PCT).contains(&self.load_reduction_pct) {
            return Err(TwinError::invalid(
                "loadReductionPct",
                self.load_reduction_pct,
                "a value in [0, 50]",
            ));
        }
        Ok(())
    }

    /// Scales base totals: solar up by the panel increase, load down by the
    /// reduction.
    ///
    /// # Errors
    ///
    /// Returns [`TwinError::InvalidConfiguration`] for out-of-range sliders or
    /// invalid base totals.
    pub fn apply(&self, base: &EnergyTotals) -> Result<EnergyTotals> {
        self.validate()?;
        base.validate()?;
        Ok(EnergyTotals {
            solar_generated_kwh: base.solar_generated_kwh * (1.0 + self.panel_increase_pct / 100.0),
            consumed_kwh: base.consumed_kwh * (1.0 - self.load_reduction_pct / 100.0),
        })
    }
}

/// Battery parameters as entered on sliders (percentages).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryParams {
    /// Total capacity (kWh).
    pub capacity_kwh: f64,
    /// Reserve (% of capacity).
    pub min_soc_pct: f64,
    /// Starting charge (% of capacity).
    pub initial_charge_pct: f64,
}

impl Default for BatteryParams {
    fn default() -> Self {
        Self {
            capacity_kwh: 50.0,
            min_soc_pct: 20.0,
            initial_charge_pct: 50.0,
        }
    }
}

impl BatteryParams {
    /// Normalises the percentages into a validated [`BatteryConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`TwinError::InvalidConfiguration`] naming the offending slider.
    pub fn to_config(&self) -> Result<BatteryConfig> {
        BatteryConfig::from_percentages(self.capacity_kwh, self.min_soc_pct, self.initial_charge_pct)
    }
}

/// The full parameter bundle behind one what-if evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WhatIf {
    /// Battery sliders.
    pub battery: BatteryParams,
    /// Scenario sliders.
    pub scenario: ScenarioAdjustment,
}

/// Adjusted totals and the dispatch computed from them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WhatIfOutcome {
    /// Totals after scenario multipliers.
    pub totals: EnergyTotals,
    /// Battery configuration in fractions.
    pub battery: BatteryConfig,
    /// Dispatch result.
    pub dispatch: DispatchResult,
}

impl WhatIf {
    /// Adjusts `base` and runs the dispatch simulator.
    ///
    /// Every parameter is validated before any computation.
    ///
    /// # Errors
    ///
    /// Returns [`TwinError::InvalidConfiguration`] naming the first offending
    /// parameter.
    pub fn evaluate(&self, base: &EnergyTotals) -> Result<WhatIfOutcome> {
        let battery = self.battery.to_config()?;
        let totals = self.scenario.apply(base)?;
        let dispatch = simulate(&totals, &battery)?;
        Ok(WhatIfOutcome {
            totals,
            battery,
            dispatch,
        })
    }

    /// Evaluates panel increases `0, step, 2·step, …` up to `max_pct`,
    /// keeping every other parameter fixed.
    ///
    /// # Errors
    ///
    /// Returns [`TwinError::InvalidConfiguration`] for a non-positive step, a
    /// negative maximum, more than [`MAX_SWEEP_POINTS`] points, or the first
    /// failing evaluation.
    pub fn sweep_panel_increase(
        &self,
        base: &EnergyTotals,
        max_pct: f64,
        step_pct: f64,
    ) -> Result<Vec<SweepPoint>> {
        if !(step_pct.is_finite() && step_pct > 0.0) {
            return Err(TwinError::invalid("stepPct", step_pct, "a finite value > 0"));
        }
        if !(max_pct.is_finite() && max_pct >= 0.0) {
            return Err(TwinError::invalid("maxPanelIncreasePct", max_pct, "a finite value >= 0"));
        }
        let steps = (max_pct / step_pct + 1e-9).floor();
        if steps >= MAX_SWEEP_POINTS as f64 {
            return Err(TwinError::invalid(
                "stepPct",
                step_pct,
                "a step giving at most 10000 sweep points",
            ));
        }
        (0..=steps as usize)
            .map(|i| {
                let panel_increase_pct = (i as f64 * step_pct).min(max_pct);
                let what_if = Self {
                    scenario: ScenarioAdjustment {
                        panel_increase_pct,
                        ..self.scenario
                    },
                    ..*self
                };
                Ok(SweepPoint {
                    panel_increase_pct,
                    outcome: what_if.evaluate(base)?,
                })
            })
            .collect()
    }
}

/// One row of a parameter sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepPoint {
    /// Panel increase evaluated (%).
    pub panel_increase_pct: f64,
    /// Result at that increase.
    pub outcome: WhatIfOutcome,
}
