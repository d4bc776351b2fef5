//! Slider state and per-change what-if evaluation.

use crate::config::TwinConfig;
use crate::dispatch::{EnergyTotals, WhatIf, WhatIfOutcome};
use crate::error::Result;
use crate::record::Record;
use crate::report::{BaseTotals, DispatchReport, RecordRow};

/// One adjustable parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slider {
    Capacity,
    MinSoc,
    InitialCharge,
    PanelIncrease,
    LoadReduction,
}

impl Slider {
    /// Every slider, in display order.
    pub const ALL: [Self; 5] = [
        Self::Capacity,
        Self::MinSoc,
        Self::InitialCharge,
        Self::PanelIncrease,
        Self::LoadReduction,
    ];

    /// Display label with unit.
    pub fn label(self) -> &'static str {
        match self {
            Self::Capacity => "Battery capacity (kWh)",
            Self::MinSoc => "Minimum charge (%)",
            Self::InitialCharge => "Initial charge (%)",
            Self::PanelIncrease => "Panel increase (%)",
            Self::LoadReduction => "Load reduction (%)",
        }
    }

    /// Inclusive (min, max) range.
    pub fn range(self) -> (f64, f64) {
        match self {
            Self::Capacity => (10.0, 200.0),
            Self::MinSoc => (0.0, 90.0),
            Self::InitialCharge => (0.0, 100.0),
            Self::PanelIncrease => (0.0, 200.0),
            Self::LoadReduction => (0.0, 50.0),
        }
    }

    /// Increment per key press.
    pub fn step(self) -> f64 {
        match self {
            Self::Capacity | Self::MinSoc | Self::InitialCharge | Self::LoadReduction => 5.0,
            Self::PanelIncrease => 10.0,
        }
    }

    /// Current value in `what_if`.
    pub fn get(self, what_if: &WhatIf) -> f64 {
        match self {
            Self::Capacity => what_if.battery.capacity_kwh,
            Self::MinSoc => what_if.battery.min_soc_pct,
            Self::InitialCharge => what_if.battery.initial_charge_pct,
            Self::PanelIncrease => what_if.scenario.panel_increase_pct,
            Self::LoadReduction => what_if.scenario.load_reduction_pct,
        }
    }

    fn set(self, what_if: &mut WhatIf, value: f64) {
        match self {
            Self::Capacity => what_if.battery.capacity_kwh = value,
            Self::MinSoc => what_if.battery.min_soc_pct = value,
            Self::InitialCharge => what_if.battery.initial_charge_pct = value,
            Self::PanelIncrease => what_if.scenario.panel_increase_pct = value,
            Self::LoadReduction => what_if.scenario.load_reduction_pct = value,
        }
    }
}

/// TUI application state.
pub struct App {
    /// Totals before any scenario.
    pub base: BaseTotals,
    base_energy: EnergyTotals,
    /// Current slider values.
    pub what_if: WhatIf,
    defaults: WhatIf,
    /// Index into [`Slider::ALL`].
    pub selected: usize,
    /// Latest evaluation, or the error it raised.
    pub outcome: std::result::Result<DispatchReport, String>,
    emission_factor_kg_per_kwh: f64,
    /// Measured solar per record, as chart points.
    pub actual_series: Vec<(f64, f64)>,
    /// Forecast solar per record, if the forecast stage has run.
    pub predicted_series: Vec<(f64, f64)>,
    /// Household consumption per record.
    pub consumption_series: Vec<(f64, f64)>,
    /// Records that carry a recommendation, in record order.
    pub decisions: Vec<RecordRow>,
    /// Whether the user has requested quit.
    pub quit: bool,
}

impl App {
    /// Builds the app from loaded records and evaluates the starting sliders.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::TwinError::InvalidConfiguration`] if the record
    /// totals are negative or non-finite.
    pub fn new(records: &[Record], config: &TwinConfig) -> Result<Self> {
        let base = BaseTotals::from_records(records, config.data.hours_per_record);
        let base_energy = base.energy_totals()?;
        let actual_series = records
            .iter()
            .enumerate()
            .map(|(i, r)| (i as f64, r.power_kw))
            .collect();
        let predicted_series = records
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.predicted_power_kw.map(|p| (i as f64, p)))
            .collect();
        let consumption_series = records
            .iter()
            .enumerate()
            .map(|(i, r)| (i as f64, r.consumption_kw))
            .collect();
        let decisions = records
            .iter()
            .filter(|r| r.energy_decision.is_some())
            .map(RecordRow::from)
            .collect();
        let what_if = config.what_if();
        let mut app = Self {
            base,
            base_energy,
            what_if,
            defaults: what_if,
            selected: 0,
            outcome: Err(String::new()),
            emission_factor_kg_per_kwh: config.impact.emission_factor_kg_per_kwh,
            actual_series,
            predicted_series,
            consumption_series,
            decisions,
            quit: false,
        };
        app.evaluate();
        Ok(app)
    }

    /// Re-runs the simulator for the current sliders.
    pub fn evaluate(&mut self) {
        self.outcome = self
            .what_if
            .evaluate(&self.base_energy)
            .map(|o: WhatIfOutcome| DispatchReport::new(self.base, o, self.emission_factor_kg_per_kwh))
            .map_err(|e| e.to_string());
    }

    /// Currently selected slider.
    pub fn selected_slider(&self) -> Slider {
        Slider::ALL[self.selected]
    }

    /// Moves the selection down, wrapping.
    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % Slider::ALL.len();
    }

    /// Moves the selection up, wrapping.
    pub fn select_prev(&mut self) {
        self.selected = (self.selected + Slider::ALL.len() - 1) % Slider::ALL.len();
    }

    /// Steps the selected slider by `direction` increments, clamped to its
    /// range, and re-evaluates.
    pub fn adjust(&mut self, direction: f64) {
        let slider = self.selected_slider();
        let (lo, hi) = slider.range();
        let value = (slider.get(&self.what_if) + direction * slider.step()).clamp(lo, hi);
        slider.set(&mut self.what_if, value);
        self.evaluate();
    }

    /// Restores the starting slider values.
    pub fn reset(&mut self) {
        self.what_if = self.defaults;
        self.evaluate();
    }

    /// Final state of charge as a fraction of capacity, if evaluated.
    pub fn soc_fraction(&self) -> Option<f64> {
        self.outcome.as_ref().ok().map(|r| {
            r.outcome.dispatch.final_state_of_charge_kwh / r.outcome.battery.capacity_kwh
        })
    }
}
