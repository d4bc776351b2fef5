//! Dispatch inputs and outputs.

use std::fmt;

use serde::Serialize;

use crate::error::{Result, TwinError};

/// Aggregate energy over the simulated period, after scenario multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyTotals {
    /// Solar energy generated (kWh, ≥ 0).
    pub solar_generated_kwh: f64,
    /// Energy consumed (kWh, ≥ 0).
    pub consumed_kwh: f64,
}

impl EnergyTotals {
    /// Creates totals, rejecting negative or non-finite energy.
    ///
    /// # Errors
    ///
    /// Returns [`TwinError::InvalidConfiguration`] naming the offending total.
    pub fn new(solar_generated_kwh: f64, consumed_kwh: f64) -> Result<Self> {
        let totals = Self {
            solar_generated_kwh,
            consumed_kwh,
        };
        totals.validate()?;
        Ok(totals)
    }

    /// Checks both totals are finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`TwinError::InvalidConfiguration`] naming the offending total.
    pub fn validate(&self) -> Result<()> {
        if !(self.solar_generated_kwh.is_finite() && self.solar_generated_kwh >= 0.0) {
            return Err(TwinError::invalid(
                "solarGeneratedKWh",
                self.solar_generated_kwh,
                "a finite value >= 0",
            ));
        }
        if !(self.consumed_kwh.is_finite() && self.consumed_kwh >= 0.0) {
            return Err(TwinError::invalid(
                "consumedKWh",
                self.consumed_kwh,
                "a finite value >= 0",
            ));
        }
        Ok(())
    }

    /// Generation minus consumption; negative is a deficit.
    pub fn energy_gap_kwh(&self) -> f64 {
        self.solar_generated_kwh - self.consumed_kwh
    }
}

/// Battery size and charge policy, in fractions of capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatteryConfig {
    /// Total capacity (kWh, > 0).
    pub capacity_kwh: f64,
    /// Reserve never discharged below, as a fraction of capacity in [0, 1).
    pub min_state_of_charge_fraction: f64,
    /// Starting fill level as a fraction of total capacity in [0, 1].
    pub initial_charge_fraction: f64,
}

impl BatteryConfig {
    /// Creates a validated configuration from fractions.
    ///
    /// # Errors
    ///
    /// Returns [`TwinError::InvalidConfiguration`] naming the first parameter
    /// outside its domain.
    pub fn new(
        capacity_kwh: f64,
        min_state_of_charge_fraction: f64,
        initial_charge_fraction: f64,
    ) -> Result<Self> {
        let config = Self {
            capacity_kwh,
            min_state_of_charge_fraction,
            initial_charge_fraction,
        };
        config.validate()?;
        Ok(config)
    }

    /// Creates a validated configuration from slider percentages (0–100).
    ///
    /// Ranges are checked in percent units so the error names what the user
    /// actually entered.
    ///
    /// # Errors
    ///
    /// Returns [`TwinError::InvalidConfiguration`] naming the first parameter
    /// outside its domain.
    pub fn from_percentages(
        capacity_kwh: f64,
        min_state_of_charge_pct: f64,
        initial_charge_pct: f64,
    ) -> Result<Self> {
        check_capacity(capacity_kwh)?;
        if !(0.0..100.0).contains(&min_state_of_charge_pct) {
            return Err(TwinError::invalid(
                "minStateOfChargePct",
                min_state_of_charge_pct,
                "a value in [0, 100)",
            ));
        }
        if !(0.0..=100.0).contains(&initial_charge_pct) {
            return Err(TwinError::invalid(
                "initialChargePct",
                initial_charge_pct,
                "a value in [0, 100]",
            ));
        }
        Self::new(
            capacity_kwh,
            min_state_of_charge_pct / 100.0,
            initial_charge_pct / 100.0,
        )
    }

    /// Checks every parameter against its domain.
    ///
    /// # Errors
    ///
    /// Returns [`TwinError::InvalidConfiguration`] naming the first parameter
    /// outside its domain.
    pub fn validate(&self) -> Result<()> {
        check_capacity(self.capacity_kwh)?;
        // `contains` is false for NaN, so non-finite fractions are rejected too.
        if !(0.0..1.0).contains(&self.min_state_of_charge_fraction) {
            return Err(TwinError::invalid(
                "minStateOfChargeFraction",
                self.min_state_of_charge_fraction,
                "a value in [0, 1)",
            ));
        }
        if !(0.0..=1.0).contains(&self.initial_charge_fraction) {
            return Err(TwinError::invalid(
                "initialChargeFraction",
                self.initial_charge_fraction,
                "a value in [0, 1]",
            ));
        }
        Ok(())
    }

    /// Energy held back as reserve (kWh).
    pub fn reserve_energy_kwh(&self) -> f64 {
        self.capacity_kwh * self.min_state_of_charge_fraction
    }

    /// Capacity available for cycling (kWh).
    pub fn usable_capacity_kwh(&self) -> f64 {
        self.capacity_kwh - self.reserve_energy_kwh()
    }
}

fn check_capacity(capacity_kwh: f64) -> Result<()> {
    if capacity_kwh.is_finite() && capacity_kwh > 0.0 {
        Ok(())
    } else {
        Err(TwinError::invalid(
            "capacityKWh",
            capacity_kwh,
            "a finite value > 0",
        ))
    }
}

/// Outcome of one dispatch evaluation.
///
/// At most one of `battery_discharged_kwh` / `battery_charged_kwh` is
/// non-zero, and at most one of `grid_import_kwh` / `grid_export_kwh`.
/// `final_state_of_charge_kwh` lies in `[reserve_energy_kwh, capacity]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DispatchResult {
    /// Residual energy after the battery (kWh; negative = still short).
    pub net_energy_kwh: f64,
    /// Energy drawn from the battery (kWh).
    pub battery_discharged_kwh: f64,
    /// Energy stored into the battery (kWh).
    pub battery_charged_kwh: f64,
    /// Energy drawn from the grid (kWh).
    pub grid_import_kwh: f64,
    /// Energy delivered to the grid (kWh).
    pub grid_export_kwh: f64,
    /// Stored energy after dispatch, reserve included (kWh).
    pub final_state_of_charge_kwh: f64,
    /// Reserve the battery kept (kWh).
    pub reserve_energy_kwh: f64,
    /// Capacity available for cycling (kWh).
    pub usable_capacity_kwh: f64,
    /// The deficit exceeded the usable energy, so the grid covered the rest.
    pub discharge_was_capped: bool,
}

impl fmt::Display for DispatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Net energy after battery: {:.2} kWh", self.net_energy_kwh)?;
        writeln!(f, "Grid import required:     {:.2} kWh", self.grid_import_kwh)?;
        writeln!(f, "Energy exported to grid:  {:.2} kWh", self.grid_export_kwh)?;
        writeln!(
            f,
            "Battery state of charge:  {:.2} kWh",
            self.final_state_of_charge_kwh
        )?;
        writeln!(f, "Battery charged:          {:.2} kWh", self.battery_charged_kwh)?;
        write!(f, "Battery used:             {:.2} kWh", self.battery_discharged_kwh)
    }
}
