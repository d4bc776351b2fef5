//! One-shot battery dispatch over an aggregated energy gap.

use crate::error::Result;

use super::types::{BatteryConfig, DispatchResult, EnergyTotals};

/// Balances the period's energy gap against a reserve-protected battery.
///
/// A deficit is covered from the usable pool (never the reserve) and the
/// remainder imported; a surplus fills the usable pool up to capacity and the
/// remainder is exported. The reserve counts toward the final state of charge
/// but never toward usable energy, even if the initial charge is below it.
///
/// Pure and stateless: identical inputs always produce identical results.
///
/// # Errors
///
/// Returns [`crate::error::TwinError::InvalidConfiguration`] before any
/// computation if `config` or `totals` is outside its domain.
pub fn simulate(totals: &EnergyTotals, config: &BatteryConfig) -> Result<DispatchResult> {
    config.validate()?;
    totals.validate()?;

    let reserve_kwh = config.reserve_energy_kwh();
    let usable_capacity_kwh = config.usable_capacity_kwh();
    let initial_total_kwh = config.capacity_kwh * config.initial_charge_fraction;
    let initial_usable_kwh = (initial_total_kwh - reserve_kwh).max(0.0);

    let gap_kwh = totals.energy_gap_kwh();

    let (discharged_kwh, charged_kwh, final_usable_kwh, net_kwh) = if gap_kwh < 0.0 {
        let discharged = (-gap_kwh).min(initial_usable_kwh);
        (
            discharged,
            0.0,
            initial_usable_kwh - discharged,
            gap_kwh + discharged,
        )
    } else {
        // initial_total <= capacity, so the space is never negative
        let space = (usable_capacity_kwh - initial_usable_kwh).max(0.0);
        let charged = gap_kwh.min(space);
        (0.0, charged, initial_usable_kwh + charged, gap_kwh - charged)
    };

    let result = DispatchResult {
        net_energy_kwh: net_kwh,
        battery_discharged_kwh: discharged_kwh,
        battery_charged_kwh: charged_kwh,
        grid_import_kwh: if net_kwh < 0.0 { -net_kwh } else { 0.0 },
        grid_export_kwh: if net_kwh > 0.0 { net_kwh } else { 0.0 },
        final_state_of_charge_kwh: final_usable_kwh + reserve_kwh,
        reserve_energy_kwh: reserve_kwh,
        usable_capacity_kwh,
        discharge_was_capped: gap_kwh < 0.0 && -gap_kwh > initial_usable_kwh,
    };

    tracing::debug!(
        solar_kwh = totals.solar_generated_kwh,
        consumed_kwh = totals.consumed_kwh,
        capacity_kwh = config.capacity_kwh,
        gap_kwh,
        net_kwh = result.net_energy_kwh,
        soc_kwh = result.final_state_of_charge_kwh,
        capped = result.discharge_was_capped,
        "dispatch simulated"
    );

    Ok(result)
}
