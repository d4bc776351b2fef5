//! Battery dispatch: the what-if core of the twin.
//!
//! The simulator works on one aggregated energy gap, not a time series. It
//! holds no state between calls and is safe to call from anywhere.

pub mod scenario;
pub mod simulator;
pub mod types;

pub use scenario::{
    BatteryParams, MAX_SWEEP_POINTS, ScenarioAdjustment, SweepPoint, WhatIf, WhatIfOutcome,
};
pub use simulator::simulate;
pub use types::{BatteryConfig, DispatchResult, EnergyTotals};
