//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use solar_twin::config::{SynthConfig, TwinConfig};
use solar_twin::dispatch::{BatteryConfig, EnergyTotals};
use solar_twin::record::Record;
use solar_twin::synth;

/// Two days of seeded synthetic records (48 rows).
pub fn two_day_records() -> Vec<Record> {
    synth::generate(&short_synth(2)).expect("synthetic records")
}

/// Default synthetic generator shortened to `days`.
pub fn short_synth(days: usize) -> SynthConfig {
    SynthConfig {
        days,
        ..SynthConfig::default()
    }
}

/// Baseline configuration pointed at `data`.
pub fn config_for(data: PathBuf) -> TwinConfig {
    let mut config = TwinConfig::baseline();
    config.data.path = data;
    config
}

/// Totals in kWh.
pub fn totals(solar: f64, consumed: f64) -> EnergyTotals {
    EnergyTotals::new(solar, consumed).expect("valid totals")
}

/// Battery from fractions.
pub fn battery(capacity: f64, min_soc: f64, initial: f64) -> BatteryConfig {
    BatteryConfig::new(capacity, min_soc, initial).expect("valid battery")
}

/// Fresh, empty scratch directory unique to this process and call.
pub fn scratch_dir(tag: &str) -> PathBuf {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    let dir = std::env::temp_dir().join(format!(
        "solar-twin-{tag}-{}-{}",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}
