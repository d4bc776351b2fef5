//! Seeded synthetic record sets for demos and tests.
//!
//! Produces hourly records with weather and raw measurements only; derived
//! columns are left for the pipeline.

mod household;
mod weather;

pub use household::{HouseholdLoad, PanelArray};
pub use weather::{WeatherModel, WeatherSample, daylight_frac};

use chrono::{Duration, NaiveTime};
use rand::{Rng, rngs::StdRng};

use crate::config::SynthConfig;
use crate::error::{Result, TwinError};
use crate::record::Record;

/// Gaussian noise via the Box-Muller transform.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos() * std_dev
}

/// Generates `days × 24` hourly records starting at midnight of `start_date`.
///
/// Each model gets its own seed derived from `config.seed`, so changing one
/// model's parameters leaves the other streams untouched.
///
/// # Errors
///
/// Returns [`TwinError::Date`] if `start_date` is not `YYYY-MM-DD`.
pub fn generate(config: &SynthConfig) -> Result<Vec<Record>> {
    let start = config
        .start()
        .map_err(|source| TwinError::Date {
            value: config.start_date.clone(),
            source,
        })?
        .and_time(NaiveTime::MIN);

    let mut weather = WeatherModel::new(
        config.sunrise_hour,
        config.sunset_hour,
        config.cloud_alpha,
        config.cloud_noise_std,
        config.temp_mean_c,
        config.temp_amp_c,
        config.seed,
    );
    let mut panels = PanelArray::new(
        config.panel_kw_peak,
        config.temp_coefficient,
        config.power_noise_std,
        config.seed.wrapping_add(1),
    );
    let mut load = HouseholdLoad::new(
        config.base_load_kw,
        config.load_amp_kw,
        config.load_phase_rad,
        config.load_noise_std,
        config.seed.wrapping_add(2),
    );

    let hours = config.days * 24;
    let records: Vec<Record> = (0..hours)
        .map(|t| {
            let hour = (t % 24) as u32;
            let w = weather.sample(hour);
            let power_kw = panels.output_kw(w.sunlight_index, w.temperature_c);
            let consumption_kw = load.demand_kw(hour);
            Record::new(start + Duration::hours(t as i64), power_kw, consumption_kw)
                .with_weather(w.sunlight_index, w.temperature_c)
        })
        .collect();

    tracing::info!(
        records = records.len(),
        days = config.days,
        seed = config.seed,
        "synthetic records generated"
    );
    Ok(records)
}
