//! Panel array output and household demand.

use std::f64::consts::PI;

use rand::{SeedableRng, rngs::StdRng};

use super::gaussian_noise;

/// Cell temperature at which the array produces its rated output (°C).
const RATED_TEMP_C: f64 = 25.0;

/// A rooftop array whose output follows sunlight with a temperature derate.
#[derive(Debug, Clone)]
pub struct PanelArray {
    /// Output at sunlight index 1.0 and rated temperature (kW).
    pub kw_peak: f64,
    /// Fractional loss per °C above rated temperature.
    pub temp_coefficient: f64,
    noise_std: f64,
    rng: StdRng,
}

impl PanelArray {
    /// Creates an array with multiplicative output noise.
    pub fn new(kw_peak: f64, temp_coefficient: f64, noise_std: f64, seed: u64) -> Self {
        Self {
            kw_peak: kw_peak.max(0.0),
            temp_coefficient,
            noise_std: noise_std.max(0.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Output for one hour (kW, never negative).
    pub fn output_kw(&mut self, sunlight_index: f64, temperature_c: f64) -> f64 {
        if sunlight_index <= 0.0 {
            return 0.0;
        }
        let derate = 1.0 - self.temp_coefficient * (temperature_c - RATED_TEMP_C);
        let noise = 1.0 + gaussian_noise(&mut self.rng, self.noise_std);
        (self.kw_peak * sunlight_index * derate * noise).max(0.0)
    }
}

/// Sinusoidal daily household demand with noise.
#[derive(Debug, Clone)]
pub struct HouseholdLoad {
    /// Baseline consumption (kW).
    pub base_kw: f64,
    /// Daily swing amplitude (kW).
    pub amp_kw: f64,
    /// Phase offset (radians).
    pub phase_rad: f64,
    noise_std: f64,
    rng: StdRng,
}

impl HouseholdLoad {
    pub fn new(base_kw: f64, amp_kw: f64, phase_rad: f64, noise_std: f64, seed: u64) -> Self {
        Self {
            base_kw,
            amp_kw,
            phase_rad,
            noise_std: noise_std.max(0.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Demand at `hour` of day (kW, never negative).
    pub fn demand_kw(&mut self, hour: u32) -> f64 {
        let angle = 2.0 * PI * f64::from(hour % 24) / 24.0 + self.phase_rad;
        let kw = self.base_kw + self.amp_kw * angle.sin() + gaussian_noise(&mut self.rng, self.noise_std);
        kw.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dark_hours_produce_nothing() {
        let mut pv = PanelArray::new(5.0, 0.004, 0.05, 42);
        assert_eq!(pv.output_kw(0.0, 15.0), 0.0);
    }

    #[test]
    fn hot_panels_produce_less() {
        let mut cool = PanelArray::new(5.0, 0.004, 0.0, 1);
        let mut hot = PanelArray::new(5.0, 0.004, 0.0, 1);
        assert!(hot.output_kw(1.0, 40.0) < cool.output_kw(1.0, 20.0));
    }

    #[test]
    fn demand_never_negative() {
        let mut load = HouseholdLoad::new(0.1, 1.0, 0.0, 0.5, 7);
        for t in 0..240 {
            assert!(load.demand_kw(t % 24) >= 0.0);
        }
    }

    #[test]
    fn noiseless_demand_follows_sinusoid() {
        let mut load = HouseholdLoad::new(1.0, 0.5, 0.0, 0.0, 0);
        assert!((load.demand_kw(6) - 1.5).abs() < 1e-12);
        assert!((load.demand_kw(18) - 0.5).abs() < 1e-12);
    }
}
