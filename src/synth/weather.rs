//! Hourly sunlight and temperature with persistent cloud cover.

use std::f64::consts::PI;

use rand::{SeedableRng, rngs::StdRng};

use super::gaussian_noise;

/// Lowest clearness (heavy overcast).
const CLEARNESS_MIN: f64 = 0.1;
/// Highest clearness (clear sky).
const CLEARNESS_MAX: f64 = 1.0;
/// Long-run clearness the cloud process reverts to.
const CLEARNESS_MEAN: f64 = 0.75;
/// Warming at full sunlight (°C).
const SUN_WARMING_C: f64 = 4.0;

/// Half-sine daylight profile in [0, 1]; zero outside `[sunrise, sunset)`.
pub fn daylight_frac(hour: u32, sunrise_hour: u32, sunset_hour: u32) -> f64 {
    if hour < sunrise_hour || hour >= sunset_hour {
        return 0.0;
    }
    let span = f64::from(sunset_hour - sunrise_hour);
    let pos = (f64::from(hour - sunrise_hour) + 0.5) / span;
    (PI * pos).sin()
}

/// Weather generator with an AR(1) clearness state.
///
/// ```text
/// k(t) = alpha * k(t-1) + (1 - alpha) * mean + noise(t)
/// ```
/// clamped to [0.1, 1.0]. The state advances every hour, night included, so
/// cloud fronts carry across days.
#[derive(Debug, Clone)]
pub struct WeatherModel {
    sunrise_hour: u32,
    sunset_hour: u32,
    alpha: f64,
    cloud_noise_std: f64,
    temp_mean_c: f64,
    temp_amp_c: f64,
    clearness: f64,
    rng: StdRng,
}

/// One hour of weather.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherSample {
    /// Sunlight index in [0, 1].
    pub sunlight_index: f64,
    /// Air temperature (°C).
    pub temperature_c: f64,
}

impl WeatherModel {
    /// Creates a generator starting from clear sky.
    pub fn new(
        sunrise_hour: u32,
        sunset_hour: u32,
        alpha: f64,
        cloud_noise_std: f64,
        temp_mean_c: f64,
        temp_amp_c: f64,
        seed: u64,
    ) -> Self {
        Self {
            sunrise_hour,
            sunset_hour,
            alpha: alpha.clamp(0.0, 1.0),
            cloud_noise_std: cloud_noise_std.max(0.0),
            temp_mean_c,
            temp_amp_c,
            clearness: CLEARNESS_MAX,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn advance_clearness(&mut self) -> f64 {
        let noise = gaussian_noise(&mut self.rng, self.cloud_noise_std);
        self.clearness = (self.alpha * self.clearness
            + (1.0 - self.alpha) * CLEARNESS_MEAN
            + noise)
            .clamp(CLEARNESS_MIN, CLEARNESS_MAX);
        self.clearness
    }

    /// Advances one hour and samples the weather at `hour` of day.
    pub fn sample(&mut self, hour: u32) -> WeatherSample {
        let k = self.advance_clearness();
        let sunlight_index = (daylight_frac(hour, self.sunrise_hour, self.sunset_hour) * k).clamp(0.0, 1.0);
        // coldest around 04:00, warmest around 16:00
        let angle = 2.0 * PI * (f64::from(hour) - 10.0) / 24.0;
        let temperature_c = self.temp_mean_c
            + self.temp_amp_c * angle.sin()
            + SUN_WARMING_C * sunlight_index
            + gaussian_noise(&mut self.rng, 0.5);
        WeatherSample {
            sunlight_index,
            temperature_c,
        }
    }
}
