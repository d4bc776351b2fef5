//! TOML-based twin configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::classify::DEFAULT_WASTE_SUNLIGHT_THRESHOLD;
use crate::dispatch::scenario::MAX_LOAD_REDUCTION_PCT;
use crate::dispatch::{BatteryParams, ScenarioAdjustment, WhatIf};

/// Top-level configuration parsed from TOML.
///
/// All sections have defaults matching the baseline preset. Load from TOML
/// with [`TwinConfig::from_toml_file`] or use [`TwinConfig::baseline`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TwinConfig {
    /// Record store location and sampling interval.
    #[serde(default)]
    pub data: DataConfig,
    /// Forecast fitting parameters.
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Consumption classifier parameters.
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// Battery sliders.
    #[serde(default)]
    pub battery: BatteryParams,
    /// Scenario sliders.
    #[serde(default)]
    pub scenario: ScenarioAdjustment,
    /// Environmental impact factors.
    #[serde(default)]
    pub impact: ImpactConfig,
    /// Synthetic data generator parameters.
    #[serde(default)]
    pub synth: SynthConfig,
}

/// Record store location.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// CSV record store path.
    pub path: PathBuf,
    /// Length of one record (hours); kW × hours gives kWh.
    pub hours_per_record: f64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/sample.csv"),
            hours_per_record: 1.0,
        }
    }
}

/// Train/test split for the forecast model.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// Share of rows held out for scoring, in [0, 1).
    pub test_fraction: f64,
    /// Shuffle seed.
    pub seed: u64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Consumption classifier parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Sunlight index above which a low-usage record is a waste period.
    pub waste_sunlight_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            waste_sunlight_threshold: DEFAULT_WASTE_SUNLIGHT_THRESHOLD,
        }
    }
}

/// Environmental impact factors.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImpactConfig {
    /// Grid emission factor (kg CO₂ per kWh displaced).
    pub emission_factor_kg_per_kwh: f64,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            emission_factor_kg_per_kwh: 0.82,
        }
    }
}

/// Synthetic record generator parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SynthConfig {
    /// Number of days of hourly records (must be > 0).
    pub days: usize,
    /// Master random seed.
    pub seed: u64,
    /// First day, `YYYY-MM-DD`.
    pub start_date: String,
    /// Sunrise hour (inclusive).
    pub sunrise_hour: u32,
    /// Sunset hour (exclusive, ≤ 24).
    pub sunset_hour: u32,
    /// Array peak output at full sunlight (kW).
    pub panel_kw_peak: f64,
    /// Output loss per °C above 25 °C (fraction).
    pub temp_coefficient: f64,
    /// Multiplicative output noise standard deviation.
    pub power_noise_std: f64,
    /// AR(1) cloud persistence (0.0–1.0).
    pub cloud_alpha: f64,
    /// AR(1) cloud innovation standard deviation.
    pub cloud_noise_std: f64,
    /// Household baseline consumption (kW).
    pub base_load_kw: f64,
    /// Daily consumption swing amplitude (kW).
    pub load_amp_kw: f64,
    /// Consumption phase offset (radians).
    pub load_phase_rad: f64,
    /// Consumption noise standard deviation (kW).
    pub load_noise_std: f64,
    /// Mean air temperature (°C).
    pub temp_mean_c: f64,
    /// Diurnal temperature amplitude (°C).
    pub temp_amp_c: f64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            days: 7,
            seed: 42,
            start_date: "2024-06-01".to_string(),
            sunrise_hour: 6,
            sunset_hour: 19,
            panel_kw_peak: 5.0,
            temp_coefficient: 0.004,
            power_noise_std: 0.05,
            cloud_alpha: 0.8,
            cloud_noise_std: 0.25,
            base_load_kw: 1.2,
            load_amp_kw: 0.6,
            load_phase_rad: 1.2,
            load_noise_std: 0.1,
            temp_mean_c: 18.0,
            temp_amp_c: 6.0,
        }
    }
}

impl SynthConfig {
    /// Parses `start_date`.
    pub fn start(&self) -> chrono::ParseResult<NaiveDate> {
        NaiveDate::parse_from_str(&self.start_date, "%Y-%m-%d")
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.capacity_kwh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl TwinConfig {
    /// Returns the baseline preset: dashboard defaults, no scenario change.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the expanded-array preset: 50 % more panels and a larger battery.
    pub fn expanded_array() -> Self {
        Self {
            battery: BatteryParams {
                capacity_kwh: 100.0,
                initial_charge_pct: 40.0,
                ..BatteryParams::default()
            },
            scenario: ScenarioAdjustment {
                panel_increase_pct: 50.0,
                load_reduction_pct: 0.0,
            },
            ..Self::default()
        }
    }

    /// Returns the efficiency preset: 25 % load cut with a small battery.
    pub fn efficiency() -> Self {
        Self {
            battery: BatteryParams {
                capacity_kwh: 20.0,
                min_soc_pct: 10.0,
                ..BatteryParams::default()
            },
            scenario: ScenarioAdjustment {
                panel_increase_pct: 0.0,
                load_reduction_pct: 25.0,
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "expanded_array", "efficiency"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "expanded_array" => Ok(Self::expanded_array()),
            "efficiency" => Ok(Self::efficiency()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// The slider bundle this configuration starts from.
    pub fn what_if(&self) -> WhatIf {
        WhatIf {
            battery: self.battery,
            scenario: self.scenario,
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let d = &self.data;
        if !(d.hours_per_record.is_finite() && d.hours_per_record > 0.0) {
            errors.push(ConfigError::new("data.hours_per_record", "must be > 0"));
        }

        if !(0.0..1.0).contains(&self.forecast.test_fraction) {
            errors.push(ConfigError::new("forecast.test_fraction", "must be in [0.0, 1.0)"));
        }

        if !(0.0..=1.0).contains(&self.classifier.waste_sunlight_threshold) {
            errors.push(ConfigError::new(
                "classifier.waste_sunlight_threshold",
                "must be in [0.0, 1.0]",
            ));
        }

        let bat = &self.battery;
        if !(bat.capacity_kwh.is_finite() && bat.capacity_kwh > 0.0) {
            errors.push(ConfigError::new("battery.capacity_kwh", "must be > 0"));
        }
        if !(0.0..100.0).contains(&bat.min_soc_pct) {
            errors.push(ConfigError::new("battery.min_soc_pct", "must be in [0, 100)"));
        }
        if !(0.0..=100.0).contains(&bat.initial_charge_pct) {
            errors.push(ConfigError::new(
                "battery.initial_charge_pct",
                "must be in [0, 100]",
            ));
        }

        let sc = &self.scenario;
        if !(sc.panel_increase_pct.is_finite() && sc.panel_increase_pct >= 0.0) {
            errors.push(ConfigError::new("scenario.panel_increase_pct", "must be >= 0"));
        }
        if !(0.0..=MAX_LOAD_REDUCTION_PCT).contains(&sc.load_reduction_pct) {
            errors.push(ConfigError::new(
                "scenario.load_reduction_pct",
                "must be in [0, 50]",
            ));
        }

        let factor = self.impact.emission_factor_kg_per_kwh;
        if !(factor.is_finite() && factor >= 0.0) {
            errors.push(ConfigError::new(
                "impact.emission_factor_kg_per_kwh",
                "must be >= 0",
            ));
        }

        let syn = &self.synth;
        if syn.days == 0 {
            errors.push(ConfigError::new("synth.days", "must be > 0"));
        }
        if syn.start().is_err() {
            errors.push(ConfigError::new(
                "synth.start_date",
                format!("must be YYYY-MM-DD, got \"{}\"", syn.start_date),
            ));
        }
        if syn.sunrise_hour >= syn.sunset_hour {
            errors.push(ConfigError::new("synth.sunrise_hour", "must be < synth.sunset_hour"));
        }
        if syn.sunset_hour > 24 {
            errors.push(ConfigError::new("synth.sunset_hour", "must be <= 24"));
        }
        if syn.panel_kw_peak < 0.0 {
            errors.push(ConfigError::new("synth.panel_kw_peak", "must be >= 0"));
        }
        if !(0.0..=1.0).contains(&syn.cloud_alpha) {
            errors.push(ConfigError::new("synth.cloud_alpha", "must be in [0.0, 1.0]"));
        }
        for (field, value) in [
            ("synth.power_noise_std", syn.power_noise_std),
            ("synth.cloud_noise_std", syn.cloud_noise_std),
            ("synth.load_noise_std", syn.load_noise_std),
            ("synth.base_load_kw", syn.base_load_kw),
        ] {
            if value < 0.0 {
                errors.push(ConfigError::new(field, "must be >= 0"));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let errors = TwinConfig::baseline().validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn baseline_matches_dashboard_defaults() {
        let cfg = TwinConfig::baseline();
        assert_eq!(cfg.battery.capacity_kwh, 50.0);
        assert_eq!(cfg.battery.min_soc_pct, 20.0);
        assert_eq!(cfg.battery.initial_charge_pct, 50.0);
        assert_eq!(cfg.impact.emission_factor_kg_per_kwh, 0.82);
        assert_eq!(cfg.forecast.seed, 42);
    }

    #[test]
    fn from_preset_unknown() {
        let e = TwinConfig::from_preset("nonexistent").unwrap_err();
        assert!(e.message.contains("unknown preset"));
        assert_eq!(e.field, "preset");
    }

    #[test]
    fn all_presets_are_valid() {
        for name in TwinConfig::PRESETS {
            let cfg = TwinConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(errors.is_empty(), "preset \"{name}\" should be valid: {errors:?}");
        }
    }

    #[test]
    fn expanded_array_adds_panels_and_storage() {
        let base = TwinConfig::baseline();
        let big = TwinConfig::expanded_array();
        assert!(big.scenario.panel_increase_pct > base.scenario.panel_increase_pct);
        assert!(big.battery.capacity_kwh > base.battery.capacity_kwh);
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[data]
path = "other.csv"
hours_per_record = 0.5

[forecast]
test_fraction = 0.25
seed = 7

[classifier]
waste_sunlight_threshold = 0.7

[battery]
capacity_kwh = 80.0
min_soc_pct = 15.0
initial_charge_pct = 60.0

[scenario]
panel_increase_pct = 30.0
load_reduction_pct = 10.0

[impact]
emission_factor_kg_per_kwh = 0.5

[synth]
days = 3
start_date = "2023-01-15"
"#;
        let cfg = TwinConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.data.path, PathBuf::from("other.csv"));
        assert_eq!(cfg.forecast.seed, 7);
        assert_eq!(cfg.battery.capacity_kwh, 80.0);
        assert_eq!(cfg.scenario.load_reduction_pct, 10.0);
        assert_eq!(cfg.synth.days, 3);
        assert_eq!(cfg.synth.start().ok(), NaiveDate::from_ymd_opt(2023, 1, 15));
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let toml = r#"
[battery]
capacity_kwh = 10.0
max_charge_kw = 5.0
"#;
        assert!(TwinConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let cfg = TwinConfig::from_toml_str("[battery]\ncapacity_kwh = 120.0\n").unwrap();
        assert_eq!(cfg.battery.capacity_kwh, 120.0);
        // untouched fields keep defaults
        assert_eq!(cfg.battery.min_soc_pct, 20.0);
        assert_eq!(cfg.synth.panel_kw_peak, 5.0);
    }

    #[test]
    fn validation_reports_every_bad_field() {
        let mut cfg = TwinConfig::baseline();
        cfg.battery.capacity_kwh = 0.0;
        cfg.battery.initial_charge_pct = 120.0;
        cfg.scenario.load_reduction_pct = 60.0;
        cfg.synth.start_date = "June".to_string();
        let fields: Vec<_> = cfg.validate().into_iter().map(|e| e.field).collect();
        for expected in [
            "battery.capacity_kwh",
            "battery.initial_charge_pct",
            "scenario.load_reduction_pct",
            "synth.start_date",
        ] {
            assert!(fields.iter().any(|f| f == expected), "{expected} missing in {fields:?}");
        }
    }

    #[test]
    fn validation_catches_inverted_daylight() {
        let mut cfg = TwinConfig::baseline();
        cfg.synth.sunrise_hour = 20;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "synth.sunrise_hour"));
    }
}
