//! Solar power forecast from weather observations.
//!
//! Ordinary least squares with intercept over `sunlight_index` and
//! `temperature_c`, fitted on a seeded shuffle split and scored on the
//! held-out rows. Predictions are clipped at zero; a panel never consumes.

use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::config::ForecastConfig;
use crate::error::{Result, TwinError};
use crate::record::Record;

/// Fewest rows a model can be fitted on.
pub const MIN_TRAINING_ROWS: usize = 3;

/// Relative cut-off below which a singular value is treated as zero.
const RANK_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, Copy)]
struct Sample {
    sunlight: f64,
    temperature: f64,
    power_kw: f64,
}

fn samples(records: &[Record]) -> Result<Vec<Sample>> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let s = Sample {
                sunlight: r.sunlight()?,
                temperature: r.temperature()?,
                power_kw: r.power_kw,
            };
            if s.sunlight.is_finite() && s.temperature.is_finite() && s.power_kw.is_finite() {
                Ok(s)
            } else {
                Err(TwinError::InsufficientData(format!(
                    "non-finite weather or power value in row {}",
                    i + 1
                )))
            }
        })
        .collect()
}

/// Splits `0..n` into shuffled (train, test) index sets.
///
/// The test set holds `ceil(n * test_fraction)` rows.
pub fn split_indices(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut idx: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    idx.shuffle(&mut rng);
    let n_test = ((n as f64) * test_fraction).ceil() as usize;
    let (test, train) = idx.split_at(n_test.min(n));
    (train.to_vec(), test.to_vec())
}

/// Linear solar model `power = intercept + a·sunlight + b·temperature`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearForecast {
    /// Output at zero sunlight and 0 °C (kW).
    pub intercept_kw: f64,
    /// kW per unit sunlight index.
    pub sunlight_coef: f64,
    /// kW per °C.
    pub temperature_coef: f64,
}

/// A fitted model and how well it scored on held-out rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitOutcome {
    /// The fitted model.
    pub model: LinearForecast,
    /// Rows used for fitting.
    pub train_rows: usize,
    /// Rows held out for scoring.
    pub test_rows: usize,
    /// Coefficient of determination on the test rows.
    ///
    /// `None` without test rows or when the test target is constant.
    pub test_r2: Option<f64>,
    /// Root mean squared error on the test rows (kW).
    pub test_rmse_kw: Option<f64>,
}

impl LinearForecast {
    /// Splits `records`, fits on the training rows and scores the rest.
    ///
    /// If the split leaves fewer than [`MIN_TRAINING_ROWS`] training rows,
    /// the model is fitted on every row and left unscored.
    ///
    /// # Errors
    ///
    /// [`TwinError::MissingData`] if a record lacks a weather feature;
    /// [`TwinError::InsufficientData`] for too few rows or featureless data.
    pub fn fit(records: &[Record], config: &ForecastConfig) -> Result<FitOutcome> {
        let samples = samples(records)?;
        if samples.len() < MIN_TRAINING_ROWS {
            return Err(TwinError::InsufficientData(format!(
                "{} records, need at least {MIN_TRAINING_ROWS}",
                samples.len()
            )));
        }

        let (mut train_idx, mut test_idx) =
            split_indices(samples.len(), config.test_fraction, config.seed);
        if train_idx.len() < MIN_TRAINING_ROWS {
            tracing::warn!(
                records = samples.len(),
                test_fraction = config.test_fraction,
                "split too small; fitting on every record without scoring"
            );
            train_idx = (0..samples.len()).collect();
            test_idx.clear();
        }

        let train: Vec<Sample> = train_idx.iter().map(|&i| samples[i]).collect();
        let test: Vec<Sample> = test_idx.iter().map(|&i| samples[i]).collect();

        let model = Self::fit_samples(&train)?;
        let (test_r2, test_rmse_kw) = model.score(&test);

        let outcome = FitOutcome {
            model,
            train_rows: train.len(),
            test_rows: test.len(),
            test_r2,
            test_rmse_kw,
        };
        tracing::info!(
            train_rows = outcome.train_rows,
            test_rows = outcome.test_rows,
            r2 = outcome.test_r2,
            rmse_kw = outcome.test_rmse_kw,
            "forecast model fitted"
        );
        Ok(outcome)
    }

    fn fit_samples(rows: &[Sample]) -> Result<Self> {
        let n = rows.len() as f64;
        let mean_sun = rows.iter().map(|s| s.sunlight).sum::<f64>() / n;
        let mean_temp = rows.iter().map(|s| s.temperature).sum::<f64>() / n;
        let mean_power = rows.iter().map(|s| s.power_kw).sum::<f64>() / n;

        // Centering removes the intercept column from the solve.
        let x = DMatrix::from_fn(rows.len(), 2, |r, c| {
            if c == 0 {
                rows[r].sunlight - mean_sun
            } else {
                rows[r].temperature - mean_temp
            }
        });
        let y = DVector::from_iterator(rows.len(), rows.iter().map(|s| s.power_kw - mean_power));

        let svd = x.svd(true, true);
        let largest = svd.singular_values.max();
        if !(largest > 0.0) {
            return Err(TwinError::InsufficientData(
                "sunlight and temperature are constant; design matrix is singular".to_string(),
            ));
        }
        // Minimum-norm solution when one feature is constant.
        let coef = svd
            .solve(&y, largest * RANK_TOLERANCE)
            .map_err(|e| TwinError::InsufficientData(e.to_string()))?;

        let sunlight_coef = coef[0];
        let temperature_coef = coef[1];
        Ok(Self {
            intercept_kw: mean_power - sunlight_coef * mean_sun - temperature_coef * mean_temp,
            sunlight_coef,
            temperature_coef,
        })
    }

    fn score(&self, rows: &[Sample]) -> (Option<f64>, Option<f64>) {
        if rows.is_empty() {
            return (None, None);
        }
        let n = rows.len() as f64;
        let mean = rows.iter().map(|s| s.power_kw).sum::<f64>() / n;
        let ss_res: f64 = rows
            .iter()
            .map(|s| (s.power_kw - self.predict_raw(s.sunlight, s.temperature)).powi(2))
            .sum();
        let ss_tot: f64 = rows.iter().map(|s| (s.power_kw - mean).powi(2)).sum();
        let r2 = (ss_tot > 0.0).then(|| 1.0 - ss_res / ss_tot);
        (r2, Some((ss_res / n).sqrt()))
    }

    /// Unclipped model output (kW).
    pub fn predict_raw(&self, sunlight_index: f64, temperature_c: f64) -> f64 {
        self.intercept_kw + self.sunlight_coef * sunlight_index + self.temperature_coef * temperature_c
    }

    /// Forecast power for one observation, never negative (kW).
    pub fn predict_kw(&self, sunlight_index: f64, temperature_c: f64) -> f64 {
        self.predict_raw(sunlight_index, temperature_c).max(0.0)
    }

    /// Forecasts every record, preserving order.
    ///
    /// # Errors
    ///
    /// [`TwinError::MissingData`] if a record lacks a weather feature.
    pub fn predict(&self, records: &[Record]) -> Result<Vec<f64>> {
        records
            .iter()
            .map(|r| Ok(self.predict_kw(r.sunlight()?, r.temperature()?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    use super::*;

    fn linear_records(n: usize) -> Vec<Record> {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n)
            .map(|i| {
                let sun = (i % 7) as f64 / 6.0;
                let temp = 10.0 + ((i * 3) % 11) as f64;
                let power = 0.5 + 4.0 * sun + 0.02 * temp;
                Record::new(start + Duration::hours(i as i64), power, 1.0).with_weather(sun, temp)
            })
            .collect()
    }

    #[test]
    fn recovers_exact_linear_relation() {
        let outcome = LinearForecast::fit(&linear_records(30), &ForecastConfig::default()).unwrap();
        let m = outcome.model;
        assert_relative_eq!(m.intercept_kw, 0.5, epsilon = 1e-9);
        assert_relative_eq!(m.sunlight_coef, 4.0, epsilon = 1e-9);
        assert_relative_eq!(m.temperature_coef, 0.02, epsilon = 1e-9);
        assert_relative_eq!(outcome.test_r2.unwrap(), 1.0, epsilon = 1e-9);
        assert!(outcome.test_rmse_kw.unwrap() < 1e-9);
    }

    #[test]
    fn split_holds_out_ceil_of_fraction() {
        let outcome = LinearForecast::fit(&linear_records(10), &ForecastConfig::default()).unwrap();
        assert_eq!(outcome.test_rows, 2);
        assert_eq!(outcome.train_rows, 8);

        let (train, test) = split_indices(11, 0.2, 42);
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 8);
    }

    #[test]
    fn split_is_deterministic_for_a_seed() {
        assert_eq!(split_indices(50, 0.2, 42), split_indices(50, 0.2, 42));
        let (mut train, test) = split_indices(50, 0.2, 7);
        train.extend(test);
        train.sort_unstable();
        assert_eq!(train, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn predictions_are_clipped_at_zero() {
        let model = LinearForecast {
            intercept_kw: -1.0,
            sunlight_coef: 2.0,
            temperature_coef: 0.0,
        };
        assert_eq!(model.predict_kw(0.0, 20.0), 0.0);
        assert_relative_eq!(model.predict_kw(1.0, 20.0), 1.0);
        assert_relative_eq!(model.predict_raw(0.0, 20.0), -1.0);
    }

    #[test]
    fn too_few_rows_is_insufficient() {
        let err = LinearForecast::fit(&linear_records(2), &ForecastConfig::default()).unwrap_err();
        assert!(matches!(err, TwinError::InsufficientData(_)));
    }

    #[test]
    fn tiny_split_fits_on_everything() {
        let outcome = LinearForecast::fit(&linear_records(3), &ForecastConfig::default()).unwrap();
        assert_eq!(outcome.train_rows, 3);
        assert_eq!(outcome.test_rows, 0);
        assert_eq!(outcome.test_r2, None);
    }

    #[test]
    fn missing_feature_names_column() {
        let mut records = linear_records(10);
        records[4].temperature_c = None;
        let err = LinearForecast::fit(&records, &ForecastConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            TwinError::MissingData {
                column: "temperature_c"
            }
        ));
    }

    #[test]
    fn constant_features_are_singular() {
        let mut records = linear_records(10);
        for r in &mut records {
            r.sunlight_index = Some(0.5);
            r.temperature_c = Some(20.0);
        }
        let err = LinearForecast::fit(&records, &ForecastConfig::default()).unwrap_err();
        assert!(matches!(err, TwinError::InsufficientData(_)));
    }

    #[test]
    fn predict_preserves_order() {
        let records = linear_records(12);
        let outcome = LinearForecast::fit(&records, &ForecastConfig::default()).unwrap();
        let predicted = outcome.model.predict(&records).unwrap();
        assert_eq!(predicted.len(), records.len());
        for (p, r) in predicted.iter().zip(&records) {
            assert_relative_eq!(*p, r.power_kw, epsilon = 1e-9);
        }
    }
}
