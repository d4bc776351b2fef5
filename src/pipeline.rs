//! Forecast → classify → decide over a record store.
//!
//! Each stage annotates records in place and can run on its own; stages that
//! depend on an earlier one fail with [`TwinError::MissingData`] when its
//! column has not been filled yet.

use std::fmt;

use serde::Serialize;

use crate::classify::{classify, is_waste_period};
use crate::config::{ClassifierConfig, ForecastConfig, TwinConfig};
use crate::decision::decide;
use crate::error::{Result, TwinError};
use crate::forecast::{FitOutcome, LinearForecast};
use crate::record::{Record, RecordStore};
use crate::report::{DecisionSummary, PatternSummary};

/// One annotation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Fill `predicted_power_kw`.
    Forecast,
    /// Fill `consumption_pattern` and `waste_period`.
    Classify,
    /// Fill `energy_decision`.
    Decide,
}

/// What one stage produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageReport {
    /// Fitted model and its held-out score.
    Forecast(FitOutcome),
    /// Usage-class counts and waste hours.
    Classify(PatternSummary),
    /// Recommendation counts.
    Decide(DecisionSummary),
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forecast(fit) => {
                let m = &fit.model;
                writeln!(
                    f,
                    "power_kw = {:.4} + {:.4} * sunlight_index + {:.4} * temperature_c",
                    m.intercept_kw, m.sunlight_coef, m.temperature_coef
                )?;
                write!(f, "train rows: {}, test rows: {}", fit.train_rows, fit.test_rows)?;
                if let (Some(r2), Some(rmse)) = (fit.test_r2, fit.test_rmse_kw) {
                    write!(f, "\ntest R²: {r2:.4}, RMSE: {rmse:.4} kW")?;
                }
                Ok(())
            }
            Self::Classify(summary) => write!(f, "{summary}"),
            Self::Decide(summary) => write!(f, "{summary}"),
        }
    }
}

/// Summary of a full pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    /// Records processed.
    pub records: usize,
    /// Forecast stage result.
    pub fit: FitOutcome,
    /// Classify stage result.
    pub patterns: PatternSummary,
    /// Decide stage result.
    pub decisions: DecisionSummary,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Processed {} records", self.records)?;
        writeln!(f, "\n[forecast]\n{}", StageReport::Forecast(self.fit))?;
        writeln!(f, "\n[patterns]\n{}", self.patterns)?;
        write!(f, "\n[decisions]\n{}", self.decisions)
    }
}

/// Fits the forecast model and writes a prediction into every record.
///
/// # Errors
///
/// Propagates [`LinearForecast::fit`] failures.
pub fn annotate_forecast(records: &mut [Record], config: &ForecastConfig) -> Result<FitOutcome> {
    let outcome = LinearForecast::fit(records, config)?;
    let predicted = outcome.model.predict(records)?;
    for (record, kw) in records.iter_mut().zip(predicted) {
        record.predicted_power_kw = Some(kw);
    }
    Ok(outcome)
}

/// Labels usage against whole-series statistics and flags waste periods.
///
/// # Errors
///
/// [`TwinError::MissingData`] if a record lacks `sunlight_index`. Nothing is
/// written in that case.
pub fn annotate_patterns(records: &mut [Record], config: &ClassifierConfig) -> Result<PatternSummary> {
    let sunlight: Vec<f64> = records.iter().map(Record::sunlight).collect::<Result<_>>()?;
    let patterns = classify(records);
    for ((record, pattern), sun) in records.iter_mut().zip(patterns).zip(sunlight) {
        record.consumption_pattern = Some(pattern);
        record.waste_period = Some(is_waste_period(
            pattern,
            sun,
            config.waste_sunlight_threshold,
        ));
    }
    let summary = PatternSummary::from_records(records);
    tracing::info!(
        peak = summary.peak,
        low = summary.low,
        normal = summary.normal,
        waste = summary.waste,
        "consumption patterns classified"
    );
    Ok(summary)
}

/// Derives a recommendation for every record.
///
/// # Errors
///
/// [`TwinError::MissingData`] naming the first absent column among
/// `predicted_power_kw`, `consumption_pattern`, `waste_period`. Nothing is
/// written in that case.
pub fn annotate_decisions(records: &mut [Record]) -> Result<DecisionSummary> {
    let labels = records
        .iter()
        .map(|r| Ok(decide(r.predicted()?, r.consumption_kw, r.pattern()?, r.waste()?)))
        .collect::<Result<Vec<_>>>()?;
    for (record, label) in records.iter_mut().zip(labels) {
        record.energy_decision = Some(label);
    }
    let summary = DecisionSummary::from_records(records);
    tracing::info!(records = records.len(), "energy decisions derived");
    Ok(summary)
}

/// Loads the store, runs one stage and saves the annotated records.
///
/// # Errors
///
/// Propagates store and stage failures; the store is untouched on failure.
pub fn run_stage(store: &mut impl RecordStore, stage: Stage, config: &TwinConfig) -> Result<StageReport> {
    let mut records = load_non_empty(store)?;
    let report = match stage {
        Stage::Forecast => StageReport::Forecast(annotate_forecast(&mut records, &config.forecast)?),
        Stage::Classify => StageReport::Classify(annotate_patterns(&mut records, &config.classifier)?),
        Stage::Decide => StageReport::Decide(annotate_decisions(&mut records)?),
    };
    store.save_records(&records)?;
    Ok(report)
}

/// Runs every stage in order and saves the fully annotated records once.
///
/// # Errors
///
/// Propagates store and stage failures; the store is untouched on failure.
pub fn run_pipeline(store: &mut impl RecordStore, config: &TwinConfig) -> Result<PipelineReport> {
    let mut records = load_non_empty(store)?;
    let fit = annotate_forecast(&mut records, &config.forecast)?;
    let patterns = annotate_patterns(&mut records, &config.classifier)?;
    let decisions = annotate_decisions(&mut records)?;
    store.save_records(&records)?;
    Ok(PipelineReport {
        records: records.len(),
        fit,
        patterns,
        decisions,
    })
}

fn load_non_empty(store: &impl RecordStore) -> Result<Vec<Record>> {
    let records = store.load_records()?;
    if records.is_empty() {
        return Err(TwinError::InsufficientData("record store is empty".to_string()));
    }
    Ok(records)
}
