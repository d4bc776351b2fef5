//! Base totals, environmental impact and printable summaries.

use std::fmt;

use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;

use crate::classify::ConsumptionPattern;
use crate::decision::DecisionLabel;
use crate::dispatch::{EnergyTotals, WhatIfOutcome};
use crate::error::Result;
use crate::record::{Record, TIMESTAMP_FORMAT};

/// Energy totals over the whole record set, before any scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BaseTotals {
    /// Number of records summed.
    pub records: usize,
    /// Measured solar generation (kWh).
    pub solar_kwh: f64,
    /// Measured consumption (kWh).
    pub consumption_kwh: f64,
    /// Forecast generation (kWh); `None` unless every record has a forecast.
    pub predicted_kwh: Option<f64>,
}

impl BaseTotals {
    /// Sums power columns, each record lasting `hours_per_record`.
    pub fn from_records(records: &[Record], hours_per_record: f64) -> Self {
        let solar_kw: f64 = records.iter().map(|r| r.power_kw).sum();
        let consumption_kw: f64 = records.iter().map(|r| r.consumption_kw).sum();
        let predicted_kw: Option<f64> = if records.is_empty() {
            None
        } else {
            records.iter().map(|r| r.predicted_power_kw).sum()
        };
        Self {
            records: records.len(),
            solar_kwh: solar_kw * hours_per_record,
            consumption_kwh: consumption_kw * hours_per_record,
            predicted_kwh: predicted_kw.map(|kw| kw * hours_per_record),
        }
    }

    /// Measured totals as dispatch input.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::TwinError::InvalidConfiguration`] if a total is
    /// negative or non-finite.
    pub fn energy_totals(&self) -> Result<EnergyTotals> {
        EnergyTotals::new(self.solar_kwh, self.consumption_kwh)
    }
}

impl fmt::Display for BaseTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Records:                 {}", self.records)?;
        writeln!(f, "Total solar generated:   {:.2} kWh", self.solar_kwh)?;
        write!(f, "Total consumption:       {:.2} kWh", self.consumption_kwh)?;
        if let Some(p) = self.predicted_kwh {
            write!(f, "\nTotal predicted solar:   {p:.2} kWh")?;
        }
        Ok(())
    }
}

/// Grid emissions avoided by `solar_kwh` of generation (kg CO₂).
pub fn co2_saved_kg(solar_kwh: f64, emission_factor_kg_per_kwh: f64) -> f64 {
    solar_kwh * emission_factor_kg_per_kwh
}

/// One what-if evaluation ready for printing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DispatchReport {
    /// Totals before the scenario.
    pub base: BaseTotals,
    /// Scenario totals and dispatch.
    pub outcome: WhatIfOutcome,
    /// Emissions avoided by the simulated generation (kg CO₂).
    pub co2_saved_kg: f64,
}

impl DispatchReport {
    /// Pairs an evaluation with its base totals and prices the simulated
    /// generation in avoided emissions.
    pub fn new(base: BaseTotals, outcome: WhatIfOutcome, emission_factor_kg_per_kwh: f64) -> Self {
        Self {
            base,
            outcome,
            co2_saved_kg: co2_saved_kg(outcome.totals.solar_generated_kwh, emission_factor_kg_per_kwh),
        }
    }

    /// Advice line for the residual grid flow, if any.
    pub fn grid_advisory(&self) -> Option<&'static str> {
        let d = &self.outcome.dispatch;
        if d.grid_import_kwh > 0.0 {
            Some("Remaining energy demand must be supplied by the grid.")
        } else if d.grid_export_kwh > 0.0 {
            Some("Excess energy exported to the grid.")
        } else {
            None
        }
    }
}

impl fmt::Display for DispatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.outcome;
        writeln!(f, "{}", self.base)?;
        writeln!(f)?;
        writeln!(f, "Simulated solar:          {:.2} kWh", o.totals.solar_generated_kwh)?;
        writeln!(f, "Simulated consumption:    {:.2} kWh", o.totals.consumed_kwh)?;
        writeln!(f, "{}", o.dispatch)?;
        writeln!(
            f,
            "Battery keeps {:.0}% minimum charge ({:.2} kWh reserved).",
            o.battery.min_state_of_charge_fraction * 100.0,
            o.dispatch.reserve_energy_kwh
        )?;
        if let Some(advice) = self.grid_advisory() {
            writeln!(f, "{advice}")?;
        }
        write!(f, "Estimated CO₂ saved:      {:.2} kg", self.co2_saved_kg)
    }
}

/// Usage-class counts and the hours when solar is being wasted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatternSummary {
    /// Records above mean + σ.
    pub peak: usize,
    /// Records below mean − σ.
    pub low: usize,
    /// Everything in between.
    pub normal: usize,
    /// Records flagged as waste periods.
    pub waste: usize,
    /// Distinct hours of day with at least one waste period, ascending.
    pub waste_hours: Vec<u32>,
}

impl PatternSummary {
    /// Counts classified records; unclassified ones are skipped.
    pub fn from_records(records: &[Record]) -> Self {
        let mut summary = Self::default();
        for r in records {
            match r.consumption_pattern {
                Some(ConsumptionPattern::PeakUsage) => summary.peak += 1,
                Some(ConsumptionPattern::LowUsage) => summary.low += 1,
                Some(ConsumptionPattern::NormalUsage) => summary.normal += 1,
                None => {}
            }
            if r.waste_period == Some(true) {
                summary.waste += 1;
                summary.waste_hours.push(r.timestamp.hour());
            }
        }
        summary.waste_hours.sort_unstable();
        summary.waste_hours.dedup();
        summary
    }
}

impl fmt::Display for PatternSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PEAK_USAGE:   {}", self.peak)?;
        writeln!(f, "LOW_USAGE:    {}", self.low)?;
        writeln!(f, "NORMAL_USAGE: {}", self.normal)?;
        write!(f, "Waste periods: {}", self.waste)?;
        if !self.waste_hours.is_empty() {
            let hours: Vec<String> = self.waste_hours.iter().map(|h| format!("{h:02}:00")).collect();
            write!(f, " (at {})", hours.join(", "))?;
        }
        Ok(())
    }
}

/// How often each recommendation was given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionSummary {
    /// Count per label, in [`DecisionLabel::ALL`] order.
    pub counts: Vec<(DecisionLabel, usize)>,
}

impl DecisionSummary {
    /// Counts every label, including those never given.
    pub fn from_records(records: &[Record]) -> Self {
        let counts = DecisionLabel::ALL
            .into_iter()
            .map(|label| {
                let n = records
                    .iter()
                    .filter(|r| r.energy_decision == Some(label))
                    .count();
                (label, n)
            })
            .collect();
        Self { counts }
    }

    /// Count for one label.
    pub fn count(&self, label: DecisionLabel) -> usize {
        self.counts
            .iter()
            .find(|(l, _)| *l == label)
            .map_or(0, |(_, n)| *n)
    }
}

impl fmt::Display for DecisionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self
            .counts
            .iter()
            .map(|(label, n)| format!("{n:>5}  {label}"))
            .collect();
        f.write_str(&lines.join("\n"))
    }
}

/// One record as shown in a per-record view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecordRow {
    /// Start of the interval.
    pub timestamp: NaiveDateTime,
    /// Measured consumption (kW).
    pub consumption_kw: f64,
    /// Forecast solar (kW), once the forecast stage has run.
    pub predicted_power_kw: Option<f64>,
    /// Usage class, once classified.
    pub pattern: Option<ConsumptionPattern>,
    /// Waste-period flag, once classified.
    pub waste_period: Option<bool>,
    /// Recommendation, once decided.
    pub decision: Option<DecisionLabel>,
}

impl From<&Record> for RecordRow {
    fn from(r: &Record) -> Self {
        Self {
            timestamp: r.timestamp,
            consumption_kw: r.consumption_kw,
            predicted_power_kw: r.predicted_power_kw,
            pattern: r.consumption_pattern,
            waste_period: r.waste_period,
            decision: r.energy_decision,
        }
    }
}

/// The first rows of a record set, printable as an aligned table.
///
/// Columns that have not been derived yet print as `-`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordTable {
    /// Rows shown, in record order.
    pub rows: Vec<RecordRow>,
    /// Records not shown.
    pub omitted: usize,
}

impl RecordTable {
    /// Takes at most `limit` leading records.
    pub fn head(records: &[Record], limit: usize) -> Self {
        let shown = limit.min(records.len());
        Self {
            rows: records[..shown].iter().map(RecordRow::from).collect(),
            omitted: records.len() - shown,
        }
    }
}

fn or_dash<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl fmt::Display for RecordTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<19}  {:>11}  {:>12}  {:<12}  {:<5}  decision",
            "timestamp", "consumption", "predicted_kw", "pattern", "waste"
        )?;
        for row in &self.rows {
            write!(
                f,
                "\n{:<19}  {:>11.3}  {:>12}  {:<12}  {:<5}  {}",
                row.timestamp.format(TIMESTAMP_FORMAT),
                row.consumption_kw,
                or_dash(row.predicted_power_kw.map(|p| format!("{p:.3}"))),
                or_dash(row.pattern),
                or_dash(row.waste_period),
                or_dash(row.decision),
            )?;
        }
        if self.omitted > 0 {
            write!(f, "\n... {} more records", self.omitted)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    use super::*;
    use crate::dispatch::WhatIf;

    fn record(hour: i64, power: f64, consumption: f64) -> Record {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Record::new(start + Duration::hours(hour), power, consumption)
    }

    #[test]
    fn base_totals_sum_columns() {
        let mut records = vec![record(0, 1.0, 2.0), record(1, 3.0, 1.5)];
        let totals = BaseTotals::from_records(&records, 1.0);
        assert_relative_eq!(totals.solar_kwh, 4.0);
        assert_relative_eq!(totals.consumption_kwh, 3.5);
        assert_eq!(totals.predicted_kwh, None);

        records[0].predicted_power_kw = Some(0.5);
        records[1].predicted_power_kw = Some(2.5);
        let totals = BaseTotals::from_records(&records, 0.5);
        assert_relative_eq!(totals.predicted_kwh.unwrap(), 1.5);
        assert_relative_eq!(totals.solar_kwh, 2.0);
    }

    #[test]
    fn partial_predictions_give_no_total() {
        let mut records = vec![record(0, 1.0, 2.0), record(1, 3.0, 1.5)];
        records[0].predicted_power_kw = Some(0.5);
        assert_eq!(BaseTotals::from_records(&records, 1.0).predicted_kwh, None);
    }

    #[test]
    fn co2_uses_emission_factor() {
        assert_relative_eq!(co2_saved_kg(100.0, 0.82), 82.0);
    }

    #[test]
    fn report_advises_import_on_deficit() {
        let base = BaseTotals {
            records: 2,
            solar_kwh: 30.0,
            consumption_kwh: 80.0,
            predicted_kwh: None,
        };
        let outcome = WhatIf::default()
            .evaluate(&base.energy_totals().unwrap())
            .unwrap();
        let report = DispatchReport::new(base, outcome, 0.82);
        assert_eq!(
            report.grid_advisory(),
            Some("Remaining energy demand must be supplied by the grid.")
        );
        let text = report.to_string();
        assert!(text.contains("Battery keeps 20% minimum charge (10.00 kWh reserved)."));
        assert!(text.contains("24.60 kg"));
    }

    #[test]
    fn balanced_dispatch_has_no_advisory() {
        let base = BaseTotals {
            records: 2,
            solar_kwh: 100.0,
            consumption_kwh: 80.0,
            predicted_kwh: Some(95.0),
        };
        let outcome = WhatIf::default()
            .evaluate(&base.energy_totals().unwrap())
            .unwrap();
        let report = DispatchReport::new(base, outcome, 0.82);
        assert_eq!(report.grid_advisory(), None);
        assert!(report.to_string().contains("Total predicted solar:   95.00 kWh"));
    }

    #[test]
    fn pattern_summary_collects_waste_hours() {
        let mut records: Vec<Record> = (0..4).map(|h| record(h, 1.0, 1.0)).collect();
        records.push(record(25, 1.0, 1.0));
        records[0].consumption_pattern = Some(ConsumptionPattern::PeakUsage);
        records[1].consumption_pattern = Some(ConsumptionPattern::LowUsage);
        records[1].waste_period = Some(true);
        records[2].consumption_pattern = Some(ConsumptionPattern::NormalUsage);
        records[4].consumption_pattern = Some(ConsumptionPattern::LowUsage);
        records[4].waste_period = Some(true);

        let s = PatternSummary::from_records(&records);
        assert_eq!((s.peak, s.low, s.normal, s.waste), (1, 2, 1, 2));
        assert_eq!(s.waste_hours, vec![1]);
        assert!(s.to_string().contains("(at 01:00)"));
    }

    #[test]
    fn record_table_shows_head_with_derived_columns() {
        let mut records: Vec<Record> = (0..4).map(|h| record(h, 1.0, 0.5 + h as f64)).collect();
        records[0].predicted_power_kw = Some(2.25);
        records[0].consumption_pattern = Some(ConsumptionPattern::LowUsage);
        records[0].waste_period = Some(true);
        records[0].energy_decision = Some(DecisionLabel::ShiftLoad);

        let table = RecordTable::head(&records, 2);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.omitted, 2);

        let text = table.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("timestamp"));
        assert!(lines[1].starts_with("2024-06-01 00:00:00"));
        assert!(lines[1].contains("2.250"));
        assert!(lines[1].contains("LOW_USAGE"));
        assert!(lines[1].contains("true"));
        assert!(lines[1].ends_with(DecisionLabel::ShiftLoad.message()));
        // not yet derived
        assert!(lines[2].ends_with("-"));
        assert_eq!(lines[3], "... 2 more records");
    }

    #[test]
    fn record_table_limit_past_end_shows_everything() {
        let records: Vec<Record> = (0..3).map(|h| record(h, 1.0, 1.0)).collect();
        let table = RecordTable::head(&records, 10);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.omitted, 0);
        assert!(!table.to_string().contains("more records"));
    }

    #[test]
    fn decision_summary_counts_labels() {
        let mut records: Vec<Record> = (0..3).map(|h| record(h, 1.0, 1.0)).collect();
        records[0].energy_decision = Some(DecisionLabel::Monitor);
        records[1].energy_decision = Some(DecisionLabel::Monitor);
        records[2].energy_decision = Some(DecisionLabel::Balanced);
        let s = DecisionSummary::from_records(&records);
        assert_eq!(s.count(DecisionLabel::Monitor), 2);
        assert_eq!(s.count(DecisionLabel::Balanced), 1);
        assert_eq!(s.count(DecisionLabel::ShiftLoad), 0);
        assert_eq!(s.counts.len(), 5);
    }
}
