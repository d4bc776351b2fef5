//! CSV export for dispatch parameter sweeps.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::dispatch::SweepPoint;
use crate::error::{Result, TwinError};

/// Column header for sweep export.
const HEADER: &str = "panel_increase_pct,solar_kwh,consumed_kwh,battery_charged_kwh,\
                      battery_discharged_kwh,grid_import_kwh,grid_export_kwh,\
                      final_soc_kwh,discharge_was_capped";

/// Exports sweep points to a CSV file at the given path.
///
/// Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns [`TwinError::Io`] if the file cannot be created, or a CSV error if
/// writing fails.
pub fn export_sweep_csv(points: &[SweepPoint], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|source| TwinError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_sweep_csv(points, io::BufWriter::new(file))
}

/// Writes sweep points as CSV to any writer.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_sweep_csv(points: &[SweepPoint], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for p in points {
        let t = &p.outcome.totals;
        let d = &p.outcome.dispatch;
        wtr.write_record(&[
            format!("{:.1}", p.panel_increase_pct),
            format!("{:.4}", t.solar_generated_kwh),
            format!("{:.4}", t.consumed_kwh),
            format!("{:.4}", d.battery_charged_kwh),
            format!("{:.4}", d.battery_discharged_kwh),
            format!("{:.4}", d.grid_import_kwh),
            format!("{:.4}", d.grid_export_kwh),
            format!("{:.4}", d.final_state_of_charge_kwh),
            d.discharge_was_capped.to_string(),
        ])?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}
