//! Flat tabular record store: the twin's shared state between pipeline runs.
//!
//! Records are keyed by timestamp. Raw observations (`power_kw`,
//! `consumption_kw`, weather) are read once; every pipeline stage annotates
//! the same records with a derived column and the store writes them back.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::classify::ConsumptionPattern;
use crate::decision::DecisionLabel;
use crate::error::{Result, TwinError};

/// Timestamp layout used when writing records.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepted timestamp layouts when reading records, tried in order.
const TIMESTAMP_INPUT_FORMATS: [&str; 3] = [TIMESTAMP_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Columns every store must provide.
const REQUIRED_COLUMNS: [&str; 3] = ["timestamp", "power_kw", "consumption_kw"];

/// One time-stamped observation plus the columns derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Observation time.
    pub timestamp: NaiveDateTime,
    /// Measured solar power (kW).
    pub power_kw: f64,
    /// Measured consumption (kW).
    pub consumption_kw: f64,
    /// Sunlight index in [0, 1].
    pub sunlight_index: Option<f64>,
    /// Ambient temperature (°C).
    pub temperature_c: Option<f64>,
    /// Forecast solar power (kW), set by the forecast stage.
    pub predicted_power_kw: Option<f64>,
    /// Usage class, set by the classifier stage.
    pub consumption_pattern: Option<ConsumptionPattern>,
    /// Low usage during good sunlight, set by the classifier stage.
    pub waste_period: Option<bool>,
    /// Recommendation, set by the decision stage.
    pub energy_decision: Option<DecisionLabel>,
}

impl Record {
    /// Creates a record with raw measurements only.
    pub fn new(timestamp: NaiveDateTime, power_kw: f64, consumption_kw: f64) -> Self {
        Self {
            timestamp,
            power_kw,
            consumption_kw,
            sunlight_index: None,
            temperature_c: None,
            predicted_power_kw: None,
            consumption_pattern: None,
            waste_period: None,
            energy_decision: None,
        }
    }

    /// Attaches weather observations.
    #[must_use]
    pub fn with_weather(mut self, sunlight_index: f64, temperature_c: f64) -> Self {
        self.sunlight_index = Some(sunlight_index);
        self.temperature_c = Some(temperature_c);
        self
    }

    /// Returns the sunlight index or [`TwinError::MissingData`].
    pub fn sunlight(&self) -> Result<f64> {
        self.sunlight_index.ok_or(TwinError::MissingData {
            column: "sunlight_index",
        })
    }

    /// Returns the temperature or [`TwinError::MissingData`].
    pub fn temperature(&self) -> Result<f64> {
        self.temperature_c.ok_or(TwinError::MissingData {
            column: "temperature_c",
        })
    }

    /// Returns the forecast power or [`TwinError::MissingData`].
    pub fn predicted(&self) -> Result<f64> {
        self.predicted_power_kw.ok_or(TwinError::MissingData {
            column: "predicted_power_kw",
        })
    }

    /// Returns the usage class or [`TwinError::MissingData`].
    pub fn pattern(&self) -> Result<ConsumptionPattern> {
        self.consumption_pattern.ok_or(TwinError::MissingData {
            column: "consumption_pattern",
        })
    }

    /// Returns the waste flag or [`TwinError::MissingData`].
    pub fn waste(&self) -> Result<bool> {
        self.waste_period.ok_or(TwinError::MissingData {
            column: "waste_period",
        })
    }
}

/// A pluggable source and sink of records.
pub trait RecordStore {
    /// Reads every record in timestamp order as stored.
    ///
    /// # Errors
    ///
    /// Returns [`TwinError::MissingData`] if a required column is absent, or
    /// an I/O / decoding error.
    fn load_records(&self) -> Result<Vec<Record>>;

    /// Replaces the stored records.
    ///
    /// # Errors
    ///
    /// Returns an I/O or encoding error.
    fn save_records(&mut self, records: &[Record]) -> Result<()>;
}

/// Record store backed by a CSV file.
#[derive(Debug, Clone)]
pub struct CsvRecordStore {
    path: PathBuf,
}

impl CsvRecordStore {
    /// Creates a store reading and writing `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> TwinError {
        TwinError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl RecordStore for CsvRecordStore {
    fn load_records(&self) -> Result<Vec<Record>> {
        let file = File::open(&self.path).map_err(|e| self.io_error(e))?;
        let records = read_records(io::BufReader::new(file))?;
        tracing::debug!(path = %self.path.display(), count = records.len(), "loaded records");
        Ok(records)
    }

    fn save_records(&mut self, records: &[Record]) -> Result<()> {
        let file = File::create(&self.path).map_err(|e| self.io_error(e))?;
        write_records(records, io::BufWriter::new(file))?;
        tracing::debug!(path = %self.path.display(), count = records.len(), "saved records");
        Ok(())
    }
}

/// Record store held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    /// Current contents.
    pub records: Vec<Record>,
}

impl InMemoryStore {
    /// Creates a store seeded with `records`.
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }
}

impl RecordStore for InMemoryStore {
    fn load_records(&self) -> Result<Vec<Record>> {
        Ok(self.records.clone())
    }

    fn save_records(&mut self, records: &[Record]) -> Result<()> {
        self.records = records.to_vec();
        Ok(())
    }
}

/// CSV row layout. Derived columns may be absent or empty.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    timestamp: String,
    power_kw: f64,
    #[serde(default)]
    predicted_power_kw: Option<f64>,
    consumption_kw: f64,
    #[serde(default)]
    sunlight_index: Option<f64>,
    #[serde(default)]
    temperature_c: Option<f64>,
    #[serde(default)]
    consumption_pattern: Option<String>,
    #[serde(default)]
    waste_period: Option<String>,
    #[serde(default)]
    energy_decision: Option<String>,
}

impl CsvRow {
    fn into_record(self, row: usize) -> Result<Record> {
        let timestamp = parse_timestamp(&self.timestamp, row)?;
        let consumption_pattern = self
            .consumption_pattern
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<ConsumptionPattern>()
                    .map_err(|()| TwinError::UnknownLabel {
                        kind: "consumption pattern",
                        value: s,
                        row,
                    })
            })
            .transpose()?;
        let waste_period = self
            .waste_period
            .filter(|s| !s.is_empty())
            .map(|s| {
                parse_flag(&s).ok_or(TwinError::UnknownLabel {
                    kind: "waste flag",
                    value: s,
                    row,
                })
            })
            .transpose()?;
        let energy_decision = self
            .energy_decision
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<DecisionLabel>()
                    .map_err(|()| TwinError::UnknownLabel {
                        kind: "energy decision",
                        value: s,
                        row,
                    })
            })
            .transpose()?;

        Ok(Record {
            timestamp,
            power_kw: self.power_kw,
            consumption_kw: self.consumption_kw,
            sunlight_index: self.sunlight_index,
            temperature_c: self.temperature_c,
            predicted_power_kw: self.predicted_power_kw,
            consumption_pattern,
            waste_period,
            energy_decision,
        })
    }

    fn from_record(r: &Record) -> Self {
        Self {
            timestamp: r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            power_kw: r.power_kw,
            predicted_power_kw: r.predicted_power_kw,
            consumption_kw: r.consumption_kw,
            sunlight_index: r.sunlight_index,
            temperature_c: r.temperature_c,
            consumption_pattern: r.consumption_pattern.map(|p| p.code().to_string()),
            waste_period: r.waste_period.map(|w| w.to_string()),
            energy_decision: r.energy_decision.map(|d| d.code().to_string()),
        }
    }
}

/// Reads records from any CSV source.
///
/// # Errors
///
/// Returns [`TwinError::MissingData`] when `timestamp`, `power_kw` or
/// `consumption_kw` is not among the headers.
pub fn read_records(reader: impl Read) -> Result<Vec<Record>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(TwinError::MissingData { column });
        }
    }

    let mut records = Vec::new();
    for (i, row) in rdr.deserialize::<CsvRow>().enumerate() {
        records.push(row?.into_record(i + 1)?);
    }
    Ok(records)
}

/// Writes records as CSV to any sink.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_records(records: &[Record], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    for r in records {
        wtr.serialize(CsvRow::from_record(r))?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn parse_timestamp(value: &str, row: usize) -> Result<NaiveDateTime> {
    TIMESTAMP_INPUT_FORMATS
        .iter()
        .skip(1)
        .fold(
            NaiveDateTime::parse_from_str(value, TIMESTAMP_INPUT_FORMATS[0]),
            |acc, fmt| acc.or_else(|_| NaiveDateTime::parse_from_str(value, fmt)),
        )
        .map_err(|source| TwinError::Timestamp {
            row,
            value: value.to_string(),
            source,
        })
}

/// Accepts both Rust and pandas spellings of booleans.
fn parse_flag(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" | "1" => Some(true),
        "false" | "False" | "FALSE" | "0" => Some(false),
        _ => None,
    }
}
