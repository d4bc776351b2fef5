//! Crate-wide error type.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = TwinError> = std::result::Result<T, E>;

/// Errors raised by the twin's pipeline stages and the dispatch simulator.
#[derive(Debug, Error)]
pub enum TwinError {
    /// A battery or scenario parameter is outside its declared domain.
    ///
    /// Raised before any computation; values are never clamped.
    #[error("invalid configuration: {parameter} = {value}, expected {expected}")]
    InvalidConfiguration {
        /// Name of the offending parameter (e.g. `capacityKWh`).
        parameter: &'static str,
        /// The rejected value.
        value: f64,
        /// Human-readable valid range.
        expected: &'static str,
    },

    /// The record store lacks a column a stage depends on.
    #[error("missing data: column `{column}` is required but absent")]
    MissingData {
        /// Column name as it appears in the record store.
        column: &'static str,
    },

    /// The forecast model cannot be fitted from the available records.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// A timestamp cell could not be parsed.
    #[error("invalid timestamp `{value}` in row {row}")]
    Timestamp {
        /// 1-based data row (header excluded).
        row: usize,
        /// Raw cell content.
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A configured calendar date could not be parsed.
    #[error("invalid date `{value}`, expected YYYY-MM-DD")]
    Date {
        /// Raw configured value.
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A categorical cell holds an unknown label.
    #[error("unknown {kind} `{value}` in row {row}")]
    UnknownLabel {
        /// Column kind (e.g. `consumption pattern`).
        kind: &'static str,
        /// Raw cell content.
        value: String,
        /// 1-based data row (header excluded).
        row: usize,
    },

    /// File access failed.
    #[error("cannot access \"{}\"", path.display())]
    Io {
        /// Path being read or written.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV encoding or decoding failed.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl TwinError {
    /// Builds an [`TwinError::InvalidConfiguration`].
    pub fn invalid(parameter: &'static str, value: f64, expected: &'static str) -> Self {
        Self::InvalidConfiguration {
            parameter,
            value,
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_configuration_names_parameter_and_range() {
        let err = TwinError::invalid("capacityKWh", 0.0, "> 0");
        let msg = err.to_string();
        assert!(msg.contains("capacityKWh"));
        assert!(msg.contains("> 0"));
    }

    #[test]
    fn missing_data_names_column() {
        let err = TwinError::MissingData {
            column: "sunlight_index",
        };
        assert!(err.to_string().contains("sunlight_index"));
    }
}
