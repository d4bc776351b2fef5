//! REST API over a loaded record set and the what-if simulator.
//!
//! Provides three GET endpoints:
//! - `/summary`: base totals, usage patterns, decisions and default sliders
//! - `/records`: annotated records with optional row-range filtering
//! - `/simulate`: one what-if evaluation from query parameters

mod handlers;
mod types;

pub use types::{ErrorResponse, RecordQuery, SimulateQuery, SummaryResponse};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::config::TwinConfig;
use crate::dispatch::{EnergyTotals, WhatIf};
use crate::error::Result;
use crate::record::Record;
use crate::report::{BaseTotals, DecisionSummary, PatternSummary};

/// Immutable application state shared across all request handlers.
///
/// Built once from the loaded records and wrapped in `Arc`; no locks are
/// needed since all data is read-only.
#[derive(Debug)]
pub struct AppState {
    /// Records as loaded from the store.
    pub records: Vec<Record>,
    /// Totals before any scenario.
    pub base: BaseTotals,
    /// `base` as dispatch input.
    pub base_energy: EnergyTotals,
    /// Usage-class counts.
    pub patterns: PatternSummary,
    /// Recommendation counts.
    pub decisions: DecisionSummary,
    /// Slider values used for omitted query parameters.
    pub defaults: WhatIf,
    /// Grid emission factor (kg CO₂ per kWh).
    pub emission_factor_kg_per_kwh: f64,
}

impl AppState {
    /// Summarises `records` under `config`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::TwinError::InvalidConfiguration`] if the record
    /// totals are negative or non-finite.
    pub fn new(records: Vec<Record>, config: &TwinConfig) -> Result<Self> {
        let base = BaseTotals::from_records(&records, config.data.hours_per_record);
        let base_energy = base.energy_totals()?;
        Ok(Self {
            patterns: PatternSummary::from_records(&records),
            decisions: DecisionSummary::from_records(&records),
            records,
            base,
            base_energy,
            defaults: config.what_if(),
            emission_factor_kg_per_kwh: config.impact.emission_factor_kg_per_kwh,
        })
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/summary", get(handlers::get_summary))
        .route("/records", get(handlers::get_records))
        .route("/simulate", get(handlers::get_simulate))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process ends.
///
/// # Errors
///
/// Returns an I/O error if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
