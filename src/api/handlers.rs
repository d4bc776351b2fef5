//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;

use super::AppState;
use super::types::{ErrorResponse, RecordQuery, SimulateQuery, SummaryResponse};
use crate::record::Record;
use crate::report::DispatchReport;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: String) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))
}

/// `GET /summary` → 200 + `SummaryResponse` JSON
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<SummaryResponse> {
    Json(SummaryResponse {
        base: state.base,
        patterns: state.patterns.clone(),
        decisions: state.decisions.clone(),
        defaults: state.defaults,
    })
}

/// Returns records, optionally filtered by row range.
///
/// `GET /records` → 200 + `Vec<Record>` JSON
/// `GET /records?from=N&to=M` → rows N..=M
/// `GET /records?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_records(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecordQuery>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err(bad_request(format!("`from` ({from}) must be <= `to` ({to})")));
    }

    let records: Vec<Record> = state
        .records
        .iter()
        .enumerate()
        .filter(|(i, _)| (from..=to).contains(i))
        .map(|(_, r)| r.clone())
        .collect();

    Ok(Json(records))
}

/// Evaluates one what-if from query parameters.
///
/// `GET /simulate?capacity_kwh=…&min_soc_pct=…` → 200 + `DispatchReport` JSON
/// Invalid or malformed parameters → 400 + `ErrorResponse` naming the parameter
pub async fn get_simulate(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SimulateQuery>, QueryRejection>,
) -> Result<Json<DispatchReport>, ApiError> {
    let Query(query) = query.map_err(|e| bad_request(e.body_text()))?;
    let what_if = query.apply(state.defaults);
    let outcome = what_if
        .evaluate(&state.base_energy)
        .map_err(|e| bad_request(e.to_string()))?;
    Ok(Json(DispatchReport::new(
        state.base,
        outcome,
        state.emission_factor_kg_per_kwh,
    )))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{Duration, NaiveDate};
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;
    use crate::config::TwinConfig;

    fn make_test_state() -> Arc<AppState> {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        // 24 rows: 100 kWh solar, 80 kWh load in total
        let records = (0..24)
            .map(|h| Record::new(start + Duration::hours(h), 100.0 / 24.0, 80.0 / 24.0))
            .collect();
        Arc::new(AppState::new(records, &TwinConfig::baseline()).unwrap())
    }

    async fn get(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = router(make_test_state());
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn summary_returns_200() {
        let (status, json) = get("/summary").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["base"]["records"], 24);
        assert!(json.get("patterns").is_some());
        assert_eq!(json["defaults"]["battery"]["capacity_kwh"], 50.0);
    }

    #[tokio::test]
    async fn records_range_query() {
        let (status, json) = get("/records?from=5&to=10").await;
        assert_eq!(status, StatusCode::OK);
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0]["timestamp"], "2024-06-01T05:00:00");
    }

    #[tokio::test]
    async fn records_invalid_range_returns_400() {
        let (status, json) = get("/records?from=10&to=5").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json.get("error").is_some());
    }

    #[tokio::test]
    async fn simulate_with_defaults() {
        let (status, json) = get("/simulate").await;
        assert_eq!(status, StatusCode::OK);
        let d = &json["outcome"]["dispatch"];
        let soc = d["final_state_of_charge_kwh"].as_f64().unwrap();
        assert!((soc - 45.0).abs() < 1e-9);
        assert_eq!(d["discharge_was_capped"], false);
    }

    #[tokio::test]
    async fn simulate_invalid_capacity_returns_400() {
        let (status, json) = get("/simulate?capacity_kwh=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("capacityKWh"));
    }

    #[tokio::test]
    async fn simulate_malformed_parameter_returns_400() {
        let (status, json) = get("/simulate?capacity_kwh=lots").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json.get("error").is_some());
    }
}
