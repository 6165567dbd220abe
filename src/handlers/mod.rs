/// HTTP request handlers
use crate::domain::{DateRange, Health, HistoryReport, LookupHit, SnapshotView};
use crate::errors::{ApiError, ApiResult};
use crate::services::{FlightLookup, HistoryService, SnapshotCache, StatusService};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub snapshot_cache: Arc<SnapshotCache>,
    pub lookup: Arc<FlightLookup>,
    pub history: Arc<HistoryService>,
    pub status: Arc<StatusService>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub date: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

fn parse_date(field: &str, value: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::InvalidInput(format!("{} must be YYYY-MM-DD, got '{}'", field, value)))
}

/// Resolve request parameters to a range: start+end, date..today, or the last 14 days
pub fn resolve_range(params: &HistoryParams, today: NaiveDate) -> ApiResult<DateRange> {
    match (&params.start, &params.end, &params.date) {
        (Some(start), Some(end), _) => {
            DateRange::new(parse_date("start", start)?, parse_date("end", end)?)
        }
        (Some(_), None, _) | (None, Some(_), _) => Err(ApiError::InvalidInput(
            "start and end must be given together".into(),
        )),
        (None, None, Some(date)) => DateRange::new(parse_date("date", date)?, today),
        (None, None, None) => Ok(DateRange::trailing(today)),
    }
}

/// All live flights plus statistics
pub async fn all_flights(State(state): State<AppState>) -> ApiResult<Json<SnapshotView>> {
    let view = state.snapshot_cache.get().await?;
    Ok(Json(view))
}

/// Find one flight by callsign fragment or aircraft id
pub async fn search_flight(
    Query(params): Query<SearchParams>,
    State(state): State<AppState>,
) -> ApiResult<Json<LookupHit>> {
    let term = params
        .query
        .ok_or_else(|| ApiError::InvalidInput("query parameter required".into()))?;
    let hit = state.lookup.find(&term).await?;
    Ok(Json(hit))
}

/// Flight history for one aircraft
pub async fn flight_history(
    Path(icao24): Path<String>,
    Query(params): Query<HistoryParams>,
    State(state): State<AppState>,
) -> ApiResult<Json<HistoryReport>> {
    let range = resolve_range(&params, Utc::now().date_naive())?;
    let report = state.history.fetch_history(&icao24, range).await?;
    Ok(Json(report))
}

/// Liveness probe
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<Health>> {
    let health = state.status.probe().await?;
    Ok(Json(health))
}

/// Example API calls
pub async fn examples() -> Json<Value> {
    Json(serde_json::json!({
        "message": "Example API calls (AviationStack)",
        "examples": [
            {"name": "All live flights", "url": "/api/flights/all"},
            {"name": "Search a flight", "url": "/api/flight/search?query=AA100"},
            {"name": "History (last 2 weeks)", "url": "/api/flight/history/3c6444"},
            {"name": "History (range)", "url": "/api/flight/history/3c6444?start=2024-01-01&end=2024-01-03"}
        ]
    }))
}

/// Fallback for unknown API routes
pub async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"ok": false, "error": {"code": "NOT_FOUND", "message": "Endpoint not found"}})),
    )
}
