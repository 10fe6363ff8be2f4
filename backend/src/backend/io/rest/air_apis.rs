use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::info;
use serde::Deserialize;

use crate::backend::AppState;

/// Query parameters for the air-quality APIs
#[derive(Debug, Deserialize)]
pub struct StationQuery {
    /// Monitoring station name; the configured default when omitted
    pub station: Option<String>,
}

/// Create a router for air-quality related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/export", get(export_csv))
}

/// Get the station's gauges, latest reading, and raw data table
async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<StationQuery>,
) -> impl IntoResponse {
    info!("GET /api/air/dashboard - query: {:?}", query);

    let station = query
        .station
        .unwrap_or_else(|| state.config.default_station.clone());

    let response = state
        .air_service
        .dashboard(&station, state.config.air_row_count)
        .await;
    (StatusCode::OK, Json(response)).into_response()
}

/// Download the station's raw readings as CSV
async fn export_csv(
    State(state): State<AppState>,
    Query(query): Query<StationQuery>,
) -> impl IntoResponse {
    info!("GET /api/air/export - query: {:?}", query);

    let station = query
        .station
        .unwrap_or_else(|| state.config.default_station.clone());

    let export = state
        .air_service
        .export_csv(&station, state.config.air_row_count)
        .await;
    (StatusCode::OK, Json(export)).into_response()
}
