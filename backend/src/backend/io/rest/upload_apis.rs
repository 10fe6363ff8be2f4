use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::post,
    Router,
};
use log::{info, warn};

use crate::backend::AppState;
use shared::ChartRequest;

/// Create a router for uploaded-table APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/table", post(describe_table))
        .route("/chart", post(build_chart))
}

/// Describe an uploaded CSV: column kinds, preview, row count.
/// The request body is the raw file text.
async fn describe_table(State(state): State<AppState>, body: String) -> impl IntoResponse {
    info!("POST /api/upload/table - {} bytes", body.len());

    match state.upload_service.describe_table(&body) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            warn!("Rejected upload: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

/// Build one chart of the uploaded table against the chosen columns
async fn build_chart(
    State(state): State<AppState>,
    Json(request): Json<ChartRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/upload/chart - kind: {:?}, x: {}, y: {}",
        request.kind, request.x_column, request.y_column
    );

    match state.upload_service.chart(&request) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            warn!("Rejected chart request: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}
