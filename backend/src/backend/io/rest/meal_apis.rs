use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{Duration, Local, NaiveDate};
use log::{error, info};
use serde::Deserialize;

use crate::backend::AppState;

/// Earliest selectable date for the day view
const MIN_DATE: &str = "2020-01-01";

/// Days past today the date picker may reach (menus are published ahead)
const FUTURE_WINDOW_DAYS: i64 = 60;

/// Query parameters for the single-day meal view
#[derive(Debug, Deserialize)]
pub struct MealDayQuery {
    pub date: NaiveDate,
}

/// Query parameters for the monthly trend and export APIs
#[derive(Debug, Deserialize)]
pub struct MealMonthQuery {
    pub year: i32,
    pub month: u32,
}

/// Create a router for meal related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/day", get(get_meal_day))
        .route("/month", get(get_monthly_trend))
        .route("/month/export", get(export_monthly_csv))
}

/// The date window the UI's date picker is bounded to
fn validate_date(date: NaiveDate) -> Result<(), String> {
    // MIN_DATE is a valid literal, so this parse cannot fail
    let min = MIN_DATE.parse::<NaiveDate>().map_err(|e| e.to_string())?;
    let max = Local::now().date_naive() + Duration::days(FUTURE_WINDOW_DAYS);
    if date < min || date > max {
        return Err(format!("date must be between {} and {}", min, max));
    }
    Ok(())
}

/// Get the day's menu cards and nutrient bar chart
async fn get_meal_day(
    State(state): State<AppState>,
    Query(query): Query<MealDayQuery>,
) -> impl IntoResponse {
    info!("GET /api/meals/day - query: {:?}", query);

    if let Err(e) = validate_date(query.date) {
        return (StatusCode::BAD_REQUEST, e).into_response();
    }

    let response = state.meal_service.day_view(query.date).await;
    (StatusCode::OK, Json(response)).into_response()
}

/// Get the month's three-nutrient trend series
async fn get_monthly_trend(
    State(state): State<AppState>,
    Query(query): Query<MealMonthQuery>,
) -> impl IntoResponse {
    info!("GET /api/meals/month - query: {:?}", query);

    let table = match state.meal_service.aggregate_month(query.year, query.month).await {
        Ok(table) => table,
        Err(e) => {
            error!("Failed to aggregate month: {}", e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let trend = state.meal_service.monthly_trend(&table);
    (StatusCode::OK, Json(trend)).into_response()
}

/// Download the month's aggregated table as CSV
async fn export_monthly_csv(
    State(state): State<AppState>,
    Query(query): Query<MealMonthQuery>,
) -> impl IntoResponse {
    info!("GET /api/meals/month/export - query: {:?}", query);

    let table = match state.meal_service.aggregate_month(query.year, query.month).await {
        Ok(table) => table,
        Err(e) => {
            error!("Failed to aggregate month for export: {}", e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let export = state.meal_service.export_csv(&table);
    (StatusCode::OK, Json(export)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{create_router, initialize_backend};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    #[test]
    fn date_window_accepts_today_and_rejects_the_edges() {
        let today = Local::now().date_naive();
        assert!(validate_date(today).is_ok());
        assert!(validate_date(today + Duration::days(FUTURE_WINDOW_DAYS)).is_ok());
        assert!(validate_date(today + Duration::days(FUTURE_WINDOW_DAYS + 1)).is_err());
        assert!(validate_date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()).is_ok());
        assert!(validate_date(NaiveDate::from_ymd_opt(2019, 12, 31).unwrap()).is_err());
    }

    #[tokio::test]
    async fn out_of_range_date_is_a_bad_request() -> Result<(), Box<dyn std::error::Error>> {
        let app_state = initialize_backend()?;
        let app = create_router(app_state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/meals/day?date=2019-01-01")
                    .method(Method::GET)
                    .body(Body::empty())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn unparseable_date_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let app_state = initialize_backend()?;
        let app = create_router(app_state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/meals/day?date=20240304")
                    .method(Method::GET)
                    .body(Body::empty())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn invalid_month_is_a_bad_request() -> Result<(), Box<dyn std::error::Error>> {
        let app_state = initialize_backend()?;
        let app = create_router(app_state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/meals/month?year=2024&month=13")
                    .method(Method::GET)
                    .body(Body::empty())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
