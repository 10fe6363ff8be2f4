//! # Backend Module
//!
//! Contains all non-UI logic for the school dashboard application.
//!
//! This module serves as the orchestration layer that brings together:
//! - **Fetch**: Upstream API clients (school meal service, air-quality service)
//! - **Domain**: Parsing, aggregation, and classification business logic
//! - **IO**: REST interface layer that exposes functionality to the UI
//!
//! The backend is UI-agnostic: it emits plain structured series and strings,
//! and the chart/date-picker rendering layer consumes them over REST.
//!
//! ## Architecture
//!
//! ```text
//! UI Layer (charts, pickers, download buttons)
//!     ↓
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (parsers, aggregators, classifiers)
//!     ↓
//! Fetch Layer (upstream HTTP APIs, request-scoped caches)
//! ```

pub mod config;
pub mod domain;
pub mod fetch;
pub mod io;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use log::info;
use tower_http::cors::{Any, CorsLayer};

use crate::backend::config::AppConfig;
use crate::backend::domain::{AirService, MealService, UploadService};
use crate::backend::fetch::{air_client::AirQualityClient, meal_client::NeisMealClient};

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub meal_service: Arc<MealService>,
    pub air_service: Arc<AirService>,
    pub upload_service: Arc<UploadService>,
}

/// Initialize the backend with all required services
pub fn initialize_backend() -> Result<AppState> {
    let config = Arc::new(AppConfig::from_env());

    info!("Setting up upstream clients");
    let meal_client = NeisMealClient::new(&config.authority_code, &config.school_code)?;
    let air_client = AirQualityClient::new(&config.air_service_key)?;

    info!("Setting up domain services");
    let meal_service = Arc::new(MealService::new(Arc::new(meal_client)));
    let air_service = Arc::new(AirService::new(air_client));
    let upload_service = Arc::new(UploadService::new());

    Ok(AppState {
        config,
        meal_service,
        air_service,
        upload_service,
    })
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router {
    // CORS setup to allow frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:8080".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    // Set up our application routes
    let api_routes = Router::new()
        .nest("/meals", io::rest::meal_apis::router())
        .nest("/air", io::rest::air_apis::router())
        .nest("/upload", io::rest::upload_apis::router());

    // Define our main application router
    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state)
}
