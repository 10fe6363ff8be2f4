//! # Domain Module
//!
//! Contains all business logic for the dashboard backend.
//!
//! ## Module Organization
//!
//! - **nutrition**: Nutrition annotation parsing and dish-line formatting
//! - **meal_service**: Day view, month aggregation, trend pivot, CSV export
//! - **air_service**: Pollutant classification, time normalization, gauges
//! - **upload_service**: Uploaded tabular data parsing and chart series
//!
//! ## Business Rules
//!
//! - Aggregation is restricted to the fixed three-nutrient allow-list
//! - Unparseable segments are dropped, never zero-filled
//! - Duplicate (date, nutrient) readings are summed before charting
//! - A failed upstream fetch is indistinguishable from "no data"

pub mod air_service;
pub mod meal_service;
pub mod nutrition;
pub mod upload_service;

pub use air_service::AirService;
pub use meal_service::MealService;
pub use upload_service::UploadService;
