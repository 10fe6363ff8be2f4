//! # REST API Interface Layer
//!
//! HTTP endpoints for the three dashboards. This layer handles request
//! deserialization, input validation, error translation to status codes,
//! and request logging - a pure translation layer without business logic.
//!
//! Error convention: validation problems are 400, domain failures are 500,
//! and "no data" is a 200 whose payload carries an informational message.

pub mod air_apis;
pub mod meal_apis;
pub mod upload_apis;
