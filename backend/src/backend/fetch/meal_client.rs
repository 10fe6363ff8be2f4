//! NEIS school meal API client.
//!
//! One GET per date against `mealServiceDietInfo`. The interesting part of
//! the response is nested: the `mealServiceDietInfo` top-level key holds an
//! array whose second element carries the `row` array of meal records. A
//! missing key means the date simply has no meal service (holidays,
//! vacation) and is not an error.

use async_trait::async_trait;
use chrono::NaiveDate;
use log::warn;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use shared::DailyMealRecord;

use super::{FetchError, MealSource};

const API_URL: &str = "https://open.neis.go.kr/hub/mealServiceDietInfo";

/// Per-request timeout, matching the upstream's slow but bounded responses
const REQUEST_TIMEOUT_SECS: u64 = 4;

/// One meal row as the API reports it
#[derive(Debug, Deserialize)]
struct RawMealRow {
    #[serde(rename = "MMEAL_SC_NM")]
    meal_name: String,
    #[serde(rename = "DDISH_NM")]
    dish_listing: String,
    #[serde(rename = "NTR_INFO")]
    nutrition_annotation: Option<String>,
}

/// Pull the meal rows out of the nested response body.
/// Absence of the top-level key is "no rows", not a shape error.
fn extract_records(
    body: &serde_json::Value,
    date: NaiveDate,
) -> Result<Vec<DailyMealRecord>, FetchError> {
    let Some(info) = body.get("mealServiceDietInfo") else {
        return Ok(Vec::new());
    };

    let rows = info
        .get(1)
        .and_then(|section| section.get("row"))
        .ok_or_else(|| FetchError::Shape("mealServiceDietInfo[1].row missing".to_string()))?;

    let raw_rows: Vec<RawMealRow> = serde_json::from_value(rows.clone())
        .map_err(|e| FetchError::Shape(format!("row array: {e}")))?;

    Ok(raw_rows
        .into_iter()
        .map(|row| DailyMealRecord {
            date,
            meal_name: row.meal_name,
            dish_listing: row.dish_listing,
            nutrition_annotation: row.nutrition_annotation,
        })
        .collect())
}

/// Client for the NEIS meal service endpoint
pub struct NeisMealClient {
    client: Client,
    authority_code: String,
    school_code: String,
}

impl NeisMealClient {
    pub fn new(authority_code: &str, school_code: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            authority_code: authority_code.to_string(),
            school_code: school_code.to_string(),
        })
    }

    async fn request_day(&self, date: NaiveDate) -> Result<Vec<DailyMealRecord>, FetchError> {
        let ymd = date.format("%Y%m%d").to_string();
        let response = self
            .client
            .get(API_URL)
            .query(&[
                ("ATPT_OFCDC_SC_CODE", self.authority_code.as_str()),
                ("SD_SCHUL_CODE", self.school_code.as_str()),
                ("Type", "json"),
                ("MLSV_YMD", ymd.as_str()),
            ])
            .send()
            .await?;

        let body: serde_json::Value = response.json().await?;
        extract_records(&body, date)
    }
}

#[async_trait]
impl MealSource for NeisMealClient {
    async fn fetch_day(&self, date: NaiveDate) -> Vec<DailyMealRecord> {
        match self.request_day(date).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Meal fetch for {} failed, treating as no data: {}", date, e);
                Vec::new()
            }
        }
    }
}
