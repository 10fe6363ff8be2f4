//! Air-quality API client (AirKorea real-time station measurements).
//!
//! One GET per (station, row count) pair; results are memoized for the
//! process lifetime. Numeric fields arrive as strings and use "-" (or an
//! empty string) for missing values, which map to None rather than zero.

use log::warn;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use shared::AirReading;

use super::{FetchError, Memo};

const API_URL: &str =
    "http://apis.data.go.kr/B552584/ArpltnInforInqireSvc/getMsrstnAcctoRltmMesureDnsty";

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// One reading as the API reports it, all fields stringly typed
#[derive(Debug, Deserialize)]
struct RawAirItem {
    #[serde(rename = "dataTime")]
    data_time: Option<String>,
    #[serde(rename = "pm10Value")]
    pm10: Option<String>,
    #[serde(rename = "pm25Value")]
    pm25: Option<String>,
    #[serde(rename = "o3Value")]
    o3: Option<String>,
    #[serde(rename = "no2Value")]
    no2: Option<String>,
    #[serde(rename = "coValue")]
    co: Option<String>,
    #[serde(rename = "so2Value")]
    so2: Option<String>,
    #[serde(rename = "khaiValue")]
    khai: Option<String>,
}

/// Parse one stringly numeric field; "-" and blanks are missing values
fn parse_value(field: &Option<String>) -> Option<f64> {
    field.as_deref().and_then(|s| s.trim().parse::<f64>().ok())
}

/// Pull the reading rows out of `response.body.items`
fn extract_readings(body: &serde_json::Value) -> Result<Vec<AirReading>, FetchError> {
    let items = body
        .get("response")
        .and_then(|r| r.get("body"))
        .and_then(|b| b.get("items"))
        .ok_or_else(|| FetchError::Shape("response.body.items missing".to_string()))?;

    let raw_items: Vec<RawAirItem> = serde_json::from_value(items.clone())
        .map_err(|e| FetchError::Shape(format!("items array: {e}")))?;

    Ok(raw_items
        .into_iter()
        .map(|item| AirReading {
            data_time: item.data_time.unwrap_or_default(),
            pm10: parse_value(&item.pm10),
            pm25: parse_value(&item.pm25),
            o3: parse_value(&item.o3),
            no2: parse_value(&item.no2),
            co: parse_value(&item.co),
            so2: parse_value(&item.so2),
            khai: parse_value(&item.khai),
        })
        .collect())
}

/// Client for the station measurement endpoint
pub struct AirQualityClient {
    client: Client,
    service_key: String,
    cache: Memo<(String, u32), Vec<AirReading>>,
}

impl AirQualityClient {
    pub fn new(service_key: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            service_key: service_key.to_string(),
            cache: Memo::new(),
        })
    }

    /// Fetch recent readings for one station, most recent first.
    /// Failures surface as an empty vec; results are cached per
    /// (station, rows) for the process lifetime.
    pub async fn fetch_readings(&self, station: &str, rows: u32) -> Vec<AirReading> {
        let key = (station.to_string(), rows);
        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }

        let readings = match self.request_readings(station, rows).await {
            Ok(readings) => readings,
            Err(e) => {
                warn!(
                    "Air-quality fetch for station {} failed, treating as no data: {}",
                    station, e
                );
                Vec::new()
            }
        };

        self.cache.put(key, readings.clone());
        readings
    }

    async fn request_readings(
        &self,
        station: &str,
        rows: u32,
    ) -> Result<Vec<AirReading>, FetchError> {
        let rows = rows.to_string();
        let response = self
            .client
            .get(API_URL)
            .query(&[
                ("serviceKey", self.service_key.as_str()),
                ("returnType", "json"),
                ("numOfRows", rows.as_str()),
                ("pageNo", "1"),
                ("stationName", station),
                ("dataTerm", "3MONTH"),
                ("ver", "1.0"),
            ])
            .send()
            .await?;

        let body: serde_json::Value = response.json().await?;
        extract_readings(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_items_and_parses_values() {
        let body = serde_json::json!({
            "response": {
                "body": {
                    "items": [{
                        "dataTime": "2024-01-01 14:00",
                        "pm10Value": "45",
                        "pm25Value": "22",
                        "o3Value": "0.031",
                        "no2Value": "-",
                        "coValue": "0.5",
                        "so2Value": "",
                        "khaiValue": "78"
                    }]
                }
            }
        });

        let readings = extract_readings(&body).unwrap();
        assert_eq!(readings.len(), 1);
        let r = &readings[0];
        assert_eq!(r.data_time, "2024-01-01 14:00");
        assert_eq!(r.pm10, Some(45.0));
        assert_eq!(r.o3, Some(0.031));
        assert_eq!(r.no2, None); // "-" is a missing value, not zero
        assert_eq!(r.so2, None);
        assert_eq!(r.khai, Some(78.0));
    }

    #[test]
    fn missing_items_is_a_shape_error() {
        let body = serde_json::json!({"response": {"header": {"resultCode": "99"}}});
        assert!(extract_readings(&body).is_err());
    }
}
