//! Air-quality domain logic: pollutant status classification, measurement
//! time normalization, and the per-pollutant gauge view.

use log::info;

use shared::{AirDashboardResponse, AirReading, CsvExportResponse, PollutantGauge, PollutantStatus};

use crate::backend::fetch::air_client::AirQualityClient;

/// Fixed thresholds and metadata for one pollutant
struct PollutantSpec {
    name: &'static str,
    unit: &'static str,
    safe: f64,
    danger: f64,
    value: fn(&AirReading) -> Option<f64>,
}

/// The six pollutants shown as gauges, each with its own threshold pair
const POLLUTANTS: [PollutantSpec; 6] = [
    PollutantSpec {
        name: "미세먼지(PM10)",
        unit: "㎍/㎥",
        safe: 30.0,
        danger: 80.0,
        value: |r| r.pm10,
    },
    PollutantSpec {
        name: "초미세먼지(PM2.5)",
        unit: "㎍/㎥",
        safe: 15.0,
        danger: 35.0,
        value: |r| r.pm25,
    },
    PollutantSpec {
        name: "오존(O3)",
        unit: "ppm",
        safe: 0.03,
        danger: 0.09,
        value: |r| r.o3,
    },
    PollutantSpec {
        name: "이산화질소(NO2)",
        unit: "ppm",
        safe: 0.03,
        danger: 0.2,
        value: |r| r.no2,
    },
    PollutantSpec {
        name: "일산화탄소(CO)",
        unit: "ppm",
        safe: 2.0,
        danger: 9.0,
        value: |r| r.co,
    },
    PollutantSpec {
        name: "아황산가스(SO2)",
        unit: "ppm",
        safe: 0.02,
        danger: 0.15,
        value: |r| r.so2,
    },
];

/// Three-way threshold classification; missing values are Unknown.
pub fn classify(value: Option<f64>, safe: f64, danger: f64) -> PollutantStatus {
    match value {
        None => PollutantStatus::Unknown,
        Some(v) if v <= safe => PollutantStatus::Safe,
        Some(v) if v >= danger => PollutantStatus::Danger,
        Some(_) => PollutantStatus::Moderate,
    }
}

/// Normalize the upstream's "24:00" hour, which denotes midnight of the
/// following day, to "00:00" of that next day. Anything not matching
/// "YYYY-MM-DD 24:00" passes through unchanged.
pub fn fix_24hour_time(data_time: &str) -> String {
    let Some((date_part, time_part)) = data_time.split_once(' ') else {
        return data_time.to_string();
    };
    if time_part != "24:00" {
        return data_time.to_string();
    }
    match date_part.parse::<chrono::NaiveDate>().ok().and_then(|d| d.succ_opt()) {
        Some(next_day) => format!("{} 00:00", next_day.format("%Y-%m-%d")),
        None => data_time.to_string(),
    }
}

/// Build the dashboard view from already-fetched readings (pure).
pub fn build_dashboard(station: &str, mut readings: Vec<AirReading>) -> AirDashboardResponse {
    for reading in &mut readings {
        reading.data_time = fix_24hour_time(&reading.data_time);
    }

    let Some(latest) = readings.first().cloned() else {
        return AirDashboardResponse {
            station: station.to_string(),
            latest_time: None,
            khai: None,
            gauges: Vec::new(),
            readings,
            message: Some("측정소 데이터가 없습니다.".to_string()),
        };
    };

    let gauges = POLLUTANTS
        .iter()
        .map(|spec| {
            let value = (spec.value)(&latest);
            let status = classify(value, spec.safe, spec.danger);
            PollutantGauge {
                name: spec.name.to_string(),
                unit: spec.unit.to_string(),
                value,
                status,
                color: status.color().to_string(),
                // Donut filler: the ring is sized past the danger threshold
                remainder: value.map(|v| (spec.danger * 1.2).max(v * 1.5) - v),
            }
        })
        .collect();

    AirDashboardResponse {
        station: station.to_string(),
        latest_time: Some(latest.data_time.clone()),
        khai: latest.khai,
        gauges,
        readings,
        message: None,
    }
}

/// Air-quality service that fetches readings and builds the gauge view
pub struct AirService {
    client: AirQualityClient,
}

impl AirService {
    pub fn new(client: AirQualityClient) -> Self {
        Self { client }
    }

    /// Fetch the station's recent readings (cached per station and row
    /// count) and build the dashboard. A failed fetch is just "no data".
    pub async fn dashboard(&self, station: &str, rows: u32) -> AirDashboardResponse {
        let readings = self.client.fetch_readings(station, rows).await;
        info!(
            "Air dashboard for {}: {} readings",
            station,
            readings.len()
        );
        build_dashboard(station, readings)
    }

    /// Export the normalized raw readings as UTF-8 CSV with a byte-order
    /// mark, one row per sensor reading.
    pub async fn export_csv(&self, station: &str, rows: u32) -> CsvExportResponse {
        let dashboard = self.dashboard(station, rows).await;

        let mut content = String::from("\u{feff}");
        content.push_str(
            "측정시각,미세먼지(PM10) ㎍/㎥,초미세먼지(PM2.5) ㎍/㎥,오존(O3) ppm,\
             이산화질소(NO2) ppm,일산화탄소(CO) ppm,아황산가스(SO2) ppm,통합대기환경지수\n",
        );
        for r in &dashboard.readings {
            content.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                r.data_time,
                fmt_opt(r.pm10),
                fmt_opt(r.pm25),
                fmt_opt(r.o3),
                fmt_opt(r.no2),
                fmt_opt(r.co),
                fmt_opt(r.so2),
                fmt_opt(r.khai),
            ));
        }

        CsvExportResponse {
            filename: format!("{}_미세먼지.csv", station),
            content,
        }
    }
}

/// Missing values export as empty cells, never zero
fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
