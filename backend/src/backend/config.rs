//! Application configuration.
//!
//! All settings come from environment variables with working defaults, so the
//! server starts with no setup. The defaults point at the school and station
//! the dashboards were built for.

use std::env;
use std::net::SocketAddr;

use log::info;

/// Default regional education authority code (Gyeonggi-do office)
const DEFAULT_AUTHORITY_CODE: &str = "J10";

/// Default school code (Samil High School)
const DEFAULT_SCHOOL_CODE: &str = "7531427";

/// Default air-quality monitoring station
const DEFAULT_STATION: &str = "광교동";

/// Public data portal service key for the air-quality API
const DEFAULT_AIR_SERVICE_KEY: &str =
    "8imLOEIhmGIxq8Ud7TglAuHG2zQ+A2wGRiPnVhbHb60UJDhwJlbMqzv4SOTE5B9D3Moc713ob6bioiJywC3S3Q==";

/// Runtime configuration resolved once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// NEIS regional authority code (ATPT_OFCDC_SC_CODE)
    pub authority_code: String,
    /// NEIS school code (SD_SCHUL_CODE)
    pub school_code: String,
    /// Decoded service key for the air-quality API
    pub air_service_key: String,
    /// Station used when a request does not name one
    pub default_station: String,
    /// Rows requested from the air-quality API per fetch
    pub air_row_count: u32,
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    /// Build the configuration from environment variables, falling back to
    /// the defaults above for anything unset or unparseable.
    pub fn from_env() -> Self {
        let authority_code = env_or("NEIS_AUTHORITY_CODE", DEFAULT_AUTHORITY_CODE);
        let school_code = env_or("NEIS_SCHOOL_CODE", DEFAULT_SCHOOL_CODE);
        let air_service_key = env_or("AIR_SERVICE_KEY", DEFAULT_AIR_SERVICE_KEY);
        let default_station = env_or("AIR_STATION", DEFAULT_STATION);

        let air_row_count = env::var("AIR_ROW_COUNT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);

        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));

        info!(
            "Configuration: school {}/{}, station {}, bind {}",
            authority_code, school_code, default_station, bind_addr
        );

        Self {
            authority_code,
            school_code,
            air_service_key,
            default_station,
            air_row_count,
            bind_addr,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
