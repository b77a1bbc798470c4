//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup; the resulting `Config` is immutable and
//! shared through `AppState`.

use crate::models::GeoPoint;
use chrono::FixedOffset;
use std::env;
use std::str::FromStr;

/// City centroid used as the pseudo-geocoder's base coordinate.
pub const DEFAULT_CITY_BASE: GeoPoint = GeoPoint::new(10.7372, 122.9673);
/// UTC+08:00, the fleet's local time.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 8 * 60;
/// How often collector devices push their location.
pub const DEFAULT_LOCATION_PUSH_INTERVAL_SECS: u64 = 15;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Google Maps API key; when absent only the pseudo-geocoder is used
    pub google_maps_api_key: Option<String>,
    pub city_base: GeoPoint,
    /// Offset used to decide "today" and per-day collection dedup
    pub local_utc_offset: FixedOffset,
    pub location_push_interval_secs: u64,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            google_maps_api_key: None,
            city_base: DEFAULT_CITY_BASE,
            local_utc_offset: utc_offset(DEFAULT_UTC_OFFSET_MINUTES)
                .expect("default UTC offset is in range"),
            location_push_interval_secs: DEFAULT_LOCATION_PUSH_INTERVAL_SECS,
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let offset_minutes: i32 = parse_var("LOCAL_UTC_OFFSET_MINUTES", DEFAULT_UTC_OFFSET_MINUTES)?;
        let local_utc_offset = utc_offset(offset_minutes)
            .ok_or(ConfigError::Invalid("LOCAL_UTC_OFFSET_MINUTES"))?;

        let city_base = GeoPoint::new(
            parse_var("CITY_BASE_LAT", DEFAULT_CITY_BASE.latitude)?,
            parse_var("CITY_BASE_LNG", DEFAULT_CITY_BASE.longitude)?,
        );
        if !city_base.is_valid() {
            return Err(ConfigError::Invalid("CITY_BASE_LAT/CITY_BASE_LNG"));
        }

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            google_maps_api_key: env::var("GOOGLE_MAPS_API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            city_base,
            local_utc_offset,
            location_push_interval_secs: parse_var(
                "LOCATION_PUSH_INTERVAL_SECS",
                DEFAULT_LOCATION_PUSH_INTERVAL_SECS,
            )?,
        })
    }
}

fn utc_offset(minutes: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(minutes.checked_mul(60)?)
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::remove_var("LOCAL_UTC_OFFSET_MINUTES");
        env::remove_var("CITY_BASE_LAT");
        env::remove_var("CITY_BASE_LNG");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.jwt_signing_key, b"test_jwt_key_32_bytes_minimum!!");
        assert_eq!(config.city_base, DEFAULT_CITY_BASE);
        assert_eq!(config.local_utc_offset.local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn test_offset_out_of_range_is_rejected() {
        assert!(utc_offset(24 * 60).is_none());
        assert!(utc_offset(-5 * 60).is_some());
    }
}
