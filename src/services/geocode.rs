// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Map coordinates for free-text schedule locations.
//!
//! Schedules store place names, not coordinates. When the Google Geocoding
//! API is configured it is tried first; otherwise, or when it fails, a
//! deterministic pseudo-geocoder places the location near the city centroid.
//! The pseudo point is a stable placeholder, not a real geocode.

use crate::models::GeoPoint;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Sum of the UTF-16 code units of `location`.
pub fn location_hash(location: &str) -> u64 {
    location.encode_utf16().map(u64::from).sum()
}

/// Deterministic placeholder coordinate for a location string.
///
/// `lat = base.lat + (hash % 100) / 10000`,
/// `lng = base.lng + ((hash * 7) % 100) / 10000`.
pub fn pseudo_geocode(base: GeoPoint, location: &str) -> GeoPoint {
    let hash = location_hash(location);
    let lat_offset = (hash % 100) as f64 / 10_000.0;
    let lng_offset = (hash.wrapping_mul(7) % 100) as f64 / 10_000.0;
    GeoPoint::new(base.latitude + lat_offset, base.longitude + lng_offset)
}

/// How a coordinate was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum GeocodeSource {
    Google,
    Pseudo,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GeocodedPoint {
    pub point: GeoPoint,
    pub source: GeocodeSource,
}

/// Errors from the Google Geocoding API.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Geocoding API returned status {0}")]
    Status(String),

    #[error("No results for location")]
    NoResults,
}

impl From<GeocodeError> for crate::error::AppError {
    fn from(err: GeocodeError) -> Self {
        crate::error::AppError::Geocoding(err.to_string())
    }
}

#[derive(Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Deserialize)]
struct GeocodeResult {
    geometry: GeocodeGeometry,
}

#[derive(Deserialize)]
struct GeocodeGeometry {
    location: LatLng,
}

#[derive(Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Geocoder with a Google backend and pseudo-geocode fallback.
#[derive(Clone)]
pub struct Geocoder {
    http: reqwest::Client,
    api_key: Option<String>,
    base: GeoPoint,
    /// Google results keyed by trimmed, lower-cased location
    cache: Arc<DashMap<String, GeoPoint>>,
}

impl Geocoder {
    pub fn new(api_key: Option<String>, base: GeoPoint) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base,
            cache: Arc::new(DashMap::new()),
        }
    }

    /// A geocoder that never leaves the process.
    pub fn pseudo_only(base: GeoPoint) -> Self {
        Self::new(None, base)
    }

    /// Pseudo-geocode with this geocoder's base.
    pub fn pseudo(&self, location: &str) -> GeocodedPoint {
        GeocodedPoint {
            point: pseudo_geocode(self.base, location),
            source: GeocodeSource::Pseudo,
        }
    }

    /// Resolve a location, never failing: Google first if configured.
    pub async fn geocode(&self, location: &str) -> GeocodedPoint {
        let Some(api_key) = self.api_key.as_deref() else {
            return self.pseudo(location);
        };

        let key = location.trim().to_lowercase();
        if key.is_empty() {
            return self.pseudo(location);
        }
        if let Some(point) = self.cache.get(&key) {
            return GeocodedPoint {
                point: *point,
                source: GeocodeSource::Google,
            };
        }

        match self.google(api_key, location).await {
            Ok(point) => {
                self.cache.insert(key, point);
                GeocodedPoint {
                    point,
                    source: GeocodeSource::Google,
                }
            }
            Err(e) => {
                tracing::warn!(location, error = %e, "Geocoding failed, using pseudo-geocode");
                self.pseudo(location)
            }
        }
    }

    async fn google(&self, api_key: &str, location: &str) -> Result<GeoPoint, GeocodeError> {
        let url = format!(
            "{}?address={}&key={}",
            GEOCODE_URL,
            urlencoding::encode(location),
            urlencoding::encode(api_key)
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| GeocodeError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeocodeError::Http(format!("HTTP {}", response.status())));
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| GeocodeError::Http(format!("JSON parse error: {}", e)))?;

        match body.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" => return Err(GeocodeError::NoResults),
            other => return Err(GeocodeError::Status(other.to_string())),
        }

        let first = body.results.first().ok_or(GeocodeError::NoResults)?;
        let point = GeoPoint::new(first.geometry.location.lat, first.geometry.location.lng);
        if !point.is_valid() {
            return Err(GeocodeError::Status("invalid coordinate".to_string()));
        }
        Ok(point)
    }
}
