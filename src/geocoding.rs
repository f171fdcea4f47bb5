//! Location resolution: forward and reverse geocoding, a position source
//! abstraction, and mapping coordinates to the nearest known region.

use anyhow::{Context, Result};
use async_trait::async_trait;
use haversine::{Location as HaversinePoint, Units, distance};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::GeocodingConfig;
use crate::error::AgriMandiError;
use crate::models::{Location, RegionProfile};

/// Ways obtaining the device position can fail.
#[derive(Error, Debug)]
pub enum GeolocationError {
    #[error("Location access denied. Please enable location permissions.")]
    PermissionDenied,
    #[error("Location request timed out. Please try again.")]
    Timeout,
    #[error("Location information unavailable.")]
    Unavailable,
}

/// Source of the user's coordinates.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_position(&self) -> std::result::Result<(f64, f64), GeolocationError>;
}

/// Position source backed by a fixed coordinate pair, for configurations
/// without any positioning hardware.
pub struct FixedPosition {
    pub latitude: f64,
    pub longitude: f64,
}

#[async_trait]
impl GeolocationProvider for FixedPosition {
    async fn current_position(&self) -> std::result::Result<(f64, f64), GeolocationError> {
        Ok((self.latitude, self.longitude))
    }
}

pub struct GeocodingClient {
    client: ClientWithMiddleware,
    search_url: String,
    reverse_url: String,
    api_key: Option<String>,
}

impl GeocodingClient {
    #[must_use]
    pub fn new(client: ClientWithMiddleware, config: &GeocodingConfig) -> Self {
        Self {
            client,
            search_url: config.search_url.clone(),
            reverse_url: config.reverse_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Search locations by place name. No API key required.
    #[instrument(skip(self))]
    pub async fn geocode(&self, name: &str) -> Result<Vec<Location>> {
        if name.trim().is_empty() {
            return Err(AgriMandiError::validation("Location name cannot be empty").into());
        }

        let url = format!(
            "{}?name={}&count=5&language=en&format=json",
            self.search_url,
            urlencoding::encode(name)
        );
        let response = self.client.get(url).send().await?;
        let parsed: GeocodingResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse geocoding response")?;

        let locations: Vec<Location> = parsed
            .results
            .unwrap_or_default()
            .into_iter()
            .map(|result| {
                Location::with_place(
                    result.latitude,
                    result.longitude,
                    result.name,
                    result.admin1.unwrap_or_else(|| "Unknown State".to_string()),
                )
            })
            .collect();
        debug!(count = locations.len(), "Geocoded place name");
        Ok(locations)
    }

    /// Resolve coordinates into district and state names.
    #[instrument(skip(self))]
    pub async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Location> {
        let Some(api_key) = &self.api_key else {
            return Err(AgriMandiError::config(
                "Geocoding service is not configured. Please set a reverse geocoding API key.",
            )
            .into());
        };

        let url = format!(
            "{}?q={latitude}%2C{longitude}&key={api_key}&language=en&no_annotations=1",
            self.reverse_url
        );
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(
                AgriMandiError::config("Invalid reverse geocoding API key").into(),
            );
        }

        let parsed: ReverseResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse reverse geocoding response")?;

        if parsed.status.code == 402 {
            return Err(
                AgriMandiError::api("Reverse geocoding quota exceeded for today").into(),
            );
        }

        let Some(result) = parsed.results.into_iter().next() else {
            return Err(
                AgriMandiError::api("No location data found for these coordinates").into(),
            );
        };

        let components = result.components;
        let district = components
            .state_district
            .or(components.county)
            .or(components.city)
            .or(components.town)
            .or(components.village)
            .unwrap_or_else(|| "Unknown District".to_string());
        let state = components
            .state
            .unwrap_or_else(|| "Unknown State".to_string());

        Ok(Location::with_place(latitude, longitude, district, state))
    }
}

/// The region whose centroid is closest to the given coordinates.
#[must_use]
pub fn nearest_region(regions: &[RegionProfile], latitude: f64, longitude: f64) -> Option<&RegionProfile> {
    let distance_to = |region: &RegionProfile| {
        distance(
            HaversinePoint { latitude, longitude },
            HaversinePoint {
                latitude: region.latitude,
                longitude: region.longitude,
            },
            Units::Kilometers,
        )
    };
    regions
        .iter()
        .min_by(|a, b| distance_to(a).total_cmp(&distance_to(b)))
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    admin1: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    status: ReverseStatus,
    #[serde(default)]
    results: Vec<ReverseResult>,
}

#[derive(Debug, Deserialize)]
struct ReverseStatus {
    code: u16,
}

#[derive(Debug, Deserialize)]
struct ReverseResult {
    components: ReverseComponents,
}

#[derive(Debug, Deserialize)]
struct ReverseComponents {
    state: Option<String>,
    state_district: Option<String>,
    county: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::ReferenceData;

    #[test]
    fn test_nearest_region_ludhiana_is_punjab() {
        let data = ReferenceData::embedded().unwrap();
        let region = nearest_region(data.regions(), 30.9010, 75.8573).unwrap();
        assert_eq!(region.id, "Punjab");
    }

    #[test]
    fn test_nearest_region_chennai_is_tamil_nadu() {
        let data = ReferenceData::embedded().unwrap();
        let region = nearest_region(data.regions(), 13.08, 80.27).unwrap();
        assert_eq!(region.id, "Tamil Nadu");
    }

    #[test]
    fn test_nearest_region_empty_list() {
        assert!(nearest_region(&[], 0.0, 0.0).is_none());
    }

    #[test]
    fn test_geocoding_response_parsing() {
        let body = r#"{
            "results": [
                { "name": "Ludhiana", "latitude": 30.9, "longitude": 75.85, "admin1": "Punjab" }
            ]
        }"#;
        let parsed: GeocodingResponse = serde_json::from_str(body).unwrap();
        let results = parsed.results.unwrap();
        assert_eq!(results[0].admin1.as_deref(), Some("Punjab"));
    }

    #[test]
    fn test_reverse_response_parsing() {
        let body = r#"{
            "status": { "code": 200, "message": "OK" },
            "results": [
                {
                    "components": {
                        "state": "Punjab",
                        "state_district": "Ludhiana"
                    }
                }
            ]
        }"#;
        let parsed: ReverseResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.status.code, 200);
        assert_eq!(
            parsed.results[0].components.state.as_deref(),
            Some("Punjab")
        );
    }

    #[tokio::test]
    async fn test_fixed_position_provider() {
        let provider = FixedPosition {
            latitude: 31.0,
            longitude: 75.4,
        };
        let (lat, lon) = provider.current_position().await.unwrap();
        assert_eq!(lat, 31.0);
        assert_eq!(lon, 75.4);
    }
}
