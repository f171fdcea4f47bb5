//! Location model for geographic coordinates and resolved place metadata

use serde::{Deserialize, Serialize};

/// A resolved user location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// City, town or village name
    pub district: String,
    /// State name, matching `RegionProfile::id` where known
    pub state: String,
}

impl Location {
    /// Create a location with unresolved place names
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            district: "Unknown District".to_string(),
            state: "Unknown State".to_string(),
        }
    }

    /// Create a fully resolved location
    #[must_use]
    pub fn with_place(latitude: f64, longitude: f64, district: String, state: String) -> Self {
        Self {
            latitude,
            longitude,
            district,
            state,
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded_coordinates(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }

    /// Generate cache key for this location
    #[must_use]
    pub fn cache_key(&self, date: &str) -> String {
        let (lat, lon) = self.rounded_coordinates(2); // Round to 2 decimal places
        format!("weather:{lat:.2}:{lon:.2}:{date}")
    }
}
