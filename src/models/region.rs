//! Regional climate and soil profiles

use serde::{Deserialize, Serialize};

use crate::models::crop::ValueRange;

/// Aggregate climate description for an administrative area.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionClimate {
    /// Annual temperature range in degrees Celsius
    pub temperature_c: ValueRange,
    /// Mean annual rainfall in millimetres
    pub annual_rainfall_mm: f64,
    /// Mean relative humidity in percent
    pub humidity_pct: f64,
}

/// Static profile of a growing region. Loaded once at startup and immutable
/// thereafter; the `id` is the state name as reported by geocoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionProfile {
    pub id: String,
    pub climate: RegionClimate,
    pub soil_types: Vec<String>,
    pub major_crops: Vec<String>,
    /// Approximate centroid, used to map coordinates to the nearest region
    pub latitude: f64,
    pub longitude: f64,
}
