//! Weather data models: current conditions and a multi-day outlook

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Location;

/// Current weather at a location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Temperature in Celsius
    pub temperature_c: f32,
    /// Relative humidity percentage (0-100)
    pub humidity_pct: u8,
    /// Wind speed in km/h
    pub wind_speed_kmh: f32,
    /// Human-readable description of conditions
    pub description: String,
}

impl CurrentConditions {
    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C", self.temperature_c)
    }

    /// Format wind information
    #[must_use]
    pub fn format_wind(&self) -> String {
        format!("{:.1} km/h", self.wind_speed_kmh)
    }
}

/// One day of the forecast
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyOutlook {
    pub date: NaiveDate,
    pub min_temp_c: f32,
    pub max_temp_c: f32,
    /// Chance of precipitation (0-100)
    pub precipitation_chance_pct: u8,
    pub description: String,
}

/// Full weather report handed to the presentation layer
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherReport {
    pub location: Location,
    pub fetched_at: DateTime<Utc>,
    pub current: CurrentConditions,
    pub outlook: Vec<DailyOutlook>,
    /// One-line farming advisory derived from current conditions
    pub advisory: String,
}
