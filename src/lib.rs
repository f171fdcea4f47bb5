//! `AgriMandi` - Regional crop planning and mandi marketplace services
//!
//! This library provides crop recommendations from regional climate data,
//! a cultivation timeline, mandi price tracking, crop listings and the
//! supporting weather and location services.

pub mod api;
pub mod cache;
pub mod calendar;
pub mod config;
pub mod error;
pub mod geocoding;
pub mod listings;
pub mod market;
pub mod models;
pub mod session;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use calendar::{CropCalendar, MonthPhase, ReferenceData};
pub use config::AgriMandiConfig;
pub use error::AgriMandiError;
pub use geocoding::{GeocodingClient, GeolocationProvider};
pub use listings::{CropListing, ListingBook, ListingStatus};
pub use market::PriceBoard;
pub use models::{CropDefinition, Location, MonthWindow, RegionProfile, WeatherReport};
pub use session::{SessionContext, UserRole};
pub use weather::WeatherService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, AgriMandiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
