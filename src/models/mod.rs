//! Data models for the AgriMandi application
//!
//! This module contains the core domain models organized by concern:
//! - Crop: crop definitions, varieties, month windows and climate tolerances
//! - Region: aggregate climate and soil profiles for administrative areas
//! - Location: geographic coordinates and resolved place metadata
//! - Weather: current conditions and multi-day outlook

pub mod crop;
pub mod location;
pub mod region;
pub mod weather;

// Re-export all public types for convenient access
pub use crop::{
    ClimateTolerance, CropDefinition, CropVariety, Difficulty, FieldTask, MarketPriceRange,
    MonthWindow, Profitability, TaskKind, ValueRange,
};
pub use location::Location;
pub use region::{RegionClimate, RegionProfile};
pub use weather::{CurrentConditions, DailyOutlook, WeatherReport};
