//! Configuration management for the `AgriMandi` application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::AgriMandiError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `AgriMandi` application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgriMandiConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Weather API configuration
    pub weather: WeatherConfig,
    /// Geocoding API configuration
    pub geocoding: GeocodingConfig,
    /// Cache configuration
    pub cache: CacheConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port the API server binds to
    #[serde(default = "default_server_port")]
    pub port: u16,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL for the forecast API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_weather_max_retries")]
    pub max_retries: u32,
    /// Number of forecast days to request
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,
}

/// Geocoding API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Forward geocoding (place name search) endpoint
    #[serde(default = "default_geocoding_search_url")]
    pub search_url: String,
    /// Reverse geocoding endpoint
    #[serde(default = "default_geocoding_reverse_url")]
    pub reverse_url: String,
    /// API key for the reverse geocoding provider
    pub api_key: Option<String>,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache TTL in hours
    #[serde(default = "default_cache_ttl")]
    pub ttl_hours: u32,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_server_port() -> u16 {
    3000
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_weather_max_retries() -> u32 {
    3
}

fn default_forecast_days() -> u32 {
    5
}

fn default_geocoding_search_url() -> String {
    "https://geocoding-api.open-meteo.com/v1/search".to_string()
}

fn default_geocoding_reverse_url() -> String {
    "https://api.opencagedata.com/geocode/v1/json".to_string()
}

fn default_cache_ttl() -> u32 {
    6
}

fn default_cache_location() -> String {
    "~/.cache/agrimandi".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for AgriMandiConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: default_server_port(),
            },
            weather: WeatherConfig {
                base_url: default_weather_base_url(),
                timeout_seconds: default_weather_timeout(),
                max_retries: default_weather_max_retries(),
                forecast_days: default_forecast_days(),
            },
            geocoding: GeocodingConfig {
                search_url: default_geocoding_search_url(),
                reverse_url: default_geocoding_reverse_url(),
                api_key: None,
            },
            cache: CacheConfig {
                ttl_hours: default_cache_ttl(),
                location: default_cache_location(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
        }
    }
}

impl AgriMandiConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment variable overrides with AGRIMANDI_ prefix
        builder = builder.add_source(
            Environment::with_prefix("AGRIMANDI")
                .separator("_")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AgriMandiConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("agrimandi").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.server.port == 0 {
            self.server.port = default_server_port();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.weather.max_retries == 0 {
            self.weather.max_retries = default_weather_max_retries();
        }
        if self.weather.forecast_days == 0 {
            self.weather.forecast_days = default_forecast_days();
        }
        if self.geocoding.search_url.is_empty() {
            self.geocoding.search_url = default_geocoding_search_url();
        }
        if self.geocoding.reverse_url.is_empty() {
            self.geocoding.reverse_url = default_geocoding_reverse_url();
        }
        if self.cache.ttl_hours == 0 {
            self.cache.ttl_hours = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        if let Some(api_key) = &self.geocoding.api_key {
            if api_key.is_empty() {
                return Err(AgriMandiError::config(
                    "Geocoding API key cannot be empty if provided. Either remove it or provide a valid key."
                ).into());
            }

            if api_key.len() < 8 {
                return Err(AgriMandiError::config(
                    "Geocoding API key appears to be invalid (too short). Please check your API key."
                ).into());
            }

            if api_key.len() > 100 {
                return Err(AgriMandiError::config(
                    "Geocoding API key appears to be invalid (too long). Please check your API key."
                ).into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 {
            return Err(
                AgriMandiError::config("Weather API timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.weather.max_retries > 10 {
            return Err(AgriMandiError::config("Weather API max retries cannot exceed 10").into());
        }

        if !(1..=16).contains(&self.weather.forecast_days) {
            return Err(
                AgriMandiError::config("Forecast days must be between 1 and 16").into(),
            );
        }

        if self.cache.ttl_hours > 168 {
            return Err(
                AgriMandiError::config("Cache TTL cannot exceed 168 hours (1 week)").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AgriMandiError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(AgriMandiError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for url in [&self.weather.base_url, &self.geocoding.search_url, &self.geocoding.reverse_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AgriMandiError::config(
                    "API base URLs must be valid HTTP or HTTPS URLs",
                )
                .into());
            }
        }

        Ok(())
    }

    /// Create configuration directory if it doesn't exist
    pub fn ensure_config_dir() -> Result<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            let agrimandi_config_dir = config_dir.join("agrimandi");
            std::fs::create_dir_all(&agrimandi_config_dir).with_context(|| {
                format!(
                    "Failed to create config directory: {}",
                    agrimandi_config_dir.display()
                )
            })?;
            Ok(agrimandi_config_dir)
        } else {
            Err(AgriMandiError::config("Unable to determine config directory").into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AgriMandiConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.weather.base_url, "https://api.open-meteo.com/v1");
        assert_eq!(config.weather.timeout_seconds, 30);
        assert_eq!(config.weather.forecast_days, 5);
        assert_eq!(config.cache.ttl_hours, 6);
        assert_eq!(config.logging.level, "info");
        assert!(config.geocoding.api_key.is_none());
    }

    #[test]
    fn test_config_validation_missing_api_key() {
        // The reverse geocoding key is optional at configuration time
        let config = AgriMandiConfig::default();
        assert!(config.validate_api_keys().is_ok());
    }

    #[test]
    fn test_config_validation_short_api_key() {
        let mut config = AgriMandiConfig::default();
        config.geocoding.api_key = Some("short".to_string());
        assert!(config.validate_api_keys().is_err());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = AgriMandiConfig::default();
        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_log_format() {
        let mut config = AgriMandiConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = AgriMandiConfig::default();
        config.weather.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_forecast_days_range() {
        let mut config = AgriMandiConfig::default();
        config.weather.forecast_days = 17;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_defaults_fills_blanks() {
        let mut config = AgriMandiConfig::default();
        config.weather.base_url = String::new();
        config.logging.level = String::new();
        config.apply_defaults();
        assert_eq!(config.weather.base_url, default_weather_base_url());
        assert_eq!(config.logging.level, "info");
    }
}
