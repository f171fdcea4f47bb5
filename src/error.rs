//! Error types and handling for the `AgriMandi` services

use thiserror::Error;

/// Main error type for the `AgriMandi` application
#[derive(Error, Debug)]
pub enum AgriMandiError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Failures talking to weather/geocoding services
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors (bad month, empty fields, weak password)
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Authentication and session errors
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl AgriMandiError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new authentication error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AgriMandiError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            AgriMandiError::Api { .. } => {
                "Unable to reach external services. Please check your internet connection."
                    .to_string()
            }
            AgriMandiError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            AgriMandiError::Auth { message } => {
                format!("Authentication failed: {message}")
            }
            AgriMandiError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            AgriMandiError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            AgriMandiError::General { message } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = AgriMandiError::config("missing API key");
        assert!(matches!(config_err, AgriMandiError::Config { .. }));

        let api_err = AgriMandiError::api("connection failed");
        assert!(matches!(api_err, AgriMandiError::Api { .. }));

        let validation_err = AgriMandiError::validation("month out of range");
        assert!(matches!(validation_err, AgriMandiError::Validation { .. }));

        let auth_err = AgriMandiError::auth("not signed in");
        assert!(matches!(auth_err, AgriMandiError::Auth { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = AgriMandiError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let api_err = AgriMandiError::api("test");
        assert!(api_err.user_message().contains("Unable to reach"));

        let validation_err = AgriMandiError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let app_err: AgriMandiError = io_err.into();
        assert!(matches!(app_err, AgriMandiError::Io { .. }));
    }
}
