//! Error types for the taxi demand application
//!
//! The scoring engine itself is infallible. Errors only arise while loading
//! configuration or acquiring snapshots from external providers.

use std::time::Duration;
use thiserror::Error;

/// Main error type for the taxi demand application
#[derive(Error, Debug)]
pub enum DemandError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A snapshot provider could not produce data
    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    /// A snapshot provider did not answer in time
    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON (de)serialization errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl DemandError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new provider error
    pub fn provider<P: Into<String>, S: Into<String>>(provider: P, message: S) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<P: Into<String>>(provider: P, timeout: Duration) -> Self {
        Self::Timeout {
            provider: provider.into(),
            timeout,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            DemandError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            DemandError::Provider { provider, .. } | DemandError::Timeout { provider, .. } => {
                format!("Live {provider} data is unavailable. Estimates use fallback data.")
            }
            DemandError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            DemandError::Json { .. } => {
                "Could not read JSON input. Please check the file format.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = DemandError::config("hourly table has a negative entry");
        assert!(matches!(config_err, DemandError::Config { .. }));

        let timeout_err = DemandError::timeout("weather", Duration::from_secs(5));
        assert!(timeout_err.to_string().contains("weather timed out"));
    }

    #[test]
    fn test_user_messages() {
        let config_err = DemandError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let provider_err = DemandError::provider("traffic", "HTTP 503");
        assert!(provider_err.user_message().contains("fallback data"));

        let json_err: DemandError = serde_json::from_str::<u32>("\"x\"").unwrap_err().into();
        assert!(json_err.user_message().contains("JSON"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DemandError = io_err.into();
        assert!(matches!(err, DemandError::Io { .. }));
    }
}
