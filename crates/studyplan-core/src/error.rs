//! Core error types for studyplan-core.
//!
//! Planning itself is lenient: malformed calendar entries, unparseable
//! preference text and out-of-bounds blocks are dropped rather than reported.
//! The variants here cover what the caller must hear about: bad input,
//! upstream fetch failures and configuration problems.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for studyplan-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Request validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Calendar retrieval errors
    #[error("Calendar fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Input errors, reported before any planning work starts.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Preferences text is required
    #[error("Preferences are required")]
    MissingPreferences,

    /// Neither calendar text nor a calendar URL was supplied
    #[error("A calendar source (text or URL) is required")]
    MissingCalendarSource,

    /// Date is not a valid `YYYY-MM-DD` value
    #[error("Invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate { value: String },

    /// Invalid time range
    #[error("Invalid time range: end ({end}) must be after start ({start})")]
    InvalidTimeRange { start: String, end: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Upstream calendar retrieval errors.
///
/// Callers render a distinct message per variant, so network trouble,
/// non-calendar content and a missing export link stay separate.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request did not complete within the timeout
    #[error("Calendar request timed out after {secs} seconds")]
    Timeout { secs: u64 },

    /// Connection or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Server answered with a non-success status
    #[error("Calendar server answered with HTTP {status}")]
    Status { status: u16 },

    /// The response is neither a calendar nor an HTML page
    #[error("The URL did not return calendar content")]
    NotCalendar,

    /// An HTML page was returned but it links to no calendar export
    #[error("The page contains no calendar export link")]
    NoExportLink,

    /// The URL could not be parsed
    #[error("Invalid calendar URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// True for failures caused by the network rather than the content.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout { .. } | FetchError::Network(_) | FetchError::Status { .. }
        )
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            FetchError::Status {
                status: status.as_u16(),
            }
        } else if err.is_builder() {
            FetchError::InvalidUrl(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
