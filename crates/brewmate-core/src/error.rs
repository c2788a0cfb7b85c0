//! Core error types for brewmate-core.
//!
//! Every fallible operation in the library returns [`CoreError`]. The
//! brew session itself never fails once started; only `start` can reject
//! a profile.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for brewmate-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A tea profile is malformed or missing required fields.
    #[error("Invalid profile: {0}")]
    InvalidProfile(#[from] ProfileError),

    /// A tasting evaluation is out of range or incomplete.
    #[error("Invalid evaluation: {0}")]
    InvalidEvaluation(String),

    /// A referenced profile, record or image does not exist.
    #[error("{kind} '{key}' not found")]
    NotFound { kind: &'static str, key: String },

    /// Reading or writing a persisted file failed.
    #[error("Storage failure at {path}: {source}")]
    StorageFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted JSON document could not be (de)serialized.
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Report or background image could not be encoded.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// No async runtime is available to drive the system clock.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Reasons a [`crate::TeaProfile`] is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("name '{0}' must not contain path separators")]
    InvalidName(String),

    #[error("pour count must be at least 1")]
    NoPours,

    #[error("pour count is {pour_count} but {intervals} intervals were given")]
    IntervalCountMismatch { pour_count: u32, intervals: usize },

    #[error("interval for pour {0} must be greater than zero")]
    ZeroInterval(usize),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Failed to serialize configuration
    #[error("Failed to serialize configuration: {0}")]
    SerializeFailed(String),

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl CoreError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CoreError::StorageFailure {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        CoreError::Json {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        CoreError::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// True for the `NotFound` family, used by callers that treat a
    /// missing entry as a soft condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::SerializeFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_kind_and_key() {
        let err = CoreError::not_found("profile", "Assam");
        assert_eq!(err.to_string(), "profile 'Assam' not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn profile_error_wraps_into_invalid_profile() {
        let err: CoreError = ProfileError::ZeroInterval(2).into();
        assert_eq!(
            err.to_string(),
            "Invalid profile: interval for pour 2 must be greater than zero"
        );
    }
}
