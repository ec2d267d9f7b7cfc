//! Core error types for moneyminder-core.
//!
//! This module defines the error hierarchy using thiserror. Transient
//! storage and backend failures are logged by the callers and rarely reach
//! the UI; scheduling failures always do.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for moneyminder-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Reminder scheduling errors
    #[error("Scheduling error: {0}")]
    Scheduling(#[from] SchedulingError),

    /// Errors reported by an external collaborator (platform, backend)
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to read a stored record
    #[error("Failed to read '{key}': {message}")]
    ReadFailed { key: String, message: String },

    /// Failed to write a record
    #[error("Failed to write '{key}': {message}")]
    WriteFailed { key: String, message: String },

    /// Failed to (de)serialize a record
    #[error("Failed to serialize '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Data directory could not be resolved or created
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
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

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Reminder scheduling errors.
#[derive(Error, Debug)]
pub enum SchedulingError {
    /// The platform refused or failed to register the reminder
    #[error("Platform failed to schedule reminder: {0}")]
    Platform(#[source] PlatformError),

    /// Reminders are switched off in the preferences
    #[error("Reminders are disabled")]
    Disabled,

    /// Notification permission is not granted
    #[error("Notification permission not granted (status: {status})")]
    PermissionDenied { status: String },
}

/// Error returned by an external collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{service}: {message}")]
pub struct PlatformError {
    pub service: String,
    pub message: String,
}

impl PlatformError {
    pub fn new(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduling_error_wraps_platform_message() {
        let err = SchedulingError::Platform(PlatformError::new("fcm", "quota exceeded"));
        assert_eq!(
            err.to_string(),
            "Platform failed to schedule reminder: fcm: quota exceeded"
        );
    }

    #[test]
    fn core_error_converts_from_storage() {
        let err: CoreError = StorageError::DataDir("no home".into()).into();
        assert!(matches!(err, CoreError::Storage(_)));
        assert!(err.to_string().contains("no home"));
    }
}
