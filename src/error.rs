//! Error types for Mimeo

use std::io;
use thiserror::Error;

/// Result type for Mimeo operations
pub type Result<T> = std::result::Result<T, MimeoError>;

/// Errors that can occur in Mimeo
#[derive(Debug, Error)]
pub enum MimeoError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Manifest file failed shape validation on load
    #[error("Invalid manifest at {path}: {reason}")]
    InvalidManifest {
        /// Manifest file path
        path: String,
        /// What was malformed
        reason: String,
    },

    /// Fixture file referenced by a manifest is missing or unreadable
    #[error("Missing fixture {path} for {key}")]
    MissingFixture {
        /// Fixture file path
        path: String,
        /// Key of the owning interaction
        key: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid session name
    #[error("Invalid session name: {0}")]
    InvalidSessionName(String),

    /// A session is already active against this controller
    #[error("Session already active: {0}")]
    SessionActive(String),
}
