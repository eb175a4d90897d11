//! Error types for RightLane.

use std::time::Duration;

/// Top-level error type for the session core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable key-value storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Profile mutation errors.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Patch must be a JSON object, got {0}")]
    NotAnObject(String),

    #[error("Patch does not fit the profile shape: {0}")]
    InvalidShape(#[source] serde_json::Error),

    #[error("Field {0} is not a boolean attribute")]
    NotAFlag(String),

    #[error("Sectors can only be changed on the first wizard step")]
    SectorsLocked,

    #[error("Child index {index} is out of range (at most {max} children)")]
    ChildOutOfRange { index: usize, max: usize },
}

/// Failures of the external analysis service boundary.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Analysis service {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Analysis service {provider} returned status {status}: {body}")]
    HttpStatus {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Malformed payload from {provider}: {reason}")]
    MalformedPayload { provider: String, reason: String },

    #[error("Analysis service {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("An analysis is already running")]
    AlreadyRunning,

    #[error("Analysis can only be submitted from the summary step")]
    NotAtSummary,
}

/// Result type alias for the session core.
pub type Result<T> = std::result::Result<T, Error>;
