//! Error types for the instrumentation layer

use thiserror::Error;

/// Errors surfaced by timer configuration and reporting
#[derive(Error, Debug)]
pub enum TimerError {
    #[error("Invalid iteration threshold for '{key}': {value} (must be >= 1)")]
    InvalidIterations { key: String, value: i64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid key pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for timer operations
pub type Result<T> = std::result::Result<T, TimerError>;
