//! Error types for the career advisor

use thiserror::Error;

/// Result type alias for career advisor operations
pub type Result<T> = std::result::Result<T, CareerError>;

/// Main error type for the career advisor
#[derive(Error, Debug)]
pub enum CareerError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CareerError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CareerError::Http(_) | CareerError::Completion(_) | CareerError::Io(_)
        )
    }

    /// HTTP status code used by the API layer
    pub fn status_code(&self) -> u16 {
        match self {
            CareerError::NotFound(_) => 404,
            CareerError::InvalidInput(_) => 400,
            CareerError::Unauthorized(_) => 401,
            CareerError::Completion(_) | CareerError::Http(_) => 502,
            CareerError::Config(_) => 503,
            _ => 500,
        }
    }
}
