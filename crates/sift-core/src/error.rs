//! Error types for Sift

use std::time::Duration;

use thiserror::Error;

/// Result type alias using Sift's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Sift error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Request errors (E100-E199)
    #[error("Unknown search mode '{0}'.")]
    InvalidSearchMode(String),

    #[error("Unknown sort direction '{0}'. Use ASC or DESC.")]
    InvalidSortDirection(String),

    #[error("Invalid page request: {0}")]
    InvalidPageRequest(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Entity errors (E200-E299)
    #[error("Member '{0}' not found. Run `sift members search` to see all members.")]
    MemberNotFound(i64),

    // Storage errors (E400-E499)
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[source] sqlx::Error),

    #[error("Storage query timed out after {0:?}")]
    StorageTimeout(Duration),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::StorageUnavailable(err),
            other => Self::Database(other),
        }
    }
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidSearchMode(_) => "E100",
            Self::InvalidSortDirection(_) => "E101",
            Self::InvalidPageRequest(_) => "E102",
            Self::InvalidInput(_) => "E103",
            Self::MemberNotFound(_) => "E200",
            Self::StorageUnavailable(_) => "E400",
            Self::StorageTimeout(_) => "E401",
            Self::Database(_) => "E402",
            Self::ConfigError(_) => "E600",
            Self::Io(_) => "E9999",
        }
    }

    /// Whether the caller may retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageTimeout(_))
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::MemberNotFound(_) => Some("sift members search".to_string()),
            Self::StorageUnavailable(_) => Some("sift doctor".to_string()),
            Self::StorageTimeout(_) => {
                Some("sift config set search.query_timeout_ms <millis>".to_string())
            }
            Self::ConfigError(_) => Some("sift config list".to_string()),
            _ => None,
        }
    }
}
