//! Unified error handling for the astrolens crate
//!
//! Domain-specific errors live next to their module (see
//! [`crate::analytics::AnalyticsError`]); this module consolidates them into a
//! single [`Error`] enum for use across module boundaries, plus an
//! [`ErrorCategory`] classification for reporting.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub use crate::analytics::AnalyticsError;

/// Classification of errors for reporting strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Caller-input validation failures (missing keyword, bad date, ...)
    Validation,
    /// Analytics preconditions (empty series, too few points)
    Analytics,
    /// Database and I/O errors
    Storage,
    /// Other/unknown errors
    Other,
}

/// Unified error type for the astrolens crate
#[derive(Error, Debug)]
pub enum Error {
    /// Caller-input validation failure, surfaced with a descriptive message
    #[error("{0}")]
    Validation(String),

    /// Analytics precondition failures
    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    /// The Astro database file does not exist at the resolved path
    #[error(
        "Astro app not found at {path}. Install Astro from https://astro.app \
         and add some tracked apps/keywords, or pass --db-path."
    )]
    DatabaseNotFound { path: PathBuf },

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Get the error category for reporting strategies
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) | Self::Config(_) => ErrorCategory::Validation,
            Self::Analytics(_) => ErrorCategory::Analytics,
            Self::DatabaseNotFound { .. } | Self::Database(_) | Self::Io(_) => {
                ErrorCategory::Storage
            }
            Self::Json(_) => ErrorCategory::Other,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
