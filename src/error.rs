// src/error.rs

//! Unified error handling for the playcount pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Counter store operation failed
    #[error("counter store error: {0}")]
    Store(#[from] redis::RedisError),

    /// Category graph query failed
    #[error("graph query error: {0}")]
    Graph(#[from] sqlx::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Archive download or decompression failed for one day
    #[error("fetch failed for {date}: {message}")]
    Fetch { date: String, message: String },

    /// A designated numeric log column held something other than a count
    /// or the no-data placeholder
    #[error("malformed count in column {column}: {value:?}")]
    BadCount { column: usize, value: String },

    /// One or more dates failed during a batch run
    #[error("ingestion failed for {0}")]
    Ingest(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller supplied an unusable date or date range
    #[error("invalid date range: {0}")]
    DateRange(String),
}

impl AppError {
    /// Create a fetch error for one day's archive.
    pub fn fetch(date: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Fetch {
            date: date.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a date-range usage error.
    pub fn date_range(message: impl Into<String>) -> Self {
        Self::DateRange(message.into())
    }
}
