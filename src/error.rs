//! Error types for the stocktwits-sentiment library.
//!
//! Only whole-table failures are errors. Row-level problems found while loading
//! are reported as [`crate::loader::LoadWarning`] and never abort a load.

use thiserror::Error;

/// Errors that can occur while loading or aggregating a message table.
#[derive(Error, Debug)]
pub enum SentimentError {
    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader/writer errors that are not row-level
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The input file lacks one or more required columns
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A time window outside the recognized options
    #[error("Invalid time window: {0} days (expected 2, 10 or 30)")]
    InvalidWindow(u32),

    /// A sort key other than recency or score
    #[error("Invalid sort key: {0}")]
    InvalidSortKey(String),

    /// A sentiment label other than positive, neutral or negative
    #[error("Invalid sentiment: {0}")]
    InvalidSentiment(String),

    /// An export format other than txt, csv or json
    #[error("Invalid output format: {0}")]
    InvalidFormat(String),

    /// A theme other than light or dark
    #[error("Invalid theme: {0}")]
    InvalidTheme(String),

    /// The requested symbol does not appear in the loaded table
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with `SentimentError`
pub type Result<T> = std::result::Result<T, SentimentError>;

impl From<anyhow::Error> for SentimentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<config::ConfigError> for SentimentError {
    fn from(err: config::ConfigError) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}
