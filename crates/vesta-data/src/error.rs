//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Security code that is not a six digit A-share code
    #[error("Invalid security code: {0}")]
    InvalidCode(String),

    /// Period token that does not name a fiscal period
    #[error("Invalid period key: {0}")]
    InvalidPeriod(String),

    /// Two rows of one series share a date
    #[error("Duplicate date {date} in series for {code}")]
    DuplicateDate {
        /// Security code of the series
        code: String,
        /// Date that appears more than once
        date: String,
    },

    /// Missing data
    #[error("Missing data for {code}: {reason}")]
    MissingData {
        /// Security code that was queried
        code: String,
        /// Reason for missing data
        reason: String,
    },
}
