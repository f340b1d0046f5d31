//! Error types for jhe-anonymize

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Anonymization errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid reference: {0:?} (expected \"Kind/123\")")]
    InvalidReference(String),

    #[error("Invalid record id: {0:?}")]
    InvalidId(String),

    #[error("Invalid field value: {0}")]
    InvalidFieldValue(String),

    #[error("Synthetic id range {start}..={end} for {kind} is exhausted")]
    IdRangeExhausted { kind: String, start: i64, end: i64 },

    #[error("Model error: {0}")]
    Model(#[from] jhe_models::Error),
}
