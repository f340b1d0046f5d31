//! Error types for JHE models

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Attachment is not valid base64: {0}")]
    AttachmentDecode(#[from] base64::DecodeError),
}

pub type Result<T> = std::result::Result<T, Error>;
