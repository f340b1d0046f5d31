//! Codec for `Attachment.data`
//!
//! The Exchange stores Observation measurements as a UTF-8 JSON document,
//! base64-encoded with MIME line wrapping: a newline after every 76 output
//! characters and one trailing newline. Decoding accepts wrapped or unwrapped
//! input.

use crate::error::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Maximum number of base64 characters per line.
pub const LINE_LENGTH: usize = 76;

/// Encode bytes as line-wrapped base64.
pub fn encode(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }

    let encoded = STANDARD.encode(bytes);
    let mut wrapped = String::with_capacity(encoded.len() + encoded.len() / LINE_LENGTH + 1);
    for (i, c) in encoded.chars().enumerate() {
        if i > 0 && i % LINE_LENGTH == 0 {
            wrapped.push('\n');
        }
        wrapped.push(c);
    }
    wrapped.push('\n');
    wrapped
}

/// Decode base64, ignoring any line breaks or other ASCII whitespace.
pub fn decode(data: &str) -> Result<Vec<u8>> {
    let compact: String = data
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    Ok(STANDARD.decode(compact)?)
}

/// Serialize `value` as compact JSON and encode it.
pub fn encode_json<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value)?;
    Ok(encode(&json))
}

/// Decode `data` and parse the JSON document it carries.
pub fn decode_json<T: DeserializeOwned>(data: &str) -> Result<T> {
    let bytes = decode(data)?;
    Ok(serde_json::from_slice(&bytes)?)
}
