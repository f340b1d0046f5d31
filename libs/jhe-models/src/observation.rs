//! FHIR Observation as served by the Exchange
//!
//! The actual measurement lives in `valueAttachment.data`: an Open mHealth
//! data point (`header` + `body`) encoded with [`crate::attachment`].

use crate::attachment;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    /// Logical id (numeric, carried as a string)
    pub id: String,

    #[serde(default)]
    pub identifier: Vec<Identifier>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_attachment: Option<Attachment>,

    /// meta, status, code, and anything else
    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

fn default_resource_type() -> String {
    "Observation".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

/// A literal reference such as `Patient/45439`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Line-wrapped base64
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

/// Decoded contents of `valueAttachment.data`.
///
/// `body` maps measurement names to `{"value", "unit"}` objects, time frames or
/// plain strings. Key order is preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Map<String, Value>>,

    pub body: Map<String, Value>,
}

impl Attachment {
    /// Decode `data` into a JSON document.
    pub fn decode_json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        let data = self
            .data
            .as_deref()
            .ok_or_else(|| Error::MissingField("valueAttachment.data".into()))?;
        attachment::decode_json(data)
    }

    /// Replace `data` with the encoding of `value`.
    pub fn encode_json<T: Serialize>(&mut self, value: &T) -> Result<()> {
        self.data = Some(attachment::encode_json(value)?);
        Ok(())
    }
}

impl Observation {
    /// Decode the measurement payload.
    pub fn payload(&self) -> Result<ObservationPayload> {
        let document: Map<String, Value> = self
            .value_attachment
            .as_ref()
            .ok_or_else(|| Error::MissingField("valueAttachment".into()))?
            .decode_json()?;
        if !document.contains_key("body") {
            return Err(Error::MissingField("valueAttachment.data.body".into()));
        }
        Ok(serde_json::from_value(Value::Object(document))?)
    }

    /// Re-encode `payload` into `valueAttachment.data`.
    pub fn set_payload(&mut self, payload: &ObservationPayload) -> Result<()> {
        self.value_attachment
            .as_mut()
            .ok_or_else(|| Error::MissingField("valueAttachment".into()))?
            .encode_json(payload)
    }

    /// The `subject.reference` string, if any.
    pub fn subject_reference(&self) -> Option<&str> {
        self.subject.as_ref()?.reference.as_deref()
    }

    /// First coding code, e.g. `omh:blood-pressure:4.0`.
    pub fn code(&self) -> Option<&str> {
        self.extensions
            .get("code")?
            .get("coding")?
            .get(0)?
            .get("code")?
            .as_str()
    }
}
