//! JupyterHealth Exchange data models
//!
//! Strongly-typed structures for the records returned by the Exchange's REST
//! (`/api/v1`) and FHIR (`/fhir/r5`) APIs.
//!
//! # Module Organization
//!
//! - `bundle`: FHIR search-result pages (entries + pagination links)
//! - `exchange`: REST records (users, patients, studies, organizations, consents)
//! - `observation`: FHIR Observation and its embedded measurement payload
//! - `attachment`: base64 codec for `valueAttachment.data`
//!
//! Every record keeps the members it does not model in a flattened `extensions`
//! map, so a record deserialized from the API serializes back with the same
//! structure.
//!
//! # Example
//!
//! ```rust
//! use jhe_models::{Observation, ObservationPayload};
//! use serde_json::json;
//!
//! let payload = json!({
//!     "header": {"uuid": "0bc92595"},
//!     "body": {"heart_rate": {"value": 72, "unit": "beats/min"}}
//! });
//! let observation: Observation = serde_json::from_value(json!({
//!     "resourceType": "Observation",
//!     "id": "54321",
//!     "subject": {"reference": "Patient/12345"},
//!     "valueAttachment": {
//!         "contentType": "application/json",
//!         "data": jhe_models::attachment::encode_json(&payload).unwrap()
//!     }
//! }))
//! .unwrap();
//!
//! let decoded: ObservationPayload = observation.payload().unwrap();
//! assert_eq!(decoded.body["heart_rate"]["value"], 72);
//! ```

pub mod attachment;
pub mod bundle;
pub mod error;
pub mod exchange;
pub mod observation;

// Re-export commonly used types
pub use bundle::*;
pub use error::{Error, Result};
pub use exchange::*;
pub use observation::*;
