//! Anonymization of JupyterHealth Exchange records
//!
//! Lets the output of the Exchange APIs be shown in demos and documentation.
//! Identifying fields are replaced with synthetic values, record ids go through
//! a stable and reversible mapping, and Observation measurements get numeric
//! noise.
//!
//! This is best-effort obfuscation. It is not cryptographically secure and
//! gives no formal privacy guarantee.
//!
//! # Example
//!
//! ```rust
//! use jhe_anonymize::Anonymizer;
//! use jhe_models::Patient;
//! use serde_json::json;
//!
//! let patient: Patient = serde_json::from_value(json!({
//!     "id": 45439,
//!     "jheUserId": 19259,
//!     "nameGiven": "Heather",
//!     "nameFamily": "Williams",
//!     "organizationId": 20026
//! }))
//! .unwrap();
//!
//! let anonymizer = Anonymizer::default();
//! let anon = anonymizer.anonymize_patient(&patient).unwrap();
//!
//! assert_ne!(anon.id, patient.id);
//! assert_eq!(anon.organization_id, patient.organization_id);
//! assert_eq!(anonymizer.deanonymize_id(anon.id), patient.id);
//! ```

pub mod engine;
pub mod error;
pub mod id_cache;
pub mod noise;
pub mod sequence;
pub mod synthetic;

pub use engine::{parse_reference, Anonymizer, AnonymizerConfig, DEFAULT_NOISE_SCALE};
pub use error::{Error, Result};
pub use id_cache::{IdCache, IdRange};
pub use noise::{add_noise, MeasurementValue};
pub use sequence::SyntheticSequence;
