//! JupyterHealth Exchange client
//!
//! Async access to the Exchange's REST (`/api/v1`) and FHIR (`/fhir/r5`)
//! APIs, with optional anonymization of everything it returns.
//!
//! FHIR searches are paginated and may repeat records across pages;
//! [`pagination`] turns them into one deduplicated, bounded sequence.
//!
//! # Example
//!
//! ```rust,no_run
//! use futures::TryStreamExt;
//! use jhe_client::{ClientConfig, Code, JheClient, ObservationQuery};
//!
//! # async fn run() -> jhe_client::Result<()> {
//! let config = ClientConfig::new("https://jhe.example.org")?
//!     .with_token(Some("access-token".into()))
//!     .with_anonymize(true);
//! let client = JheClient::new(config)?;
//!
//! let patients = client.list_patients().await?;
//! let query = ObservationQuery::for_patient(patients[0].id).with_code(Code::BloodPressure);
//! let observations: Vec<_> = client.list_observations(&query)?.try_collect().await?;
//! println!("{} observations", observations.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod pagination;

pub use client::{Api, JheClient};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use jhe_anonymize::{AnonymizerConfig, DEFAULT_NOISE_SCALE};
pub use models::{Code, ObservationQuery, DEFAULT_OBSERVATION_LIMIT};
pub use pagination::{walk, PageWalker, Step, Walk};
