//! Records served by the Exchange REST API (`/api/v1`)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// The authenticated user (`users/profile`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub last_name: Option<String>,

    /// Linked patient record, if the user is also a patient
    #[serde(default)]
    pub patient: Option<Value>,

    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

/// A patient record.
///
/// `id` is the Exchange patient id; `jhe_user_id` is the id of the user account
/// that owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: i64,

    pub jhe_user_id: i64,

    /// External (e.g. EHR) identifier
    #[serde(default)]
    pub identifier: Option<String>,

    #[serde(default)]
    pub name_family: Option<String>,

    #[serde(default)]
    pub name_given: Option<String>,

    /// ISO calendar date (`YYYY-MM-DD`)
    #[serde(default)]
    pub birth_date: Option<String>,

    #[serde(default)]
    pub telecom_phone: Option<String>,

    #[serde(default)]
    pub telecom_email: Option<String>,

    pub organization_id: i64,

    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: i64,

    pub name: String,

    #[serde(rename = "type", default)]
    pub organization_type: Option<String>,

    /// Parent organization; the ROOT organization has id 0
    #[serde(default)]
    pub part_of: Option<i64>,

    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Study {
    pub id: i64,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub organization: Option<Organization>,

    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

/// Consent status of a patient (`patients/{id}/consents`).
///
/// Scope and study listings are kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientConsents {
    pub patient: Patient,

    #[serde(default)]
    pub consolidated_consented_scopes: Vec<Value>,

    #[serde(default)]
    pub studies_pending_consent: Vec<Value>,

    #[serde(default)]
    pub studies: Vec<Value>,

    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}

/// Envelope of REST list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub results: Vec<T>,

    #[serde(flatten)]
    pub extensions: HashMap<String, Value>,
}
