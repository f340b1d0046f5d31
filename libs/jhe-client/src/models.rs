//! Query types for the Exchange endpoints

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Code system of Open mHealth schema codes.
pub const OPEN_MHEALTH_SYSTEM: &str = "https://w3id.org/openmhealth";

pub const DEFAULT_OBSERVATION_LIMIT: usize = 2000;

/// Observation codes the Exchange knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    BloodPressure,
    BloodGlucose,
    HeartRate,
}

impl Code {
    pub const ALL: [Code; 3] = [Code::BloodPressure, Code::BloodGlucose, Code::HeartRate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Code::BloodPressure => "omh:blood-pressure:4.0",
            Code::BloodGlucose => "omh:blood-glucose:4.0",
            Code::HeartRate => "omh:heart-rate:2.0",
        }
    }

    fn short_name(&self) -> &'static str {
        match self {
            Code::BloodPressure => "blood-pressure",
            Code::BloodGlucose => "blood-glucose",
            Code::HeartRate => "heart-rate",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Code {
    type Err = Error;

    /// Accepts the code value (`omh:heart-rate:2.0`) or a short name
    /// (`heart-rate`, `HeartRate`).
    fn from_str(s: &str) -> Result<Self> {
        let wanted = squash(s);
        Code::ALL
            .into_iter()
            .find(|code| s == code.as_str() || wanted == squash(code.short_name()))
            .ok_or_else(|| Error::InvalidQuery(format!("unknown observation code: {s}")))
    }
}

/// Lower-cased alphanumerics only.
fn squash(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.as_str().to_string()
    }
}

/// Filters for [`crate::JheClient::list_observations`].
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationQuery {
    pub patient_id: Option<i64>,
    pub study_id: Option<i64>,

    /// `system|code`, or a bare code in the Open mHealth system.
    pub code: Option<String>,

    /// Upper bound on the number of observations; `None` for all.
    pub limit: Option<usize>,
}

impl Default for ObservationQuery {
    fn default() -> Self {
        Self {
            patient_id: None,
            study_id: None,
            code: None,
            limit: Some(DEFAULT_OBSERVATION_LIMIT),
        }
    }
}

impl ObservationQuery {
    pub fn for_patient(patient_id: i64) -> Self {
        Self {
            patient_id: Some(patient_id),
            ..Default::default()
        }
    }

    pub fn for_study(study_id: i64) -> Self {
        Self {
            study_id: Some(study_id),
            ..Default::default()
        }
    }

    pub fn with_patient(mut self, patient_id: i64) -> Self {
        self.patient_id = Some(patient_id);
        self
    }

    pub fn with_study(mut self, study_id: i64) -> Self {
        self.study_id = Some(study_id);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// The `code` search value, qualified with the Open mHealth system when
    /// it carries none.
    pub fn code_param(&self) -> Option<String> {
        self.code.as_deref().map(|code| {
            if code.contains('|') {
                code.to_string()
            } else {
                format!("{OPEN_MHEALTH_SYSTEM}|{code}")
            }
        })
    }

    /// FHIR search parameters. `resolve_patient` maps the patient id before
    /// it goes on the wire, e.g. from a synthetic id back to the real one.
    pub fn to_params(&self, resolve_patient: impl Fn(i64) -> i64) -> Result<Vec<(String, String)>> {
        if self.patient_id.is_none() && self.study_id.is_none() {
            return Err(Error::InvalidQuery(
                "a patient or a study is required to list observations".into(),
            ));
        }

        let mut params = Vec::new();
        if let Some(study_id) = self.study_id {
            params.push(("_has:Group:member:_id".to_string(), study_id.to_string()));
        }
        if let Some(patient_id) = self.patient_id {
            params.push(("patient".to_string(), resolve_patient(patient_id).to_string()));
        }
        if let Some(code) = self.code_param() {
            params.push(("code".to_string(), code));
        }
        Ok(params)
    }
}
