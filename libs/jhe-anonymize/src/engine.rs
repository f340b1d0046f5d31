//! Per-entity anonymization transforms

use crate::error::{Error, Result};
use crate::id_cache::{IdCache, IdRange, OBSERVATION_KIND, PATIENT_KIND, USER_KIND};
use crate::noise::{add_noise, MeasurementValue};
use crate::sequence::SyntheticSequence;
use crate::synthetic;
use jhe_models::{Observation, Patient, User};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const DEFAULT_NOISE_SCALE: f64 = 0.2;

/// Header members that carry unique ids of the data point.
const UID_HEADER_FIELDS: [&str; 2] = ["uuid", "source_data_point_id"];

#[derive(Debug, Clone, PartialEq)]
pub struct AnonymizerConfig {
    /// Magnitude of measurement noise relative to the rounded value.
    pub noise_scale: f64,

    /// Seed for reproducible synthetic values; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for AnonymizerConfig {
    fn default() -> Self {
        Self {
            noise_scale: DEFAULT_NOISE_SCALE,
            seed: None,
        }
    }
}

#[derive(Debug)]
struct State {
    ids: IdCache,
    rng: StdRng,
}

/// Anonymizes Exchange records for demos and documentation.
///
/// Record ids are replaced through an [`IdCache`] owned by this instance, so
/// the same real id always maps to the same synthetic id and
/// [`Anonymizer::deanonymize_id`] can map it back. Names, dates, uuids and
/// measurement noise are random.
///
/// This is obfuscation, not privacy protection.
#[derive(Debug)]
pub struct Anonymizer {
    config: AnonymizerConfig,
    state: Mutex<State>,
    sequence: SyntheticSequence,
}

impl Anonymizer {
    pub fn new(config: AnonymizerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            state: Mutex::new(State {
                ids: IdCache::new(),
                rng,
            }),
            sequence: SyntheticSequence::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(AnonymizerConfig {
            seed: Some(seed),
            ..Default::default()
        })
    }

    pub fn config(&self) -> &AnonymizerConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Synthetic id for `(kind, id)`, stable for the lifetime of this instance.
    pub fn synthetic_id(&self, kind: &str, id: i64) -> Result<i64> {
        let mut state = self.state();
        let State { ids, rng } = &mut *state;
        ids.assign(kind, id, rng)
    }

    /// Synthetic id for the target of a `Kind/id` reference.
    fn reference_id(&self, kind: &str, id: i64) -> Result<i64> {
        let mut state = self.state();
        let State { ids, rng } = &mut *state;
        ids.assign_in(kind, id, IdRange::for_kind(PATIENT_KIND), rng)
    }

    /// Map a synthetic id back to the real one. Ids this instance never
    /// produced are returned unchanged, so callers may pass either.
    pub fn deanonymize_id(&self, id: i64) -> i64 {
        self.state().ids.deanonymize(id)
    }

    fn synthetic_name(&self) -> (String, String) {
        let mut state = self.state();
        let first = synthetic::first_name(&mut state.rng);
        let last = synthetic::last_name(&mut state.rng);
        (first, last)
    }

    /// Anonymize a user. Members other than the id, name and email are
    /// dropped.
    pub fn anonymize_user(&self, user: &User) -> Result<User> {
        let (first, last) = self.synthetic_name();
        Ok(User {
            id: self.synthetic_id(USER_KIND, user.id)?,
            email: Some(synthetic::email(&first, &last)),
            first_name: Some(first),
            last_name: Some(last),
            patient: None,
            extensions: HashMap::new(),
        })
    }

    /// Anonymize a patient. `organizationId` is kept so organization-scoped
    /// queries still work; `jheUserId` shares the user id space so it matches
    /// an anonymized [`User`]. Unmodelled members are dropped.
    pub fn anonymize_patient(&self, patient: &Patient) -> Result<Patient> {
        let (given, family) = self.synthetic_name();

        let telecom_phone = match patient.telecom_phone.as_deref() {
            Some(phone) if !phone.is_empty() => Some(synthetic::PLACEHOLDER_PHONE.to_string()),
            other => other.map(str::to_string),
        };
        let telecom_email = match patient.telecom_email.as_deref() {
            Some(email) if !email.is_empty() => Some(synthetic::email(&given, &family)),
            other => other.map(str::to_string),
        };
        let identifier = match patient.identifier.as_deref() {
            Some(identifier) if !identifier.is_empty() => Some(self.sequence.next_uid()),
            other => other.map(str::to_string),
        };
        let birth_date = synthetic::birth_date(&mut self.state().rng);

        Ok(Patient {
            id: self.synthetic_id(PATIENT_KIND, patient.id)?,
            jhe_user_id: self.synthetic_id(USER_KIND, patient.jhe_user_id)?,
            identifier,
            name_family: Some(family),
            name_given: Some(given),
            birth_date: Some(birth_date.format(synthetic::DATE_FORMAT).to_string()),
            telecom_phone,
            telecom_email,
            organization_id: patient.organization_id,
            extensions: HashMap::new(),
        })
    }

    /// Anonymize an observation: ids, identifiers, subject reference, header
    /// uuids, and noise on every `body.*.value`.
    pub fn anonymize_observation(&self, observation: &Observation) -> Result<Observation> {
        let mut anon = observation.clone();

        let id = parse_id(&observation.id)?;
        anon.id = self.synthetic_id(OBSERVATION_KIND, id)?.to_string();

        for identifier in &mut anon.identifier {
            identifier.value = Some(self.sequence.next_uid());
        }

        let reference = observation
            .subject_reference()
            .ok_or_else(|| Error::MissingField("subject.reference".into()))?;
        let (kind, subject_id) = parse_reference(reference)?;
        // subjects always draw from the patient range, whatever their kind
        let synthetic_subject = self.reference_id(kind, subject_id)?;
        if let Some(subject) = anon.subject.as_mut() {
            subject.reference = Some(format!("{kind}/{synthetic_subject}"));
        }

        let mut payload = observation.payload()?;
        for (field, content) in payload.body.iter_mut() {
            if let Some(value) = content.get_mut("value") {
                *value = self.noisy_value(field, value)?;
            }
        }
        if let Some(header) = payload.header.as_mut() {
            for field in UID_HEADER_FIELDS {
                if let Some(value) = header.get_mut(field) {
                    *value = Value::String(self.sequence.next_uid());
                }
            }
        }
        anon.set_payload(&payload)?;

        tracing::trace!(
            observation = %observation.id,
            synthetic = %anon.id,
            "anonymized observation"
        );
        Ok(anon)
    }

    fn noisy_value(&self, field: &str, value: &Value) -> Result<Value> {
        let invalid = || Error::InvalidFieldValue(format!("body.{field}.value = {value}"));
        let measurement = MeasurementValue::from_json(value).ok_or_else(invalid)?;
        let noisy = add_noise(measurement, self.config.noise_scale, &mut self.state().rng);
        noisy.to_json().ok_or_else(invalid)
    }
}

impl Default for Anonymizer {
    fn default() -> Self {
        Self::new(AnonymizerConfig::default())
    }
}

fn parse_id(id: &str) -> Result<i64> {
    id.trim()
        .parse()
        .map_err(|_| Error::InvalidId(id.to_string()))
}

/// Split `Kind/123` on the first `/`.
pub fn parse_reference(reference: &str) -> Result<(&str, i64)> {
    let (kind, id) = reference
        .split_once('/')
        .ok_or_else(|| Error::InvalidReference(reference.to_string()))?;
    let id = id
        .parse()
        .map_err(|_| Error::InvalidReference(reference.to_string()))?;
    Ok((kind, id))
}
