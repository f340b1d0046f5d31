use jhe_models::{Bundle, Observation, Patient, User};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{fs::File, path::PathBuf};

fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture<T: DeserializeOwned>(relative: &str) -> T {
    let path = fixtures_root().join(relative);
    assert!(path.exists(), "fixture missing at {:?}", path);

    let file = File::open(&path).expect("failed to open fixture");
    serde_json::from_reader(file).expect("failed to deserialize fixture")
}

#[test]
fn parse_blood_pressure_observation() {
    let obs: Observation = load_fixture("observation-blood-pressure.json");

    assert_eq!(obs.resource_type, "Observation");
    assert_eq!(obs.code(), Some("omh:blood-pressure:4.0"));

    let payload = obs.payload().expect("payload should decode");
    let body_keys: Vec<&String> = payload.body.keys().collect();
    assert_eq!(
        body_keys,
        vec![
            "effective_time_frame",
            "systolic_blood_pressure",
            "diastolic_blood_pressure"
        ]
    );
    assert_eq!(payload.body["systolic_blood_pressure"]["value"], 120);

    let header = payload.header.expect("header should be present");
    assert_eq!(header["modality"], "sensed");
    assert_eq!(header["schema_id"]["name"], "blood-pressure");
}

#[test]
fn parse_blood_glucose_observation() {
    let obs: Observation = load_fixture("observation-blood-glucose.json");

    let payload = obs.payload().expect("payload should decode");
    assert!(payload.body["blood_glucose"]["value"].is_f64());
    assert_eq!(payload.body["temporal_relationship_to_meal"], "fasting");
}

#[test]
fn parse_observation_bundle() {
    let bundle: Bundle = load_fixture("bundle-observations.json");

    assert!(bundle.is_searchset());
    assert_eq!(bundle.entry_count(), 2);
    assert_eq!(
        bundle.next_link(),
        Some("https://jhe.example.org/fhir/r5/Observation?patient=12345&page=2")
    );

    let first = jhe_models::unwrap_entry(bundle.entry.unwrap().remove(0));
    let obs: Observation = serde_json::from_value(first).expect("entry should be an Observation");
    assert_eq!(obs.id, "54322");
}

#[test]
fn parse_user_and_patient() {
    let user: User = load_fixture("user.json");
    assert_eq!(user.id, 10001);
    assert_eq!(user.patient, Some(Value::from(40001)));

    let patient: Patient = load_fixture("patient.json");
    assert_eq!(patient.jhe_user_id, 19259);
    assert_eq!(patient.organization_id, 20026);
    assert_eq!(patient.identifier.as_deref(), Some("some-external-id"));
}
