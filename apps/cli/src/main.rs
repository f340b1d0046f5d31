//! Command-line access to the JupyterHealth Exchange
//!
//! Prints records as pretty JSON on stdout, one document per record. Logs go
//! to stderr; set `RUST_LOG=jhe_client=debug` to see every request.
//!
//! Usage:
//!   jhe --url https://jhe.example.org patients
//!   jhe --anonymize observations --patient 40001 --code blood-pressure --limit 10

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::TryStreamExt;
use jhe_client::{
    ClientConfig, Code, JheClient, ObservationQuery, DEFAULT_NOISE_SCALE, DEFAULT_OBSERVATION_LIMIT,
};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(name = "jhe", version)]
#[clap(about = "Query the JupyterHealth Exchange REST and FHIR APIs")]
struct Cli {
    /// Base URL of the Exchange
    #[clap(long, env = "JHE_URL")]
    url: String,

    /// Access token (falls back to the deprecated CHCS_TOKEN)
    #[clap(long, env = "JHE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Replace identifying fields, ids and measurements with synthetic values
    #[clap(long)]
    anonymize: bool,

    /// Relative magnitude of measurement noise when anonymizing
    #[clap(long, default_value_t = DEFAULT_NOISE_SCALE)]
    noise_scale: f64,

    /// Seed for reproducible anonymized output
    #[clap(long)]
    seed: Option<u64>,

    /// Per-request timeout in seconds
    #[clap(long, default_value_t = 30)]
    timeout: u64,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// The user the token belongs to
    User,

    /// A single patient
    Patient {
        id: i64,
    },

    /// Look up a patient by external (e.g. EHR) identifier
    PatientByExternalId {
        external_id: String,
    },

    /// All patients visible to the user
    Patients,

    /// Consent status of a patient
    Consents {
        patient_id: i64,
    },

    /// A single study
    Study {
        id: i64,
    },

    /// All studies visible to the user
    Studies,

    /// A single organization
    Organization {
        id: i64,
    },

    /// All organizations
    Organizations,

    /// Observations of a patient and/or study
    Observations {
        #[clap(long)]
        patient: Option<i64>,

        #[clap(long)]
        study: Option<i64>,

        /// `blood-pressure`, `blood-glucose`, `heart-rate`, a bare Open mHealth
        /// code, or `system|code`
        #[clap(long)]
        code: Option<String>,

        /// Maximum number of observations
        #[clap(long, default_value_t = DEFAULT_OBSERVATION_LIMIT, conflicts_with = "all")]
        limit: usize,

        /// Fetch every page, without a limit
        #[clap(long)]
        all: bool,
    },
}

impl Cli {
    fn client_config(&self) -> Result<ClientConfig> {
        let token = self.token.clone().or_else(ClientConfig::env_token);
        let config = ClientConfig::new(&self.url)
            .with_context(|| format!("Invalid Exchange URL {:?}", self.url))?
            .with_token(token)
            .with_anonymize(self.anonymize)
            .with_noise_scale(self.noise_scale)
            .with_seed(self.seed)
            .with_timeout(Duration::from_secs(self.timeout));
        Ok(config)
    }
}

/// Resolve a `--code` argument: a known short name becomes its code value;
/// anything else is passed through.
fn resolve_code(code: &str) -> String {
    code.parse::<Code>()
        .map(String::from)
        .unwrap_or_else(|_| code.to_string())
}

fn print_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("Failed to serialize record")?;
    writeln!(out).context("Failed to write to stdout")?;
    Ok(())
}

fn print_all<T: Serialize>(out: &mut impl Write, values: &[T]) -> Result<()> {
    values.iter().try_for_each(|value| print_json(&mut *out, value))
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.client_config()?;
    tracing::debug!(?config, "client configuration");
    let client = JheClient::new(config).context("Failed to create client")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::User => print_json(&mut out, &client.get_user().await?)?,
        Command::Patient { id } => print_json(&mut out, &client.get_patient(id).await?)?,
        Command::PatientByExternalId { external_id } => print_json(
            &mut out,
            &client.get_patient_by_external_id(&external_id).await?,
        )?,
        Command::Patients => print_all(&mut out, &client.list_patients().await?)?,
        Command::Consents { patient_id } => {
            print_json(&mut out, &client.get_patient_consents(patient_id).await?)?
        }
        Command::Study { id } => print_json(&mut out, &client.get_study(id).await?)?,
        Command::Studies => print_all(&mut out, &client.list_studies().await?)?,
        Command::Organization { id } => {
            print_json(&mut out, &client.get_organization(id).await?)?
        }
        Command::Organizations => print_all(&mut out, &client.list_organizations().await?)?,
        Command::Observations {
            patient,
            study,
            code,
            limit,
            all,
        } => {
            let query = ObservationQuery {
                patient_id: patient,
                study_id: study,
                code: code.as_deref().map(resolve_code),
                limit: (!all).then_some(limit),
            };
            let mut observations = client.list_observations(&query)?;
            let mut count = 0usize;
            while let Some(observation) = observations.try_next().await? {
                print_json(&mut out, &observation)?;
                count += 1;
            }
            tracing::info!(count, "listed observations");
        }
    }

    out.flush().context("Failed to flush stdout")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // a missing .env is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_observation_args() {
        let cli = Cli::try_parse_from([
            "jhe",
            "--url",
            "https://jhe.example.org",
            "--anonymize",
            "--seed",
            "7",
            "observations",
            "--patient",
            "40001",
            "--code",
            "heart-rate",
            "--limit",
            "5",
        ])
        .unwrap();
        assert!(cli.anonymize);
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.noise_scale, 0.2);
        match cli.command {
            Command::Observations {
                patient,
                study,
                code,
                limit,
                all,
            } => {
                assert_eq!(patient, Some(40001));
                assert_eq!(study, None);
                assert_eq!(code.as_deref(), Some("heart-rate"));
                assert_eq!(limit, 5);
                assert!(!all);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_limit_conflicts_with_all() {
        let result = Cli::try_parse_from([
            "jhe",
            "--url",
            "https://jhe.example.org",
            "observations",
            "--study",
            "30001",
            "--limit",
            "5",
            "--all",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_client_config() {
        let cli = Cli::try_parse_from([
            "jhe",
            "--url",
            "https://jhe.example.org",
            "--token",
            "abc",
            "--noise-scale",
            "0.5",
            "--timeout",
            "5",
            "studies",
        ])
        .unwrap();
        let config = cli.client_config().unwrap();
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.anonymizer.noise_scale, 0.5);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(!config.anonymize);
    }

    #[test]
    fn test_resolve_code() {
        assert_eq!(resolve_code("blood-glucose"), "omh:blood-glucose:4.0");
        assert_eq!(resolve_code("omh:step-count:2.0"), "omh:step-count:2.0");
        assert_eq!(resolve_code("http://loinc.org|8867-4"), "http://loinc.org|8867-4");
    }

    #[test]
    fn test_print_json_one_document_per_record() {
        let records = vec![serde_json::json!({"id": 1}), serde_json::json!({"id": 2})];
        let mut out = Vec::new();
        print_all(&mut out, &records[..]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "{\n  \"id\": 1\n}\n{\n  \"id\": 2\n}\n");
    }
}
