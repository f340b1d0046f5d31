//! Client configuration

use crate::error::{Error, Result};
use jhe_anonymize::AnonymizerConfig;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Base URL of the Exchange, e.g. `https://jhe.example.org`.
pub const URL_ENV: &str = "JHE_URL";

/// Access token sent as `Authorization: Bearer ...`.
pub const TOKEN_ENV: &str = "JHE_TOKEN";

/// Older name of [`TOKEN_ENV`], still read when the new one is unset.
pub const LEGACY_TOKEN_ENV: &str = "CHCS_TOKEN";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, PartialEq)]
pub struct ClientConfig {
    pub url: Url,
    pub token: Option<String>,

    /// Run every record through the anonymizer before returning it.
    pub anonymize: bool,
    pub anonymizer: AnonymizerConfig,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url)?;
        if url.cannot_be_a_base() {
            return Err(Error::Config(format!("not a base URL: {url}")));
        }
        Ok(Self {
            url,
            token: None,
            anonymize: false,
            anonymizer: AnonymizerConfig::default(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Read `JHE_URL` and `JHE_TOKEN` (falling back to `CHCS_TOKEN`) from the
    /// process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key: &str| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let url = lookup(URL_ENV)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::Config(format!("{URL_ENV} must be set")))?;

        Ok(Self::new(&url)?.with_token(token_from_lookup(&lookup)))
    }

    /// Token from `JHE_TOKEN`, or from `CHCS_TOKEN` with a deprecation
    /// warning.
    pub fn env_token() -> Option<String> {
        token_from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_anonymize(mut self, anonymize: bool) -> Self {
        self.anonymize = anonymize;
        self
    }

    pub fn with_anonymizer(mut self, anonymizer: AnonymizerConfig) -> Self {
        self.anonymizer = anonymizer;
        self
    }

    pub fn with_noise_scale(mut self, noise_scale: f64) -> Self {
        self.anonymizer.noise_scale = noise_scale;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.anonymizer.seed = seed;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn token_from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    if let Some(token) = lookup(TOKEN_ENV).filter(|t| !t.is_empty()) {
        return Some(token);
    }
    let legacy = lookup(LEGACY_TOKEN_ENV).filter(|t| !t.is_empty());
    if legacy.is_some() {
        tracing::warn!("{LEGACY_TOKEN_ENV} is deprecated, use {TOKEN_ENV}");
    }
    legacy
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("anonymize", &self.anonymize)
            .field("anonymizer", &self.anonymizer)
            .field("timeout", &self.timeout)
            .finish()
    }
}
