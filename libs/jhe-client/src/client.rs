//! JupyterHealth Exchange API client

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::ObservationQuery;
use crate::pagination::{PageWalker, Step};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use jhe_anonymize::Anonymizer;
use jhe_models::{
    Bundle, ListResponse, Observation, Organization, Patient, PatientConsents, Study, User,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Error detail reported for HTML error pages instead of their markup.
pub const HTML_ERROR_DETAIL: &str = "(html error page)";

/// Longest plain-text error body carried in [`Error::Request`].
pub const MAX_ERROR_DETAIL_CHARS: usize = 1024;

/// The two API surfaces of the Exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Api {
    /// `/api/v1`
    Rest,
    /// `/fhir/r5`
    Fhir,
}

impl Api {
    fn prefix(self) -> [&'static str; 2] {
        match self {
            Api::Rest => ["api", "v1"],
            Api::Fhir => ["fhir", "r5"],
        }
    }
}

/// Client for the Exchange REST and FHIR APIs.
///
/// With [`ClientConfig::anonymize`] set, every user, patient and observation
/// is passed through one [`Anonymizer`] before it is returned, and ids given
/// to the accessors may be the synthetic ones handed out earlier.
pub struct JheClient {
    http: Client,
    config: ClientConfig,
    anonymizer: Option<Arc<Anonymizer>>,
}

impl JheClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        let anonymizer = config
            .anonymize
            .then(|| Arc::new(Anonymizer::new(config.anonymizer.clone())));
        Ok(Self {
            http,
            config,
            anonymizer,
        })
    }

    /// Client configured from `JHE_URL` and `JHE_TOKEN`.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.config.url
    }

    /// The anonymizer in use, if anonymization is on.
    pub fn anonymizer(&self) -> Option<&Arc<Anonymizer>> {
        self.anonymizer.as_ref()
    }

    /// Real id behind `id`; unchanged when not anonymizing or when `id` was
    /// never handed out.
    pub fn real_id(&self, id: i64) -> i64 {
        self.anonymizer
            .as_ref()
            .map_or(id, |anonymizer| anonymizer.deanonymize_id(id))
    }

    /// URL of `path` under `api`. A full URL is used as is.
    pub fn endpoint(&self, api: Api, path: &str) -> Result<Url> {
        if path.contains("://") {
            return Ok(Url::parse(path)?);
        }
        let mut url = self.config.url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("not a base URL: {}", self.config.url)))?
            .pop_if_empty()
            .extend(api.prefix())
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    /// GET `url` and parse the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(String, String)],
    ) -> Result<T> {
        let mut request = self.http.get(url);
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        tracing::debug!(%url, %status, "GET");

        if !status.is_success() {
            let detail = error_detail(response).await;
            return Err(Error::Request {
                status,
                url,
                detail,
            });
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(Error::EmptyResponse(url));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_json(self.endpoint(Api::Rest, path)?, &[]).await
    }

    /// Records of a REST list endpoint (`{"results": [...]}`).
    async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let response: ListResponse<T> = self.get(path).await?;
        Ok(response.results)
    }

    /// Entries of a paginated FHIR search, deduplicated and capped at
    /// `limit`. Pages are fetched as the stream is polled; dropping the
    /// stream stops fetching.
    pub fn fhir_list(
        &self,
        path: &str,
        params: Vec<(String, String)>,
        limit: Option<usize>,
    ) -> BoxStream<'_, Result<Value>> {
        if limit == Some(0) {
            return stream::empty().boxed();
        }
        stream::once(self.first_page(path.to_string(), params, limit))
            .map_ok(move |walker| stream::try_unfold(walker, move |walker| self.next_entry(walker)))
            .try_flatten()
            .boxed()
    }

    async fn first_page(
        &self,
        path: String,
        params: Vec<(String, String)>,
        limit: Option<usize>,
    ) -> Result<PageWalker> {
        let url = self.endpoint(Api::Fhir, &path)?;
        let page: Bundle = self.get_json(url, &params).await?;
        Ok(PageWalker::new(page, limit))
    }

    async fn next_entry(&self, mut walker: PageWalker) -> Result<Option<(Value, PageWalker)>> {
        loop {
            match walker.step()? {
                Step::Entry(entry) => return Ok(Some((entry, walker))),
                Step::Fetch(next) => {
                    tracing::debug!(page = walker.pages() + 1, "following next link");
                    // the next link carries the original query
                    let page: Bundle = self.get_json(self.endpoint(Api::Fhir, &next)?, &[]).await?;
                    walker.load(page);
                }
                Step::Done => {
                    tracing::debug!(
                        entries = walker.yielded(),
                        pages = walker.pages(),
                        "search complete"
                    );
                    return Ok(None);
                }
            }
        }
    }

    fn user(&self, user: User) -> Result<User> {
        match &self.anonymizer {
            Some(anonymizer) => Ok(anonymizer.anonymize_user(&user)?),
            None => Ok(user),
        }
    }

    fn patient(&self, patient: Patient) -> Result<Patient> {
        match &self.anonymizer {
            Some(anonymizer) => Ok(anonymizer.anonymize_patient(&patient)?),
            None => Ok(patient),
        }
    }

    fn observation(&self, entry: Value) -> Result<Observation> {
        let observation: Observation = serde_json::from_value(entry)?;
        match &self.anonymizer {
            Some(anonymizer) => Ok(anonymizer.anonymize_observation(&observation)?),
            None => Ok(observation),
        }
    }

    /// The user the token belongs to.
    pub async fn get_user(&self) -> Result<User> {
        let user = self.get("users/profile").await?;
        self.user(user)
    }

    pub async fn get_patient(&self, id: i64) -> Result<Patient> {
        let patient = self.get(&format!("patients/{}", self.real_id(id))).await?;
        self.patient(patient)
    }

    /// Look up a patient by an external (e.g. EHR) identifier.
    ///
    /// Scans every patient, so it costs one full listing.
    pub async fn get_patient_by_external_id(&self, external_id: &str) -> Result<Patient> {
        let patients: Vec<Patient> = self.list("patients").await?;
        let patient = patients
            .into_iter()
            .find(|patient| patient.identifier.as_deref() == Some(external_id))
            .ok_or_else(|| {
                Error::NotFound(format!("no patient with external identifier {external_id:?}"))
            })?;
        self.patient(patient)
    }

    pub async fn list_patients(&self) -> Result<Vec<Patient>> {
        let patients: Vec<Patient> = self.list("patients").await?;
        patients
            .into_iter()
            .map(|patient| self.patient(patient))
            .collect()
    }

    /// Consent status of a patient across their studies.
    pub async fn get_patient_consents(&self, patient_id: i64) -> Result<PatientConsents> {
        let path = format!("patients/{}/consents", self.real_id(patient_id));
        let mut consents: PatientConsents = self.get(&path).await?;
        if let Some(anonymizer) = &self.anonymizer {
            consents.patient = anonymizer.anonymize_patient(&consents.patient)?;
        }
        Ok(consents)
    }

    pub async fn get_study(&self, id: i64) -> Result<Study> {
        self.get(&format!("studies/{id}")).await
    }

    pub async fn list_studies(&self) -> Result<Vec<Study>> {
        self.list("studies").await
    }

    pub async fn get_organization(&self, id: i64) -> Result<Organization> {
        self.get(&format!("organizations/{id}")).await
    }

    pub async fn list_organizations(&self) -> Result<Vec<Organization>> {
        self.list("organizations").await
    }

    /// Observations of a patient and/or study, newest pages first as the
    /// server orders them.
    ///
    /// Fails up front when the query names neither a patient nor a study.
    pub fn list_observations(
        &self,
        query: &ObservationQuery,
    ) -> Result<BoxStream<'_, Result<Observation>>> {
        let params = query.to_params(|id| self.real_id(id))?;
        tracing::debug!(?params, limit = ?query.limit, "listing observations");
        Ok(self
            .fhir_list("Observation", params, query.limit)
            .map(move |entry| entry.and_then(|entry| self.observation(entry)))
            .boxed())
    }
}

/// Human-readable detail of a failed response.
async fn error_detail(response: Response) -> Option<String> {
    let is_html = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| content_type.contains("text/html"));
    if is_html {
        return Some(HTML_ERROR_DETAIL.to_string());
    }

    let text = response.text().await.ok()?;
    if let Ok(Value::Object(body)) = serde_json::from_str::<Value>(&text) {
        if let Some(detail) = body.get("detail") {
            return json_detail(detail);
        }
    }
    if text.is_empty() {
        return None;
    }
    Some(text.chars().take(MAX_ERROR_DETAIL_CHARS).collect())
}

/// A JSON `detail` member as text; empty values (`null`, `""`, `0`, `false`,
/// `[]`, `{}`) count as no detail.
fn json_detail(detail: &Value) -> Option<String> {
    match detail {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Array(items) if items.is_empty() => None,
        Value::Object(members) if members.is_empty() => None,
        other => Some(other.to_string()),
    }
}
