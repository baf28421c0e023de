use crate::error::{ClientError, ClientResult, FALLBACK_MESSAGE};
use api_shared::{EhrRes, HealthRes, Session};
use ehr_core::{EhrRecord, RecordDraft};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Client for the EHR REST API.
#[derive(Clone, Debug)]
pub struct EhrClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<Session>,
}

impl EhrClient {
    /// Create a client for the server at `base_url`, e.g. `http://localhost:5000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            session: None,
        }
    }

    /// Attach a signed-in session; its token is sent with every request.
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub async fn health(&self) -> ClientResult<HealthRes> {
        self.send(self.request(Method::GET, &["health"])?).await
    }

    pub async fn create(&self, draft: &RecordDraft) -> ClientResult<EhrRecord> {
        let res: EhrRes = self
            .send(self.request(Method::POST, &["api", "ehr"])?.json(draft))
            .await?;
        Ok(res.ehr)
    }

    pub async fn list_all(&self) -> ClientResult<Vec<EhrRecord>> {
        self.send(self.request(Method::GET, &["api", "ehr"])?).await
    }

    pub async fn get_by_patient_id(&self, patient_id: &str) -> ClientResult<EhrRecord> {
        self.send(self.request(Method::GET, &["api", "ehr", patient_id])?)
            .await
    }

    pub async fn get_by_id(&self, id: &str) -> ClientResult<EhrRecord> {
        self.send(self.request(Method::GET, &["api", "ehr", "by-id", id])?)
            .await
    }

    /// Replace the record stored under `id` with `draft`.
    pub async fn update(&self, id: &str, draft: &RecordDraft) -> ClientResult<EhrRecord> {
        let res: EhrRes = self
            .send(self.request(Method::PUT, &["api", "ehr", id])?.json(draft))
            .await?;
        Ok(res.ehr)
    }

    pub async fn delete(&self, id: &str) -> ClientResult<EhrRecord> {
        let res: EhrRes = self
            .send(self.request(Method::DELETE, &["api", "ehr", id])?)
            .await?;
        Ok(res.ehr)
    }

    pub async fn fhir_bundle(&self, id: &str) -> ClientResult<Value> {
        self.send(self.request(Method::GET, &["api", "ehr", "by-id", id, "fhir"])?)
            .await
    }

    /// Read-modify-write: fetch the record, let `mutate` change it, then put the whole
    /// document back.
    pub async fn edit<F>(&self, id: &str, mutate: F) -> ClientResult<EhrRecord>
    where
        F: FnOnce(&mut RecordDraft),
    {
        let mut draft = RecordDraft::from(self.get_by_id(id).await?);
        mutate(&mut draft);
        self.update(id, &draft).await
    }

    /// Delete after `confirm` agrees. Returns `None` without sending anything when it
    /// declines.
    pub async fn delete_confirmed<F>(&self, id: &str, confirm: F) -> ClientResult<Option<EhrRecord>>
    where
        F: FnOnce() -> bool,
    {
        if !confirm() {
            tracing::debug!(id, "delete declined");
            return Ok(None);
        }
        self.delete(id).await.map(Some)
    }

    fn request(&self, method: Method, segments: &[&str]) -> ClientResult<RequestBuilder> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);

        let mut builder = self.http.request(method, url);
        if let Some(session) = &self.session {
            builder = builder.header(AUTHORIZATION, session.authorization());
        }
        Ok(builder)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = builder.send().await.map_err(ClientError::Transport)?;
        let status = response.status();
        let body = response.text().await.map_err(ClientError::Transport)?;

        if !status.is_success() {
            let message = server_message(&body);
            tracing::warn!(status = status.as_u16(), %message, "EHR request failed");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// The server's `error` or `message` text, or the fallback.
fn server_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["error", "message"]
                .iter()
                .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}
