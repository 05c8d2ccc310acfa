use super::{Connector, RunClient, RunError};
use crate::credentials::CredentialAccessor;
use crate::model::{JobHandle, RunPayload};
use crate::secret::SecretString;
use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::Url;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Serialize)]
struct CreateRunBody<'a> {
    assistant_id: &'a str,
    #[serde(flatten)]
    payload: &'a RunPayload,
}

/// Run client speaking the LangGraph-style `/runs` HTTP API.
#[derive(Debug, Clone)]
pub struct HttpRunClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl HttpRunClient {
    pub fn new(
        api_url: &str,
        api_key: Option<SecretString>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, RunError> {
        let trimmed = api_url.trim().trim_end_matches('/');
        Url::parse(trimmed).map_err(|e| RunError::InvalidEndpoint {
            url: api_url.to_string(),
            reason: e.to_string(),
        })?;

        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: trimmed.to_string(),
            api_key,
        })
    }

    fn key_header(&self) -> Result<Option<HeaderValue>, RunError> {
        let Some(key) = self.api_key.as_ref() else {
            return Ok(None);
        };
        let mut value =
            HeaderValue::from_str(key.expose()).map_err(|_| RunError::InvalidApiKey)?;
        value.set_sensitive(true);
        Ok(Some(value))
    }

    fn runs_url(&self, thread_id: Option<&str>) -> Result<Url, RunError> {
        let raw = match thread_id {
            Some(id) => format!("{}/threads/{}/runs", self.base_url, id),
            None => format!("{}/runs", self.base_url),
        };
        Url::parse(&raw).map_err(|e| RunError::InvalidEndpoint {
            url: raw,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl RunClient for HttpRunClient {
    async fn create_run(
        &self,
        thread_id: Option<&str>,
        assistant_id: &str,
        payload: &RunPayload,
    ) -> Result<JobHandle, RunError> {
        let url = self.runs_url(thread_id)?;
        let body = CreateRunBody {
            assistant_id,
            payload,
        };

        let mut req = self.http.post(url.clone()).json(&body);
        if let Some(value) = self.key_header()? {
            req = req.header(API_KEY_HEADER, value);
        }

        tracing::debug!(%url, assistant_id, authenticated = self.api_key.is_some(), "creating run");
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(RunError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str::<JobHandle>(&text).map_err(|e| RunError::Decode(e.to_string()))
    }
}

/// Builds an `HttpRunClient` per submission, reading the API key at that moment.
pub struct HttpConnector {
    credentials: Arc<dyn CredentialAccessor>,
    timeout: Duration,
    user_agent: String,
}

impl HttpConnector {
    pub fn new(
        credentials: Arc<dyn CredentialAccessor>,
        timeout: Duration,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            timeout,
            user_agent: user_agent.into(),
        }
    }
}

impl Connector for HttpConnector {
    fn connect(&self, api_url: &str) -> Result<Box<dyn RunClient>, RunError> {
        let client = HttpRunClient::new(
            api_url,
            self.credentials.get(),
            self.timeout,
            &self.user_agent,
        )?;
        Ok(Box::new(client))
    }
}
