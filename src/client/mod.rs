//! Remote run creation.
//!
//! `RunClient` is the seam the orchestrator dispatches through; `Connector` builds
//! a client for a given endpoint at submission time so the current API key is used.

mod http;

pub use http::HttpConnector;

use crate::model::{JobHandle, RunPayload};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid API URL {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("unexpected run response: {0}")]
    Decode(String),
    #[error("API key is not a valid header value")]
    InvalidApiKey,
    #[error("Unknown error")]
    Unknown,
}

impl RunError {
    /// Message shown to the user under the failure notice, including every
    /// cause in the source chain.
    pub fn user_message(&self) -> String {
        let msg = chain_message(self);
        if msg.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            msg
        }
    }
}

/// `{err}: {cause}: {cause}...`, skipping causes already contained in the text.
fn chain_message(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !msg.contains(&text) {
            if !msg.is_empty() {
                msg.push_str(": ");
            }
            msg.push_str(&text);
        }
        source = cause.source();
    }
    msg
}

#[async_trait]
pub trait RunClient: Send + Sync {
    /// Create a run of `assistant_id`. A `None` thread creates a threadless run.
    async fn create_run(
        &self,
        thread_id: Option<&str>,
        assistant_id: &str,
        payload: &RunPayload,
    ) -> Result<JobHandle, RunError>;
}

pub trait Connector: Send + Sync {
    fn connect(&self, api_url: &str) -> Result<Box<dyn RunClient>, RunError>;
}
