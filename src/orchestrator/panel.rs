//! Indexer panel state machine.
//!
//! `Idle -> Submitting -> (Succeeded | Failed) -> Idle`. The panel owns the
//! document text and the in-flight flag; every transition and notice is pushed
//! to the event channel so any presentation layer can follow along.

use crate::client::{Connector, RunError};
use crate::model::{
    IndexRequest, JobHandle, Notice, PanelEvent, PanelView, SubmissionState,
    INDEXER_ASSISTANT_ID,
};
use crate::request::build_payload;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

pub const MSG_EMPTY_DOCUMENTS: &str = "Please enter documents to index";
pub const MSG_MISSING_ENDPOINT: &str = "API URL not configured";
pub const MSG_INDEX_FAILED: &str = "Failed to index documents";
pub const MSG_INDEX_SUCCEEDED: &str = "Documents indexed successfully";

/// Inputs handed to the panel by whoever opens it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelProps {
    pub api_url: Option<String>,
    pub user_id: String,
    pub retriever_provider: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Config,
    Remote,
}

/// Submissions refused before anything is sent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("{}", MSG_EMPTY_DOCUMENTS)]
    EmptyDocuments,
    #[error("{}", MSG_MISSING_ENDPOINT)]
    MissingEndpoint,
}

impl SubmitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubmitError::EmptyDocuments => ErrorKind::Validation,
            SubmitError::MissingEndpoint => ErrorKind::Config,
        }
    }
}

/// Edits applied to the document text. Ignored while a submission is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEdit {
    Insert(char),
    InsertStr(String),
    Newline,
    Backspace,
    Replace(String),
    Clear,
}

/// A submission that passed validation and is ready to be sent.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub api_url: String,
    pub request: IndexRequest,
}

impl Dispatch {
    /// Connect and create the indexer run. Connection failures count as remote failures.
    pub async fn run(self, connector: &dyn Connector) -> Result<JobHandle, RunError> {
        let client = connector.connect(&self.api_url)?;
        let payload = build_payload(&self.request);
        client
            .create_run(None, INDEXER_ASSISTANT_ID, &payload)
            .await
    }
}

/// How an accepted submit ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Another submission was already in flight; nothing was sent.
    Busy,
    Indexed(JobHandle),
    Failed(String),
}

pub struct Panel {
    props: PanelProps,
    open: bool,
    documents: String,
    state: SubmissionState,
    events: UnboundedSender<PanelEvent>,
}

impl Panel {
    pub fn new(props: PanelProps, open: bool, events: UnboundedSender<PanelEvent>) -> Self {
        Self {
            props,
            open,
            documents: String::new(),
            state: SubmissionState::Idle,
            events,
        }
    }

    pub fn documents(&self) -> &str {
        &self.documents
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_submitting(&self) -> bool {
        self.state.is_submitting()
    }

    /// Submit affordance: enabled only when idle and there is something to send.
    pub fn can_submit(&self) -> bool {
        !self.is_submitting() && !self.documents.trim().is_empty()
    }

    pub fn view(&self) -> PanelView {
        PanelView {
            open: self.open,
            documents: self.documents.clone(),
            submitting: self.is_submitting(),
            can_submit: self.can_submit(),
            user_id: self.props.user_id.clone(),
            retriever_provider: self.props.retriever_provider.clone(),
        }
    }

    pub fn publish_view(&self) {
        let _ = self.events.send(PanelEvent::View(self.view()));
    }

    /// User-driven open/close. Does not touch an in-flight submission.
    pub fn set_open(&mut self, open: bool) {
        if self.open != open {
            self.open = open;
            let _ = self.events.send(PanelEvent::OpenChanged(open));
        }
    }

    /// Returns false when the edit was ignored.
    pub fn edit(&mut self, edit: InputEdit) -> bool {
        if self.is_submitting() {
            return false;
        }
        match edit {
            InputEdit::Insert(c) => self.documents.push(c),
            InputEdit::InsertStr(s) => self.documents.push_str(&s),
            InputEdit::Newline => self.documents.push('\n'),
            InputEdit::Backspace => {
                self.documents.pop();
            }
            InputEdit::Replace(s) => self.documents = s,
            InputEdit::Clear => self.documents.clear(),
        }
        true
    }

    /// Validate and enter `Submitting`.
    ///
    /// `Ok(None)` means a submission is already in flight and this request was
    /// dropped. Validation failures notify the user and leave the state `Idle`.
    pub fn begin_submit(&mut self) -> Result<Option<Dispatch>, SubmitError> {
        if self.is_submitting() {
            tracing::debug!("submit ignored, indexing already in progress");
            return Ok(None);
        }

        if self.documents.trim().is_empty() {
            return Err(self.reject(SubmitError::EmptyDocuments));
        }

        let api_url = match self.props.api_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => return Err(self.reject(SubmitError::MissingEndpoint)),
        };

        self.transition(SubmissionState::Submitting);
        tracing::info!(
            user_id = %self.props.user_id,
            retriever_provider = %self.props.retriever_provider,
            bytes = self.documents.len(),
            "submitting documents for indexing"
        );

        Ok(Some(Dispatch {
            api_url,
            request: IndexRequest {
                documents: self.documents.clone(),
                user_id: self.props.user_id.clone(),
                retriever_provider: self.props.retriever_provider.clone(),
            },
        }))
    }

    /// Apply the outcome of a dispatched submission and return to `Idle`.
    pub fn finish_submit(&mut self, result: Result<JobHandle, RunError>) -> Resolution {
        if !self.is_submitting() {
            tracing::warn!("submission outcome arrived while idle, ignoring");
            return Resolution::Busy;
        }

        let resolution = match result {
            Ok(handle) => {
                tracing::info!(run_id = %handle.run_id, user_id = %self.props.user_id, "documents indexed");
                self.transition(SubmissionState::Succeeded);
                self.notify(Notice::success(
                    MSG_INDEX_SUCCEEDED,
                    format!("Indexed for user: {}", self.props.user_id),
                ));
                self.documents.clear();
                self.open = false;
                let _ = self.events.send(PanelEvent::OpenChanged(false));
                Resolution::Indexed(handle)
            }
            Err(e) => {
                tracing::error!(
                    kind = ?ErrorKind::Remote,
                    error = %e,
                    user_id = %self.props.user_id,
                    "indexing error"
                );
                let message = e.user_message();
                self.transition(SubmissionState::Failed(message.clone()));
                self.notify(Notice::error(MSG_INDEX_FAILED).with_description(message.clone()));
                Resolution::Failed(message)
            }
        };

        self.transition(SubmissionState::Idle);
        resolution
    }

    /// Validate, send, and resolve in one go.
    pub async fn submit(&mut self, connector: &dyn Connector) -> Result<Resolution, SubmitError> {
        let Some(dispatch) = self.begin_submit()? else {
            return Ok(Resolution::Busy);
        };
        let result = dispatch.run(connector).await;
        Ok(self.finish_submit(result))
    }

    fn reject(&self, err: SubmitError) -> SubmitError {
        tracing::warn!(kind = ?err.kind(), "{err}");
        self.notify(Notice::error(err.to_string()));
        err
    }

    fn notify(&self, notice: Notice) {
        let _ = self.events.send(PanelEvent::Notify(notice));
    }

    fn transition(&mut self, next: SubmissionState) {
        self.state = next.clone();
        let _ = self.events.send(PanelEvent::StateChanged(next));
    }
}
