use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Name of the remote job every submission targets.
pub const INDEXER_ASSISTANT_ID: &str = "indexer";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    pub api_url: Option<String>,
    pub user_id: String,
    pub retriever_provider: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub user_agent: String,
}

/// A validated submission: documents are known to be non-empty and an endpoint exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRequest {
    pub documents: String,
    pub user_id: String,
    pub retriever_provider: String,
}

/// Body shape the indexer job expects. Field names are a wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPayload {
    pub input: RunInput,
    pub config: RunSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInput {
    pub docs: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSettings {
    pub configurable: Configurable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configurable {
    pub user_id: String,
    pub retriever_provider: String,
}

/// Run created by the remote service. Only reported, never polled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    #[serde(default)]
    pub run_id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub assistant_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionState {
    Idle,
    Submitting,
    Succeeded,
    Failed(String),
}

impl SubmissionState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmissionState::Submitting)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// User-facing notification (a toast in the panel, a stderr line in text mode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Notice {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: title.into(),
            description: Some(description.into()),
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Render a single human-readable line.
    pub fn to_message(&self) -> String {
        match self.description.as_deref() {
            Some(desc) if !desc.is_empty() => format!("{}: {}", self.title, desc),
            _ => self.title.clone(),
        }
    }
}

/// Events emitted by the orchestrator and consumed by presentation layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    StateChanged(SubmissionState),
    Notify(Notice),
    OpenChanged(bool),
    View(PanelView),
}

/// Everything a renderer needs to draw the panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelView {
    pub open: bool,
    pub documents: String,
    pub submitting: bool,
    pub can_submit: bool,
    pub user_id: String,
    pub retriever_provider: String,
}

impl PanelView {
    pub fn button_label(&self) -> &'static str {
        if self.submitting {
            "Indexing..."
        } else {
            "Index Documents"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Rejected,
    Failed,
    Succeeded,
}

/// Result of a one-shot submission, printed in `--json` mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub outcome: Outcome,
    pub user_id: String,
    pub retriever_provider: String,
    pub notices: Vec<Notice>,
    #[serde(default)]
    pub run: Option<JobHandle>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_message_includes_description() {
        let n = Notice::error("Failed to index documents").with_description("timeout");
        assert_eq!(n.to_message(), "Failed to index documents: timeout");
        assert_eq!(Notice::error("API URL not configured").to_message(), "API URL not configured");
    }

    #[test]
    fn job_handle_tolerates_sparse_responses() {
        let h: JobHandle = serde_json::from_str(r#"{"run_id":"r-1","status":"pending"}"#).unwrap();
        assert_eq!(h.run_id, "r-1");
        assert_eq!(h.status.as_deref(), Some("pending"));
        assert!(h.thread_id.is_none());
    }

    #[test]
    fn button_label_follows_submitting_flag() {
        let mut view = PanelView::default();
        assert_eq!(view.button_label(), "Index Documents");
        view.submitting = true;
        assert_eq!(view.button_label(), "Indexing...");
    }
}
