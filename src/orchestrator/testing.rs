//! Test doubles for the run client seam.

use crate::client::{Connector, RunClient, RunError};
use crate::model::{JobHandle, Notice, PanelEvent, RunPayload};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub api_url: String,
    pub thread_id: Option<String>,
    pub assistant_id: String,
    pub payload: RunPayload,
}

#[derive(Debug, Clone)]
enum Behavior {
    Resolve,
    Reject(String),
    FailConnect,
    Panic,
}

#[derive(Clone)]
pub struct MockConnector {
    behavior: Behavior,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    gate: Option<Arc<Notify>>,
}

impl MockConnector {
    fn with(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(Mutex::new(Vec::new())),
            gate: None,
        }
    }

    pub fn resolving() -> Self {
        Self::with(Behavior::Resolve)
    }

    pub fn rejecting(message: &str) -> Self {
        Self::with(Behavior::Reject(message.to_string()))
    }

    pub fn failing_connect() -> Self {
        Self::with(Behavior::FailConnect)
    }

    /// `create_run` panics after recording the call.
    pub fn panicking() -> Self {
        Self::with(Behavior::Panic)
    }

    /// Hold every `create_run` until the returned handle is notified.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

struct MockClient {
    api_url: String,
    parent: MockConnector,
}

#[async_trait]
impl RunClient for MockClient {
    async fn create_run(
        &self,
        thread_id: Option<&str>,
        assistant_id: &str,
        payload: &RunPayload,
    ) -> Result<JobHandle, RunError> {
        self.parent.calls.lock().unwrap().push(RecordedCall {
            api_url: self.api_url.clone(),
            thread_id: thread_id.map(str::to_string),
            assistant_id: assistant_id.to_string(),
            payload: payload.clone(),
        });
        if let Some(gate) = &self.parent.gate {
            gate.notified().await;
        }
        match &self.parent.behavior {
            Behavior::Reject(msg) => Err(RunError::Http {
                status: 504,
                body: msg.clone(),
            }),
            Behavior::Panic => panic!("run client blew up"),
            _ => Ok(JobHandle {
                run_id: "run-1".into(),
                assistant_id: Some(assistant_id.to_string()),
                status: Some("pending".into()),
                ..Default::default()
            }),
        }
    }
}

impl Connector for MockConnector {
    fn connect(&self, api_url: &str) -> Result<Box<dyn RunClient>, RunError> {
        if matches!(self.behavior, Behavior::FailConnect) {
            return Err(RunError::InvalidEndpoint {
                url: api_url.to_string(),
                reason: "refused by test".into(),
            });
        }
        Ok(Box::new(MockClient {
            api_url: api_url.to_string(),
            parent: self.clone(),
        }))
    }
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<PanelEvent>) -> Vec<PanelEvent> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

pub fn notices(events: &[PanelEvent]) -> Vec<Notice> {
    events
        .iter()
        .filter_map(|e| match e {
            PanelEvent::Notify(n) => Some(n.clone()),
            _ => None,
        })
        .collect()
}
