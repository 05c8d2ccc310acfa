//! Post-submission processing for non-interactive modes.
//!
//! Folds the panel's event stream and the submit result into a `SubmissionReport`.

use super::panel::{PanelProps, Resolution, SubmitError};
use crate::model::{Outcome, PanelEvent, SubmissionReport};
use tokio::sync::mpsc::UnboundedReceiver;

/// Build the report for a finished one-shot submission.
pub(crate) fn build_report(
    props: &PanelProps,
    result: Result<Resolution, SubmitError>,
    events: &mut UnboundedReceiver<PanelEvent>,
) -> SubmissionReport {
    let mut notices = Vec::new();
    while let Ok(ev) = events.try_recv() {
        if let PanelEvent::Notify(n) = ev {
            notices.push(n);
        }
    }

    let (outcome, run) = match result {
        Ok(Resolution::Indexed(handle)) => (Outcome::Succeeded, Some(handle)),
        Ok(Resolution::Failed(_)) | Ok(Resolution::Busy) => (Outcome::Failed, None),
        Err(_) => (Outcome::Rejected, None),
    };

    SubmissionReport {
        outcome,
        user_id: props.user_id.clone(),
        retriever_provider: props.retriever_provider.clone(),
        notices,
        run,
    }
}
