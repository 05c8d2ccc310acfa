//! Text summary builder for CLI output.
//!
//! Notices go to stderr, the created run id to stdout so it can be piped.

use crate::model::{NoticeKind, Outcome, SubmissionReport};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

pub(crate) fn build_text_summary(report: &SubmissionReport) -> TextSummary {
    let mut stderr = Vec::new();
    let mut stdout = Vec::new();

    stderr.push(format!(
        "User: {} / Retriever: {}",
        report.user_id, report.retriever_provider
    ));

    for notice in &report.notices {
        let marker = match notice.kind {
            NoticeKind::Success => "ok",
            NoticeKind::Error => "error",
        };
        stderr.push(format!("[{marker}] {}", notice.to_message()));
    }

    if report.outcome == Outcome::Succeeded {
        if let Some(run) = report.run.as_ref() {
            if !run.run_id.is_empty() {
                stdout.push(run.run_id.clone());
            }
            if let Some(status) = run.status.as_deref() {
                stderr.push(format!("Run status: {status}"));
            }
        }
    }

    TextSummary { stdout, stderr }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{JobHandle, Notice};

    fn report(outcome: Outcome, notices: Vec<Notice>, run: Option<JobHandle>) -> SubmissionReport {
        SubmissionReport {
            outcome,
            user_id: "alice".into(),
            retriever_provider: "mongodb".into(),
            notices,
            run,
        }
    }

    #[test]
    fn success_prints_run_id_on_stdout() {
        let r = report(
            Outcome::Succeeded,
            vec![Notice::success(
                "Documents indexed successfully",
                "Indexed for user: alice",
            )],
            Some(JobHandle {
                run_id: "run-42".into(),
                status: Some("pending".into()),
                ..Default::default()
            }),
        );
        let s = build_text_summary(&r);
        assert_eq!(s.stdout, vec!["run-42".to_string()]);
        assert!(s
            .stderr
            .contains(&"[ok] Documents indexed successfully: Indexed for user: alice".to_string()));
        assert!(s.stderr.contains(&"Run status: pending".to_string()));
    }

    #[test]
    fn failure_prints_nothing_on_stdout() {
        let r = report(
            Outcome::Failed,
            vec![Notice::error("Failed to index documents").with_description("HTTP 504: timeout")],
            None,
        );
        let s = build_text_summary(&r);
        assert!(s.stdout.is_empty());
        assert_eq!(
            s.stderr.last().map(String::as_str),
            Some("[error] Failed to index documents: HTTP 504: timeout")
        );
    }
}
