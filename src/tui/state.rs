use crate::model::{Notice, PanelEvent, PanelView, SubmissionState};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

const MAX_NOTICES: usize = 4;
const NOTICE_TTL: Duration = Duration::from_secs(6);

pub struct UiState {
    pub view: PanelView,
    pub submission: SubmissionState,
    pub notices: VecDeque<(Notice, Instant)>,
    pub show_help: bool,
    pub api_url: Option<String>,
    pub runs_indexed: u64,
    /// Reason of the most recent failure, cleared by the next success.
    pub last_failure: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            view: PanelView::default(),
            submission: SubmissionState::Idle,
            notices: VecDeque::new(),
            show_help: false,
            api_url: None,
            runs_indexed: 0,
            last_failure: None,
        }
    }
}

impl UiState {
    pub fn push_notice(&mut self, notice: Notice, now: Instant) {
        self.notices.push_back((notice, now));
        while self.notices.len() > MAX_NOTICES {
            self.notices.pop_front();
        }
    }

    pub fn expire_notices(&mut self, now: Instant) {
        self.notices
            .retain(|(_, at)| now.saturating_duration_since(*at) < NOTICE_TTL);
    }

    /// Fold one orchestrator event into the render state.
    pub fn apply_event(&mut self, ev: PanelEvent, now: Instant) {
        match ev {
            PanelEvent::View(view) => self.view = view,
            PanelEvent::Notify(notice) => self.push_notice(notice, now),
            PanelEvent::OpenChanged(open) => self.view.open = open,
            PanelEvent::StateChanged(state) => {
                match &state {
                    SubmissionState::Succeeded => {
                        self.runs_indexed += 1;
                        self.last_failure = None;
                    }
                    SubmissionState::Failed(reason) => {
                        self.last_failure = Some(reason.clone());
                    }
                    _ => {}
                }
                self.submission = state;
            }
        }
    }

    /// Number of leading rows to skip so the tail of the documents (and the
    /// cursor) stays visible in a box `width` columns wide.
    pub fn documents_scroll(&self, visible_rows: u16, width: u16) -> u16 {
        let width = usize::from(width.max(1));
        let last = self.view.documents.split('\n').count().saturating_sub(1);
        let rows: usize = self
            .view
            .documents
            .split('\n')
            .enumerate()
            .map(|(i, line)| {
                // the cursor glyph trails the last line
                let cursor = usize::from(i == last && !self.view.submitting);
                wrapped_rows(line, width, cursor)
            })
            .sum();
        u16::try_from(rows)
            .unwrap_or(u16::MAX)
            .saturating_sub(visible_rows.max(1))
    }
}

/// Rows a line occupies under word wrapping, `extra` trailing columns included.
fn wrapped_rows(line: &str, width: usize, extra: usize) -> usize {
    let mut rows = 1;
    let mut col = 0;
    let words: Vec<usize> = line.split(' ').map(|w| w.chars().count()).collect();
    let n = words.len();
    for (i, mut w) in words.into_iter().enumerate() {
        if i + 1 == n {
            w += extra;
        }
        let needed = if col == 0 { w } else { col + 1 + w };
        if needed <= width {
            col = needed;
            continue;
        }
        if col > 0 {
            rows += 1;
        }
        if w == 0 {
            col = 0;
        } else {
            rows += (w - 1) / width;
            col = (w - 1) % width + 1;
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_are_capped_and_expire() {
        let mut s = UiState::default();
        let t0 = Instant::now();
        for i in 0..6 {
            s.push_notice(Notice::error(format!("n{i}")), t0);
        }
        assert_eq!(s.notices.len(), MAX_NOTICES);
        assert_eq!(s.notices.front().map(|(n, _)| n.title.as_str()), Some("n2"));

        s.expire_notices(t0 + NOTICE_TTL + Duration::from_millis(1));
        assert!(s.notices.is_empty());
    }

    #[test]
    fn events_update_view_and_counters() {
        let mut s = UiState::default();
        let now = Instant::now();
        s.apply_event(
            PanelEvent::View(PanelView {
                open: true,
                documents: "abc".into(),
                ..Default::default()
            }),
            now,
        );
        assert!(s.view.open);

        s.apply_event(PanelEvent::StateChanged(SubmissionState::Succeeded), now);
        s.apply_event(PanelEvent::OpenChanged(false), now);
        assert_eq!(s.runs_indexed, 1);
        assert!(!s.view.open);
        assert_eq!(s.submission, SubmissionState::Succeeded);
    }

    #[test]
    fn failure_reason_outlives_return_to_idle() {
        let mut s = UiState::default();
        let now = Instant::now();
        for state in [
            SubmissionState::Submitting,
            SubmissionState::Failed("HTTP 504: timeout".into()),
            SubmissionState::Idle,
        ] {
            s.apply_event(PanelEvent::StateChanged(state), now);
        }
        assert_eq!(s.submission, SubmissionState::Idle);
        assert_eq!(s.last_failure.as_deref(), Some("HTTP 504: timeout"));

        s.apply_event(PanelEvent::StateChanged(SubmissionState::Succeeded), now);
        assert_eq!(s.last_failure, None);
    }

    #[test]
    fn scroll_keeps_last_lines_visible() {
        let mut s = UiState::default();
        s.view.documents = "1\n2\n3\n4\n5".into();
        assert_eq!(s.documents_scroll(3, 40), 2);
        assert_eq!(s.documents_scroll(10, 40), 0);
    }

    #[test]
    fn scroll_counts_soft_wrapped_rows() {
        let mut s = UiState::default();
        // 10 chars + cursor in a 4-column box: 3 rows
        s.view.documents = "aaaaaaaaaa".into();
        assert_eq!(s.documents_scroll(1, 4), 2);

        // words wrap before overflowing: "one two" | "three" + cursor
        s.view.documents = "one two three".into();
        assert_eq!(s.documents_scroll(1, 7), 1);

        s.view.submitting = true;
        s.view.documents = "abcd".into();
        assert_eq!(s.documents_scroll(1, 4), 0);
    }
}
