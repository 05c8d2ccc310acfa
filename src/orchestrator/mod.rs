//! Submission orchestration.
//!
//! The `panel` state machine validates input and tracks the in-flight flag, the
//! `controller` drives it from UI commands, and `post_process` turns a one-shot
//! submission into a report for text/JSON output.

mod controller;
mod panel;
mod post_process;
#[cfg(test)]
pub(crate) mod testing;

#[cfg_attr(not(feature = "tui"), allow(unused_imports))]
pub(crate) use controller::{run_controller, UiCommand};
pub(crate) use panel::{InputEdit, Panel, PanelProps};
pub(crate) use post_process::build_report;
