//! Submission lifecycle controller.
//!
//! Owns the `Panel`, applies UI commands, runs at most one dispatch task at a
//! time and feeds its outcome back into the panel.

use super::panel::{InputEdit, Panel};
use crate::client::{Connector, RunError};
use crate::model::JobHandle;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

/// Commands emitted by UI layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UiCommand {
    Edit(InputEdit),
    Submit,
    SetOpen(bool),
    Quit,
}

/// Spawn the create-run call for an accepted submission.
fn start_dispatch(
    dispatch: super::panel::Dispatch,
    connector: Arc<dyn Connector>,
) -> JoinHandle<Result<JobHandle, RunError>> {
    tokio::spawn(async move { dispatch.run(connector.as_ref()).await })
}

/// Drive the panel from UI commands until quit. Views are published after
/// every command and every resolution.
pub(crate) async fn run_controller(
    mut panel: Panel,
    connector: Arc<dyn Connector>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut in_flight: Option<JoinHandle<Result<JobHandle, RunError>>> = None;
    let mut quit_pending = false;

    panel.publish_view();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv(), if !quit_pending => {
                match cmd {
                    Some(UiCommand::Edit(edit)) => {
                        panel.edit(edit);
                    }
                    Some(UiCommand::Submit) => match panel.begin_submit() {
                        Ok(Some(dispatch)) => {
                            in_flight = Some(start_dispatch(dispatch, connector.clone()));
                        }
                        Ok(None) => {}
                        Err(e) => tracing::debug!(error = %e, "submit refused"),
                    },
                    Some(UiCommand::SetOpen(open)) => panel.set_open(open),
                    Some(UiCommand::Quit) | None => {
                        // In-flight runs are never aborted; wait for them before leaving.
                        if in_flight.is_none() {
                            break;
                        }
                        tracing::info!("waiting for in-flight submission before exiting");
                        quit_pending = true;
                    }
                }
                panel.publish_view();
            }
            // Only take the handle once it has completed, so losing the race to
            // another branch never drops it.
            join_res = async {
                match in_flight.as_mut() {
                    Some(h) => h.await,
                    None => futures::future::pending().await,
                }
            } => {
                in_flight = None;
                let result = match join_res {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::error!(error = %e, "dispatch task failed");
                        Err(RunError::Unknown)
                    }
                };
                panel.finish_submit(result);
                panel.publish_view();
                if quit_pending {
                    break;
                }
            }
        }
    }

    Ok(())
}
