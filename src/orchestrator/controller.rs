//! Event loop that owns the workflow.
//!
//! Receives UI commands, runs the periodic connectivity probe, and applies
//! finished requests. Network calls run on spawned tasks so probes and
//! submissions never wait on each other.

use super::workflow::{Confirmation, Submission, Workflow};
use crate::api::ProbeOutcome;
use crate::error::AnalyzeError;
use crate::model::Classification;
use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Analyze(String),
    CheckConnection,
    ClearHistory(Confirmation),
    ExportHistory(PathBuf),
    Quit,
}

/// The request currently outstanding, if any.
struct InFlight {
    submission: Submission,
    handle: JoinHandle<Result<Classification, AnalyzeError>>,
}

fn spawn_classify(workflow: &Workflow, submission: Submission) -> InFlight {
    let api = workflow.api();
    let text = submission.text().to_string();
    let handle = tokio::spawn(async move { api.classify(&text).await });
    InFlight { submission, handle }
}

fn spawn_probe(workflow: &Workflow) -> JoinHandle<ProbeOutcome> {
    let api = workflow.api();
    tokio::spawn(async move { api.probe().await })
}

/// Drive `workflow` until the UI quits or the command channel closes.
pub(crate) async fn run_controller(
    mut workflow: Workflow,
    probe_interval: Duration,
    seed_examples: bool,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    workflow.restore_history();
    if seed_examples {
        workflow.seed_examples();
    }

    // First tick fires immediately, giving the startup probe.
    let mut ticker = tokio::time::interval(probe_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut in_flight: Option<InFlight> = None;
    let mut probe: Option<JoinHandle<ProbeOutcome>> = None;

    let res = loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Analyze(text)) => {
                        if let Ok(submission) = workflow.submit(&text).await {
                            in_flight = Some(spawn_classify(&workflow, submission));
                        }
                    }
                    Some(UiCommand::CheckConnection) => {
                        if probe.is_none() {
                            probe = Some(spawn_probe(&workflow));
                        }
                    }
                    Some(UiCommand::ClearHistory(confirmation)) => {
                        workflow.clear_history(confirmation);
                    }
                    Some(UiCommand::ExportHistory(path)) => {
                        let _ = workflow.export_history(&path);
                    }
                    Some(UiCommand::Quit) | None => break Ok(()),
                }
            }
            // Only take the handle once this branch has won; otherwise completion is lost.
            done = async {
                if let Some(f) = &mut in_flight {
                    return (&mut f.handle).await;
                }
                futures::future::pending().await
            } => {
                if let Some(f) = in_flight.take() {
                    let outcome = done.unwrap_or_else(|e| {
                        Err(AnalyzeError::Transport(format!("request task failed: {e}")))
                    });
                    let _ = workflow.finish_analysis(f.submission, outcome);
                }
            }
            probed = async {
                if let Some(h) = &mut probe {
                    return h.await;
                }
                futures::future::pending().await
            } => {
                probe = None;
                workflow.apply_probe(probed.unwrap_or(ProbeOutcome::Unreachable));
            }
            _ = ticker.tick() => {
                // A probe still outstanding from the previous tick makes this one a no-op.
                if probe.is_none() {
                    debug!("periodic connectivity probe");
                    probe = Some(spawn_probe(&workflow));
                }
            }
        }
    };

    if let Some(f) = in_flight {
        debug!(submitting = workflow.is_submitting(), "dropping in-flight analysis");
        f.handle.abort();
    }
    if let Some(h) = probe {
        h.abort();
    }
    res
}
