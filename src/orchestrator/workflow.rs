//! Analysis workflow: validation, submission, history bookkeeping.
//!
//! All state lives in [`Workflow`]; collaborators are injected so the whole
//! cycle can run against fakes.

use super::view::{Clock, View};
use crate::api::{ProbeOutcome, SentimentApi};
use crate::error::{AnalyzeError, StorageError, MIN_TEXT_CHARS};
use crate::history::{self, History};
use crate::model::{Classification, ConnectivityState, HistoryEntry};
use crate::storage::{self, HistoryStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Explicit user answer required to clear history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Granted,
    Declined,
}

/// An accepted submission. Exactly one must be handed back to
/// [`Workflow::finish_analysis`].
#[derive(Debug)]
pub struct Submission {
    text: String,
}

impl Submission {
    pub fn text(&self) -> &str {
        &self.text
    }
}

pub struct Workflow {
    api: Arc<dyn SentimentApi>,
    store: Box<dyn HistoryStore>,
    clock: Box<dyn Clock>,
    view: Box<dyn View>,
    history: History,
    connectivity: ConnectivityState,
    in_flight: bool,
    recheck_before_submit: bool,
    storage_failures: u64,
}

impl Workflow {
    pub fn new(
        api: Arc<dyn SentimentApi>,
        store: Box<dyn HistoryStore>,
        clock: Box<dyn Clock>,
        view: Box<dyn View>,
    ) -> Self {
        Self {
            api,
            store,
            clock,
            view,
            history: History::default(),
            connectivity: ConnectivityState::checking(),
            in_flight: false,
            recheck_before_submit: false,
            storage_failures: 0,
        }
    }

    /// Re-probe the service before every submission instead of trusting the
    /// last periodic result.
    pub fn with_recheck_before_submit(mut self, recheck: bool) -> Self {
        self.recheck_before_submit = recheck;
        self
    }

    pub fn api(&self) -> Arc<dyn SentimentApi> {
        Arc::clone(&self.api)
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.history.entries()
    }

    #[cfg(test)]
    pub(crate) fn connectivity(&self) -> &ConnectivityState {
        &self.connectivity
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight
    }

    pub fn storage_failures(&self) -> u64 {
        self.storage_failures
    }

    /// Replace in-memory history with the stored one. Failures leave history empty.
    pub fn restore_history(&mut self) {
        match self.store.load() {
            Ok(entries) => {
                debug!(count = entries.len(), "history restored");
                self.history = History::from_entries(entries);
            }
            Err(e) => {
                self.history = History::default();
                self.report_storage_error(e);
            }
        }
        self.view.connectivity(&self.connectivity);
        self.view.history(self.history.entries());
    }

    /// Show example content on an empty history. Nothing is persisted.
    pub fn seed_examples(&mut self) {
        if self.history.is_empty() {
            self.history = History::from_entries(history::demo_entries(self.clock.now()));
            self.view.history(self.history.entries());
        }
        self.view.prefill(history::DEMO_INPUT);
    }

    pub async fn check_connectivity(&mut self) -> bool {
        let outcome = self.api.probe().await;
        self.apply_probe(outcome);
        self.connectivity.connected
    }

    pub fn apply_probe(&mut self, outcome: ProbeOutcome) {
        let state = match outcome {
            ProbeOutcome::Reachable => ConnectivityState::connected(),
            ProbeOutcome::Unreachable => ConnectivityState::disconnected(),
        };
        self.set_connectivity(state);
    }

    fn set_connectivity(&mut self, state: ConnectivityState) {
        if state != self.connectivity {
            info!(connected = state.connected, "connectivity changed");
        }
        self.connectivity = state;
        self.view.connectivity(&self.connectivity);
    }

    /// Accept `text` for classification or reject it with a user-visible error.
    pub fn begin_analysis(&mut self, text: &str) -> Result<Submission, AnalyzeError> {
        match self.check_submission(text) {
            Ok(trimmed) => {
                self.in_flight = true;
                self.view.submitting(true);
                info!(chars = trimmed.chars().count(), "submitting text for analysis");
                Ok(Submission {
                    text: trimmed.to_string(),
                })
            }
            Err(e) => {
                debug!(error = %e, "submission rejected");
                self.view.error(&e.to_string());
                Err(e)
            }
        }
    }

    fn check_submission<'a>(&self, text: &'a str) -> Result<&'a str, AnalyzeError> {
        if self.in_flight {
            return Err(AnalyzeError::Busy);
        }
        let trimmed = validate_text(text)?;
        if !self.connectivity.connected {
            return Err(AnalyzeError::Disconnected);
        }
        Ok(trimmed)
    }

    /// [`begin_analysis`](Self::begin_analysis), preceded by a fresh probe when
    /// re-checking is enabled and the text itself is acceptable.
    pub async fn submit(&mut self, text: &str) -> Result<Submission, AnalyzeError> {
        if self.recheck_before_submit && !self.in_flight && validate_text(text).is_ok() {
            self.check_connectivity().await;
        }
        self.begin_analysis(text)
    }

    /// Apply the outcome of a classification request and return to idle.
    pub fn finish_analysis(
        &mut self,
        submission: Submission,
        outcome: Result<Classification, AnalyzeError>,
    ) -> Result<Classification, AnalyzeError> {
        let res = match outcome {
            Ok(classification) => {
                self.mark_reachable();
                let now = self.clock.now();
                let entry = self.history.record(&submission.text, classification, now);
                info!(
                    id = entry.id(),
                    sentiment = %classification.sentiment,
                    probability = classification.probability,
                    "analysis recorded"
                );
                self.persist();
                self.view.result(&classification);
                self.view.history(self.history.entries());
                Ok(classification)
            }
            Err(e) => {
                if e.is_transport() {
                    self.set_connectivity(ConnectivityState::disconnected());
                } else {
                    self.mark_reachable();
                }
                warn!(error = %e, "analysis failed");
                self.view.error(&e.to_string());
                Err(e)
            }
        };
        self.in_flight = false;
        self.view.submitting(false);
        res
    }

    // Any HTTP answer proves the service is reachable.
    fn mark_reachable(&mut self) {
        if !self.connectivity.connected {
            self.set_connectivity(ConnectivityState::connected());
        }
    }

    /// Run one full analysis on the current task.
    pub async fn analyze(&mut self, text: &str) -> Result<Classification, AnalyzeError> {
        let submission = self.submit(text).await?;
        let outcome = self.api.classify(submission.text()).await;
        self.finish_analysis(submission, outcome)
    }

    /// Empty history in memory and in storage. Returns whether anything was cleared.
    pub fn clear_history(&mut self, confirmation: Confirmation) -> bool {
        if confirmation != Confirmation::Granted {
            debug!("history clear declined");
            return false;
        }
        self.history.clear();
        if let Err(e) = self.store.clear() {
            self.report_storage_error(e);
        }
        info!("history cleared");
        self.view.history(self.history.entries());
        true
    }

    /// Write the current history as pretty JSON to `path`.
    ///
    /// Unlike background persistence, export is user-initiated, so a failure
    /// is shown to the user.
    pub fn export_history(&mut self, path: &Path) -> Result<(), StorageError> {
        match storage::export_json(path, self.history.entries()) {
            Ok(()) => {
                info!(path = %path.display(), count = self.history.len(), "history exported");
                self.view.info(&format!("Exported history: {}", path.display()));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "history export failed");
                self.view.error(&format!("Export failed: {e}"));
                Err(e)
            }
        }
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(self.history.entries()) {
            self.report_storage_error(e);
        }
    }

    fn report_storage_error(&mut self, err: StorageError) {
        self.storage_failures += 1;
        warn!(error = %err, failures = self.storage_failures, "history storage failed");
        self.view.storage_failed(&err);
    }
}

/// Trim `text` and require at least [`MIN_TEXT_CHARS`] characters.
pub fn validate_text(text: &str) -> Result<&str, AnalyzeError> {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_TEXT_CHARS {
        return Err(AnalyzeError::TooShort {
            min: MIN_TEXT_CHARS,
        });
    }
    Ok(trimmed)
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use time::OffsetDateTime;

    /// Scripted service: pops one classify outcome per call.
    #[derive(Default)]
    pub(crate) struct FakeApi {
        pub(crate) reachable: Mutex<bool>,
        pub(crate) outcomes: Mutex<VecDeque<Result<Classification, AnalyzeError>>>,
        pub(crate) classify_calls: AtomicUsize,
        pub(crate) probe_calls: AtomicUsize,
        /// Probes never complete while set.
        pub(crate) stall_probes: AtomicBool,
    }

    impl FakeApi {
        pub(crate) fn reachable() -> Self {
            Self {
                reachable: Mutex::new(true),
                ..Default::default()
            }
        }

        pub(crate) fn push(&self, outcome: Result<Classification, AnalyzeError>) {
            self.outcomes.lock().unwrap().push_back(outcome);
        }

        pub(crate) fn classify_calls(&self) -> usize {
            self.classify_calls.load(Ordering::SeqCst)
        }

        pub(crate) fn probe_calls(&self) -> usize {
            self.probe_calls.load(Ordering::SeqCst)
        }

        pub(crate) fn set_reachable(&self, reachable: bool) {
            *self.reachable.lock().unwrap() = reachable;
        }
    }

    #[async_trait]
    impl SentimentApi for FakeApi {
        async fn probe(&self) -> ProbeOutcome {
            self.probe_calls.fetch_add(1, Ordering::SeqCst);
            if self.stall_probes.load(Ordering::SeqCst) {
                futures::future::pending::<()>().await;
            }
            if *self.reachable.lock().unwrap() {
                ProbeOutcome::Reachable
            } else {
                ProbeOutcome::Unreachable
            }
        }

        async fn classify(&self, _text: &str) -> Result<Classification, AnalyzeError> {
            self.classify_calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(AnalyzeError::InvalidResponse))
        }
    }

    pub(crate) struct FixedClock(pub(crate) OffsetDateTime);

    impl Clock for FixedClock {
        fn now(&self) -> OffsetDateTime {
            self.0
        }
    }

    #[derive(Default)]
    pub(crate) struct Recorded {
        pub(crate) errors: Vec<String>,
        pub(crate) results: Vec<Classification>,
        pub(crate) submitting: Vec<bool>,
        pub(crate) connectivity: Vec<ConnectivityState>,
        pub(crate) history_len: Option<usize>,
        pub(crate) storage_failures: usize,
        pub(crate) prefill: Option<String>,
        pub(crate) info: Vec<String>,
    }

    #[derive(Clone, Default)]
    pub(crate) struct RecordingView(pub(crate) Arc<Mutex<Recorded>>);

    impl View for RecordingView {
        fn connectivity(&mut self, state: &ConnectivityState) {
            self.0.lock().unwrap().connectivity.push(state.clone());
        }
        fn submitting(&mut self, active: bool) {
            self.0.lock().unwrap().submitting.push(active);
        }
        fn result(&mut self, classification: &Classification) {
            self.0.lock().unwrap().results.push(*classification);
        }
        fn error(&mut self, message: &str) {
            self.0.lock().unwrap().errors.push(message.to_string());
        }
        fn history(&mut self, entries: &[HistoryEntry]) {
            self.0.lock().unwrap().history_len = Some(entries.len());
        }
        fn info(&mut self, message: &str) {
            self.0.lock().unwrap().info.push(message.to_string());
        }
        fn prefill(&mut self, text: &str) {
            self.0.lock().unwrap().prefill = Some(text.to_string());
        }
        fn storage_failed(&mut self, _err: &StorageError) {
            self.0.lock().unwrap().storage_failures += 1;
        }
    }
}
