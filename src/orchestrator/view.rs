//! Presentation seam for the workflow.

use crate::error::StorageError;
use crate::model::{Classification, ConnectivityState, HistoryEntry, UiEvent};
use time::{OffsetDateTime, UtcOffset};
use tokio::sync::mpsc::UnboundedSender;

/// Render/update operations the workflow drives. Implemented by the TUI
/// (through [`ChannelView`]) and by the console output of text mode.
pub trait View: Send {
    fn connectivity(&mut self, state: &ConnectivityState);
    fn submitting(&mut self, active: bool);
    fn result(&mut self, classification: &Classification);
    fn error(&mut self, message: &str);
    fn history(&mut self, entries: &[HistoryEntry]);

    fn info(&mut self, _message: &str) {}

    fn prefill(&mut self, _text: &str) {}

    /// Storage failures are reported here and never shown as user errors.
    fn storage_failed(&mut self, _err: &StorageError) {}
}

/// Forwards every update as a [`UiEvent`] to a UI running on another thread.
pub struct ChannelView {
    tx: UnboundedSender<UiEvent>,
}

impl ChannelView {
    pub fn new(tx: UnboundedSender<UiEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, ev: UiEvent) {
        // The UI may already be gone during shutdown.
        let _ = self.tx.send(ev);
    }
}

impl View for ChannelView {
    fn connectivity(&mut self, state: &ConnectivityState) {
        self.send(UiEvent::Connectivity(state.clone()));
    }

    fn submitting(&mut self, active: bool) {
        self.send(UiEvent::Submitting(active));
    }

    fn result(&mut self, classification: &Classification) {
        self.send(UiEvent::Result(*classification));
    }

    fn error(&mut self, message: &str) {
        self.send(UiEvent::Error(message.to_string()));
    }

    fn history(&mut self, entries: &[HistoryEntry]) {
        self.send(UiEvent::History(entries.to_vec()));
    }

    fn info(&mut self, message: &str) {
        self.send(UiEvent::Info(message.to_string()));
    }

    fn prefill(&mut self, text: &str) {
        self.send(UiEvent::Prefill(text.to_string()));
    }
}

/// Source of "now" for history timestamps.
pub trait Clock: Send {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock in a fixed offset captured at startup.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}
