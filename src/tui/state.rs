use crate::error::MIN_TEXT_CHARS;
use crate::model::{Classification, ConnectivityState, HistoryEntry, UiEvent};
use std::time::{Duration, Instant};

/// Duration of the confidence gauge fill.
pub const PROGRESS_ANIMATION: Duration = Duration::from_millis(500);

/// Gauge fill interpolating linearly from 0 to `target`.
#[derive(Debug, Clone, Copy)]
pub struct ProgressAnimation {
    target: f64,
    started: Instant,
    duration: Duration,
}

impl ProgressAnimation {
    pub fn new(target: f64, started: Instant) -> Self {
        Self {
            target,
            started,
            duration: PROGRESS_ANIMATION,
        }
    }

    /// Fill ratio at `now`; equals the target once the animation is over.
    pub fn value_at(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed >= self.duration || self.duration.is_zero() {
            return self.target;
        }
        self.target * elapsed.as_secs_f64() / self.duration.as_secs_f64()
    }

    pub fn percent_at(&self, now: Instant) -> u8 {
        crate::metrics::confidence_percent(self.value_at(now))
    }
}

#[derive(Debug, Clone)]
pub struct ShownError {
    pub message: String,
    pub since: Instant,
}

pub struct UiState {
    pub tab: usize,
    pub input: String,
    pub connectivity: ConnectivityState,
    pub submitting: bool,
    pub result: Option<Classification>,
    pub progress: Option<ProgressAnimation>,
    pub error: Option<ShownError>,
    pub info: String,
    pub history: Vec<HistoryEntry>,
    pub history_selected: usize, // 0 = most recent
    pub confirm_clear: bool,
    pub error_dismiss: Duration,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: 0,
            input: String::new(),
            connectivity: ConnectivityState::checking(),
            submitting: false,
            result: None,
            progress: None,
            error: None,
            info: String::new(),
            history: Vec::new(),
            history_selected: 0,
            confirm_clear: false,
            error_dismiss: Duration::from_secs(5),
        }
    }
}

impl UiState {
    pub fn apply_event(&mut self, ev: UiEvent, now: Instant) {
        match ev {
            UiEvent::Connectivity(c) => self.connectivity = c,
            UiEvent::Submitting(active) => {
                self.submitting = active;
                if active {
                    self.error = None;
                    self.result = None;
                    self.progress = None;
                    self.info = "Analyzing…".into();
                } else if self.info == "Analyzing…" {
                    self.info.clear();
                }
            }
            UiEvent::Result(c) => {
                self.result = Some(c);
                self.progress = Some(ProgressAnimation::new(c.probability, now));
            }
            UiEvent::Error(message) => {
                self.error = Some(ShownError {
                    message,
                    since: now,
                });
            }
            UiEvent::History(entries) => {
                self.history = entries;
                if self.history_selected >= self.history.len() {
                    self.history_selected = self.history.len().saturating_sub(1);
                }
            }
            UiEvent::Info(msg) => self.info = msg,
            UiEvent::Prefill(text) => {
                if self.input.is_empty() {
                    self.input = text;
                }
            }
        }
    }

    /// Error message still within its display window.
    pub fn visible_error(&self, now: Instant) -> Option<&str> {
        self.error
            .as_ref()
            .filter(|e| now.saturating_duration_since(e.since) < self.error_dismiss)
            .map(|e| e.message.as_str())
    }

    pub fn expire_error(&mut self, now: Instant) {
        if self.error.is_some() && self.visible_error(now).is_none() {
            self.error = None;
        }
    }

    pub fn char_count(&self) -> usize {
        self.input.chars().count()
    }

    pub fn input_too_short(&self) -> bool {
        self.char_count() < MIN_TEXT_CHARS
    }

    pub fn select_prev(&mut self) {
        self.history_selected = self.history_selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if self.history_selected + 1 < self.history.len() {
            self.history_selected += 1;
        }
    }

    /// Copy the selected entry's full text into the input box.
    pub fn reuse_selected(&mut self) -> bool {
        match self.history.get(self.history_selected) {
            Some(entry) => {
                self.input = entry.full_text().to_string();
                true
            }
            None => false,
        }
    }
}
