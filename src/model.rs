use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime settings assembled from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub history_path: PathBuf,
    pub probe_interval: Duration,
    pub error_dismiss: Duration,
    pub recheck_before_submit: bool,
    pub seed_examples: bool,
}

/// Outcome label returned by the classification service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    #[serde(rename = "positivo", alias = "positive")]
    Positive,
    #[serde(rename = "negativo", alias = "negative")]
    Negative,
}

impl Sentiment {
    /// Parse a raw label from the service (case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "positivo" | "positive" => Some(Sentiment::Positive),
            "negativo" | "negative" => Some(Sentiment::Negative),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated classification result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub sentiment: Sentiment,
    pub probability: f64,
}

/// One past analysis. Field names match the stored/exported JSON layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    id: i64,
    #[serde(rename = "text")]
    display_text: String,
    #[serde(rename = "fullText")]
    full_text: String,
    sentiment: Sentiment,
    probability: f64,
    timestamp: String,
}

impl HistoryEntry {
    pub(crate) fn new(
        id: i64,
        full_text: &str,
        classification: Classification,
        timestamp: String,
    ) -> Self {
        Self {
            id,
            display_text: truncate_display(full_text),
            full_text: full_text.to_string(),
            sentiment: classification.sentiment,
            probability: classification.probability,
            timestamp,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn sentiment(&self) -> Sentiment {
        self.sentiment
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

pub const DISPLAY_TEXT_MAX_CHARS: usize = 50;

/// Truncate to [`DISPLAY_TEXT_MAX_CHARS`] characters, appending `...` when cut.
pub fn truncate_display(text: &str) -> String {
    if text.chars().count() > DISPLAY_TEXT_MAX_CHARS {
        let head: String = text.chars().take(DISPLAY_TEXT_MAX_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityState {
    pub connected: bool,
    pub message: String,
}

impl ConnectivityState {
    pub fn checking() -> Self {
        Self {
            connected: false,
            message: "Checking API connection…".into(),
        }
    }

    pub fn connected() -> Self {
        Self {
            connected: true,
            message: "Connected to API".into(),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            connected: false,
            message: "API unavailable".into(),
        }
    }
}

impl Default for ConnectivityState {
    fn default() -> Self {
        Self::checking()
    }
}

/// Request body for `POST /sentiment`.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyRequest<'a> {
    pub text: &'a str,
}

/// Raw success body. Both fields are optional so shape errors can be reported
/// as such instead of as JSON decoding failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassifyResponse {
    #[serde(default)]
    pub previsao: Option<String>,
    #[serde(default)]
    pub probabilidade: Option<f64>,
}

/// Error body optionally returned on non-success status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub erro: Option<String>,
}

/// Events emitted by the workflow and consumed by presentation layers.
#[derive(Debug, Clone)]
pub enum UiEvent {
    Connectivity(ConnectivityState),
    Submitting(bool),
    Result(Classification),
    Error(String),
    History(Vec<HistoryEntry>),
    Info(String),
    /// Prefill the input box (demo content).
    Prefill(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_text_on_char_boundary() {
        let text = "é".repeat(60);
        let shown = truncate_display(&text);
        assert_eq!(shown.chars().count(), DISPLAY_TEXT_MAX_CHARS + 3);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn short_text_is_not_truncated() {
        let text = "a".repeat(DISPLAY_TEXT_MAX_CHARS);
        assert_eq!(truncate_display(&text), text);
    }

    #[test]
    fn labels_parse_in_both_languages() {
        assert_eq!(Sentiment::from_label("POSITIVO"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::from_label("negative"), Some(Sentiment::Negative));
        assert_eq!(Sentiment::from_label("neutro"), None);
    }

    #[test]
    fn entry_uses_stored_field_names() {
        let entry = HistoryEntry::new(
            1,
            "Gostei muito",
            Classification {
                sentiment: Sentiment::Positive,
                probability: 0.9,
            },
            "10:30".into(),
        );
        let v = serde_json::to_value(&entry).unwrap();
        assert_eq!(v["text"], "Gostei muito");
        assert_eq!(v["fullText"], "Gostei muito");
        assert_eq!(v["sentiment"], "positivo");
    }

    #[test]
    fn english_sentiment_is_accepted_on_read() {
        let raw = r#"{"id":5,"text":"t","fullText":"t","sentiment":"negative","probability":0.4,"timestamp":"09:00"}"#;
        let entry: HistoryEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.sentiment(), Sentiment::Negative);
    }
}
