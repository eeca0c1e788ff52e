//! Classification service access.

mod http;

pub use http::HttpSentimentApi;

use crate::error::AnalyzeError;
use crate::model::Classification;
use async_trait::async_trait;

/// Result of one reachability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable,
    Unreachable,
}

/// Remote sentiment classifier.
#[async_trait]
pub trait SentimentApi: Send + Sync {
    /// Lightweight reachability check.
    async fn probe(&self) -> ProbeOutcome;

    /// Classify already-validated, trimmed text.
    async fn classify(&self, text: &str) -> Result<Classification, AnalyzeError>;
}
