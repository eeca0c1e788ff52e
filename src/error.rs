//! Error types for the analysis workflow and history storage.

use std::path::PathBuf;

/// Minimum number of characters (after trimming) accepted for analysis.
pub const MIN_TEXT_CHARS: usize = 5;

/// Errors surfaced to the user by an analysis attempt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalyzeError {
    #[error("Text must be at least {min} characters long")]
    TooShort { min: usize },

    #[error("Could not connect to the API. Check that the server is running.")]
    Disconnected,

    #[error("An analysis is already in progress")]
    Busy,

    /// Non-success HTTP status; the message is the service's `erro` field when present.
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Invalid response format from API")]
    InvalidResponse,
}

impl AnalyzeError {
    /// True when the failure means the service could not be reached at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, AnalyzeError::Transport(_))
    }
}

/// Durable history read/write failures. Never shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("history file {path} could not be accessed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("history file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("history could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("no data directory available for history storage")]
    NoDataDir,
}
