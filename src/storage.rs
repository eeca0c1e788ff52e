//! Durable history storage and JSON export.

use crate::error::StorageError;
use crate::model::HistoryEntry;
use std::path::{Path, PathBuf};

pub const HISTORY_FILE_NAME: &str = "sentimentAnalysisHistory.json";
pub const EXPORT_FILE_NAME: &str = "historico-analise-sentimento.json";

/// Persistence for the whole history array.
pub trait HistoryStore: Send {
    /// Load stored history. A missing store yields an empty list.
    fn load(&self) -> Result<Vec<HistoryEntry>, StorageError>;
    /// Replace stored history with `entries`.
    fn save(&mut self, entries: &[HistoryEntry]) -> Result<(), StorageError>;
    /// Remove stored history entirely.
    fn clear(&mut self) -> Result<(), StorageError>;
}

/// Application data directory, e.g. `~/.local/share/sentiment-cli`.
pub fn base_dir() -> Result<PathBuf, StorageError> {
    dirs::data_dir()
        .map(|d| d.join("sentiment-cli"))
        .ok_or(StorageError::NoDataDir)
}

/// Default location of the history file.
pub fn default_history_path() -> Result<PathBuf, StorageError> {
    Ok(base_dir()?.join(HISTORY_FILE_NAME))
}

/// History kept in a single JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_err(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl HistoryStore for FileStore {
    fn load(&self) -> Result<Vec<HistoryEntry>, StorageError> {
        let data = match std::fs::read(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_err(e)),
        };
        serde_json::from_slice(&data).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&mut self, entries: &[HistoryEntry]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let data = serde_json::to_vec(entries)?;
        // Write then rename so a crash never leaves a half-written file behind.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, data).map_err(|e| self.io_err(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}

/// Write `entries` as pretty-printed JSON to `path`.
pub fn export_json(path: &Path, entries: &[HistoryEntry]) -> Result<(), StorageError> {
    let out = serde_json::to_string_pretty(entries)?;
    std::fs::write(path, out).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::History;
    use crate::model::{Classification, Sentiment};
    use time::macros::datetime;

    fn sample_history() -> History {
        let mut history = History::default();
        let t = datetime!(2026-10-18 14:05 UTC);
        history.record(
            "O produto chegou quebrado e o suporte não respondeu.",
            Classification {
                sentiment: Sentiment::Negative,
                probability: 0.87,
            },
            t,
        );
        history.record(
            "Entrega rápida, recomendo!",
            Classification {
                sentiment: Sentiment::Positive,
                probability: 0.95,
            },
            t + time::Duration::minutes(3),
        );
        history
    }

    #[test]
    fn file_round_trip_preserves_entries_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("nested").join(HISTORY_FILE_NAME));
        let history = sample_history();

        store.save(history.entries()).unwrap();
        let restored = store.load().unwrap();

        assert_eq!(restored, history.entries());
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join(HISTORY_FILE_NAME));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILE_NAME);
        std::fs::write(&path, "{not json").unwrap();
        let store = FileStore::new(&path);
        assert!(matches!(store.load(), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn clear_removes_file_and_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HISTORY_FILE_NAME);
        let mut store = FileStore::new(&path);
        store.save(sample_history().entries()).unwrap();
        store.clear().unwrap();
        assert!(!path.exists());
        store.clear().unwrap();
    }

    #[test]
    fn export_is_pretty_printed_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(EXPORT_FILE_NAME);
        let history = sample_history();
        export_json(&path, history.entries()).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("[\n"));
        let parsed: Vec<HistoryEntry> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, history.entries());
    }
}
