use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::Attempt;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Failed to create history directory: {0}")]
    CreateDirectory(std::io::Error),

    #[error("Failed to write history file: {0}")]
    WriteFile(std::io::Error),

    #[error("Failed to replace history file: {0}")]
    ReplaceFile(std::io::Error),

    #[error("Failed to serialize history: {0}")]
    Serialize(serde_json::Error),
}

const SCHEMA_VERSION: u32 = 1;

/// The persisted document: a version field plus the attempt list.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryDocument {
    schema_version: u32,
    attempts: Vec<Attempt>,
}

/// Accepts current documents, bare attempt arrays from before the version
/// field existed, and version-less objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredHistory {
    Document {
        #[serde(rename = "schemaVersion", default)]
        #[allow(dead_code)]
        schema_version: u32,
        attempts: Vec<Attempt>,
    },
    Legacy(Vec<Attempt>),
}

impl StoredHistory {
    fn into_attempts(self) -> Vec<Attempt> {
        match self {
            Self::Document { attempts, .. } => attempts,
            Self::Legacy(attempts) => attempts,
        }
    }
}

/// File-backed store for completed attempts.
///
/// A missing file reads as an empty history, and so does a malformed one;
/// writes go to a temporary sibling first and replace the target atomically.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load all stored attempts.
    pub fn load(&self) -> Vec<Attempt> {
        let Ok(content) = fs::read_to_string(&self.path) else {
            debug!(path = %self.path.display(), "no history file, starting empty");
            return Vec::new();
        };

        match serde_json::from_str::<StoredHistory>(&content) {
            Ok(stored) => stored.into_attempts(),
            Err(error) => {
                debug!(%error, "malformed history coerced to empty");
                Vec::new()
            }
        }
    }

    /// Replace the stored history with `attempts`.
    pub fn save(&self, attempts: &[Attempt]) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(HistoryError::CreateDirectory)?;
            }
        }

        let document = HistoryDocument {
            schema_version: SCHEMA_VERSION,
            attempts: attempts.to_vec(),
        };
        let json = serde_json::to_string_pretty(&document).map_err(HistoryError::Serialize)?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, json).map_err(HistoryError::WriteFile)?;
        fs::rename(&temp_path, &self.path).map_err(HistoryError::ReplaceFile)?;

        debug!(path = %self.path.display(), count = attempts.len(), "history saved");
        Ok(())
    }

    /// Append one attempt to the stored history.
    pub fn append(&self, attempt: Attempt) -> Result<(), HistoryError> {
        let mut attempts = self.load();
        attempts.push(attempt);
        self.save(&attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AttemptContext, Counters, Segment, Settings, TextRange};

    fn attempt(id: &str) -> Attempt {
        let segment = Segment {
            index: 0,
            start_line: 1,
            end_line: 5,
            text: "hello".into(),
            start_offset: 0,
            end_offset: 5,
            comment_ranges: Vec::<TextRange>::new(),
        };
        let context = AttemptContext {
            id: id.into(),
            file_path: "/tmp/x.rs".into(),
            file_name: "x.rs".into(),
            start_at_ms: 0,
            end_at_ms: 30_000,
        };
        Attempt::assemble(context, &segment, &Settings::default(), &Counters::default())
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));

        store.append(attempt("a")).unwrap();
        store.append(attempt("b")).unwrap();

        let attempts = store.load();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].id, "a");
        assert_eq!(attempts[1].id, "b");
    }

    #[test]
    fn test_document_has_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let store = HistoryStore::new(&path);
        store.save(&[attempt("a")]).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["schemaVersion"], 1);
        assert!(raw["attempts"].is_array());
    }

    #[test]
    fn test_legacy_bare_array_coerced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let legacy = serde_json::to_string(&vec![attempt("old")]).unwrap();
        fs::write(&path, legacy).unwrap();

        let store = HistoryStore::new(&path);
        let attempts = store.load();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].id, "old");

        // Saving rewrites into the versioned layout
        store.save(&attempts).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["schemaVersion"], 1);
    }

    #[test]
    fn test_versionless_object_coerced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let doc = serde_json::json!({ "attempts": [attempt("x")] });
        fs::write(&path, doc.to_string()).unwrap();

        let attempts = HistoryStore::new(&path).load();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].id, "x");
    }

    #[test]
    fn test_malformed_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(HistoryStore::new(&path).load().is_empty());
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        HistoryStore::new(&path).save(&[attempt("a")]).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec!["history.json"]);
    }
}
