//! Persistence of the downloaded-id set.
//!
//! The state file is a JSON list of recording ids, written in sorted order
//! so diffs between passes are stable. Logically it is a set: order on disk
//! never affects behavior.
//!
//! Load-side problems are deliberately non-fatal. A missing file is the
//! expected first-run condition, and an unreadable or malformed file
//! degrades to the empty set: re-downloading costs at most duplicate work,
//! while crashing would lose track of history entirely.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::inventory::RecordingId;

/// Errors raised while persisting state.
#[derive(Debug, Error)]
pub enum StateError {
    /// The id set could not be serialized.
    #[error("could not serialize state: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },

    /// The state file could not be written.
    #[error("could not write state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Loads and saves the set of already-downloaded recording ids.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted id set.
    ///
    /// Returns the empty set when the file is missing (first run), or when
    /// it cannot be read or parsed — with a warning in the latter cases.
    #[must_use]
    pub fn load(&self) -> HashSet<RecordingId> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "state file not found, starting with a clean state");
                return HashSet::new();
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "could not read state file, starting with a clean state"
                );
                return HashSet::new();
            }
        };

        match serde_json::from_str::<Vec<RecordingId>>(&contents) {
            Ok(ids) => {
                let ids: HashSet<RecordingId> = ids.into_iter().collect();
                info!(count = ids.len(), "loaded previously downloaded recording ids");
                ids
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "state file is malformed, starting with a clean state"
                );
                HashSet::new()
            }
        }
    }

    /// Persists the id set as a sorted JSON list, overwriting prior content.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when serialization or the write fails. Callers
    /// treat this as non-fatal: downloaded files stay on disk and the ids
    /// are simply re-attempted next pass.
    pub fn save(&self, ids: &HashSet<RecordingId>) -> Result<(), StateError> {
        let mut sorted: Vec<&RecordingId> = ids.iter().collect();
        sorted.sort();

        let json = serde_json::to_string_pretty(&sorted)
            .map_err(|source| StateError::Serialize { source })?;
        std::fs::write(&self.path, json).map_err(|source| StateError::Io {
            path: self.path.clone(),
            source,
        })?;

        info!(path = %self.path.display(), count = ids.len(), "state file updated");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn ids(values: &[&str]) -> HashSet<RecordingId> {
        values.iter().map(|value| RecordingId::new(*value)).collect()
    }

    #[test]
    fn test_load_missing_file_returns_empty_set() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        let original = ids(&["b", "a", "c"]);

        store.save(&original).unwrap();
        assert_eq!(store.load(), original);
    }

    #[test]
    fn test_save_writes_sorted_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let store = StateStore::new(&path);

        store.save(&ids(&["zeta", "alpha", "mid"])).unwrap();

        let on_disk: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_load_malformed_file_returns_empty_set() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{{{ not json").unwrap();

        let store = StateStore::new(&path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_load_wrong_shape_returns_empty_set() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"ids": ["a"]}"#).unwrap();

        let store = StateStore::new(&path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_load_accepts_integer_ids_from_older_state_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let store = StateStore::new(&path);
        assert_eq!(store.load(), ids(&["1", "2", "3"]));
    }

    #[test]
    fn test_save_overwrites_previous_content() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        store.save(&ids(&["a", "b"])).unwrap();
        store.save(&ids(&["c"])).unwrap();

        assert_eq!(store.load(), ids(&["c"]));
    }

    #[test]
    fn test_save_to_unwritable_path_reports_io_error() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("no-such-dir").join("state.json"));
        let result = store.save(&ids(&["a"]));
        assert!(matches!(result, Err(StateError::Io { .. })));
    }
}
