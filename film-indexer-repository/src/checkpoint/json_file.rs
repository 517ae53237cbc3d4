//! JSON file checkpoint store.
//!
//! The whole mapping lives in one JSON object file, e.g.
//! `{"filmwork": "2021-06-16T20:14:09.221855Z"}`. Every `set` rewrites the
//! file: the new content goes to a sibling `.tmp` file which is then renamed
//! over the original, so a crash mid-write leaves the previous state intact.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::errors::CheckpointError;
use crate::interfaces::CheckpointStore;
use film_indexer_shared::{EntityKind, Watermark};

type StateMap = BTreeMap<String, Watermark>;

/// Checkpoint store backed by a single JSON file.
pub struct JsonFileCheckpointStore {
    path: PathBuf,
    // Serializes read-modify-write cycles issued through this instance.
    write_lock: Mutex<()>,
}

impl JsonFileCheckpointStore {
    /// Create a store for the given file. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store for one entity kind inside a state directory: `<dir>/<kind>_state.json`.
    pub fn for_kind(state_dir: impl AsRef<Path>, kind: EntityKind) -> Self {
        Self::new(state_dir.as_ref().join(format!("{}_state.json", kind)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_state(&self) -> Result<StateMap, CheckpointError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StateMap::new()),
            Err(e) => return Err(CheckpointError::io(&self.path, e)),
        };

        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| CheckpointError::corrupted(&self.path, e.to_string()))
    }

    fn write_state(&self, state: &StateMap) -> Result<(), CheckpointError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| CheckpointError::io(parent, e))?;
            }
        }

        let temp_path = self.path.with_extension("json.tmp");
        let file = File::create(&temp_path).map_err(|e| CheckpointError::io(&temp_path, e))?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer(&mut writer, state)
            .map_err(|e| CheckpointError::io(&temp_path, e.into()))?;
        writer
            .flush()
            .map_err(|e| CheckpointError::io(&temp_path, e))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| CheckpointError::io(&temp_path, e))?;

        fs::rename(&temp_path, &self.path).map_err(|e| CheckpointError::io(&self.path, e))
    }

    /// Apply `change` under the write lock. Returns whether the file was rewritten.
    fn modify<F>(&self, change: F) -> Result<bool, CheckpointError>
    where
        F: FnOnce(&mut StateMap) -> bool,
    {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut state = self.read_state()?;
        if !change(&mut state) {
            return Ok(false);
        }
        self.write_state(&state)?;
        Ok(true)
    }
}

impl CheckpointStore for JsonFileCheckpointStore {
    fn get(&self, kind: EntityKind) -> Result<Watermark, CheckpointError> {
        let state = self.read_state()?;
        Ok(state.get(kind.as_str()).cloned().unwrap_or_default())
    }

    fn set(&self, kind: EntityKind, watermark: &Watermark) -> Result<(), CheckpointError> {
        let written = self.modify(|state| {
            if let Some(current) = state.get(kind.as_str()) {
                if watermark < current {
                    warn!(
                        kind = %kind,
                        current = %current,
                        watermark = %watermark,
                        "Ignoring checkpoint regression"
                    );
                    return false;
                }
                if watermark == current {
                    return false;
                }
            }
            state.insert(kind.as_str().to_string(), watermark.clone());
            true
        })?;

        if written {
            debug!(kind = %kind, watermark = %watermark, path = %self.path.display(), "Checkpoint saved");
        }
        Ok(())
    }

    fn reset(&self, kind: EntityKind) -> Result<(), CheckpointError> {
        self.modify(|state| state.remove(kind.as_str()).is_some())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watermark(day: u32) -> Watermark {
        Watermark::from_raw(format!("2024-01-{:02}T00:00:00.000000Z", day))
    }

    #[test]
    fn test_missing_file_reads_as_epoch() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileCheckpointStore::new(dir.path().join("state.json"));

        assert_eq!(store.get(EntityKind::Filmwork).unwrap(), Watermark::epoch());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_set_persists_full_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let store = JsonFileCheckpointStore::new(&path);

        store.set(EntityKind::Filmwork, &watermark(3)).unwrap();
        store.set(EntityKind::Genre, &watermark(5)).unwrap();

        let reopened = JsonFileCheckpointStore::new(&path);
        assert_eq!(reopened.get(EntityKind::Filmwork).unwrap(), watermark(3));
        assert_eq!(reopened.get(EntityKind::Genre).unwrap(), watermark(5));
        assert_eq!(reopened.get(EntityKind::Person).unwrap(), Watermark::epoch());

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["filmwork"], "2024-01-03T00:00:00.000000Z");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_watermark_is_monotonic() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileCheckpointStore::new(dir.path().join("state.json"));

        let mut previous = store.get(EntityKind::Person).unwrap();
        for day in [4, 2, 9, 9, 1, 12] {
            store.set(EntityKind::Person, &watermark(day)).unwrap();
            let current = store.get(EntityKind::Person).unwrap();
            assert!(current >= previous);
            previous = current;
        }
        assert_eq!(previous, watermark(12));
    }

    #[test]
    fn test_unchanged_watermark_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = JsonFileCheckpointStore::new(&path);
        store.set(EntityKind::Person, &watermark(9)).unwrap();

        let hand_written = "{\n  \"person\": \"2024-01-09T00:00:00.000000Z\"\n}\n";
        fs::write(&path, hand_written).unwrap();

        store.set(EntityKind::Person, &watermark(4)).unwrap();
        store.set(EntityKind::Person, &watermark(9)).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), hand_written);
        assert!(!path.with_extension("json.tmp").exists());

        store.set(EntityKind::Person, &watermark(10)).unwrap();
        assert_ne!(fs::read_to_string(&path).unwrap(), hand_written);
    }

    #[test]
    fn test_per_kind_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileCheckpointStore::for_kind(dir.path(), EntityKind::Genre);

        store.set(EntityKind::Genre, &watermark(1)).unwrap();

        assert!(dir.path().join("genre_state.json").exists());
    }

    #[test]
    fn test_reset_removes_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileCheckpointStore::new(dir.path().join("state.json"));

        store.set(EntityKind::Filmwork, &watermark(7)).unwrap();
        store.reset(EntityKind::Filmwork).unwrap();

        assert_eq!(store.get(EntityKind::Filmwork).unwrap(), Watermark::epoch());
    }

    #[test]
    fn test_corrupted_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{\"filmwork\": ").unwrap();
        let store = JsonFileCheckpointStore::new(&path);

        let err = store.get(EntityKind::Filmwork).unwrap_err();
        assert!(matches!(err, CheckpointError::Corrupted { .. }));
    }
}
