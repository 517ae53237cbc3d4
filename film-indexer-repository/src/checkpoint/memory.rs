//! In-memory checkpoint store.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::warn;

use crate::errors::CheckpointError;
use crate::interfaces::CheckpointStore;
use film_indexer_shared::{EntityKind, Watermark};

/// Checkpoint store that keeps watermarks in process memory.
///
/// Useful for tests and for dry runs that should always start from scratch.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    state: Mutex<HashMap<EntityKind, Watermark>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<EntityKind, Watermark>> {
        // A poisoned map is still consistent: every write is a single insert.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn get(&self, kind: EntityKind) -> Result<Watermark, CheckpointError> {
        Ok(self.lock().get(&kind).cloned().unwrap_or_default())
    }

    fn set(&self, kind: EntityKind, watermark: &Watermark) -> Result<(), CheckpointError> {
        let mut state = self.lock();
        if let Some(current) = state.get(&kind) {
            if watermark < current {
                warn!(kind = %kind, current = %current, watermark = %watermark, "Ignoring checkpoint regression");
                return Ok(());
            }
        }
        state.insert(kind, watermark.clone());
        Ok(())
    }

    fn reset(&self, kind: EntityKind) -> Result<(), CheckpointError> {
        self.lock().remove(&kind);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_kind_is_epoch() {
        let store = MemoryCheckpointStore::new();
        assert_eq!(store.get(EntityKind::Genre).unwrap(), Watermark::epoch());
    }

    #[test]
    fn test_set_never_moves_backwards() {
        let store = MemoryCheckpointStore::new();
        let newer = Watermark::from_raw("2024-05-01T00:00:00.000000Z");
        let older = Watermark::from_raw("2023-05-01T00:00:00.000000Z");

        store.set(EntityKind::Person, &newer).unwrap();
        store.set(EntityKind::Person, &older).unwrap();

        assert_eq!(store.get(EntityKind::Person).unwrap(), newer);
    }
}
