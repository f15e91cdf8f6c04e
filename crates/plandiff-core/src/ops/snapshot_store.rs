use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::collaborators::{Clock, IdGenerator, SystemClock, UuidV7Ids};
use crate::errors::{PlanError, Result};
use crate::model::{Snapshot, SnapshotInput};

const RESOURCE: &str = "snapshot_store";

/// Thread-safe in-memory store of immutable snapshots
///
/// Snapshots are handed out as `Arc<Snapshot>`; they are never updated in
/// place, only removed together with the version that wraps them.
pub struct SnapshotStore {
    snapshots: RwLock<HashMap<String, Arc<Snapshot>>>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl SnapshotStore {
    /// Create a store using the system clock and UUIDv7 ids
    pub fn new() -> Self {
        Self::with_collaborators(Arc::new(SystemClock), Arc::new(UuidV7Ids))
    }

    pub fn with_collaborators(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
            clock,
            ids,
        }
    }

    /// Validate and capture working data as a new snapshot
    ///
    /// # Errors
    ///
    /// Validation errors from [`Snapshot::capture`], or `LockPoisoned`.
    pub fn create(&self, document_id: &str, input: SnapshotInput) -> Result<Arc<Snapshot>> {
        let snapshot = Snapshot::capture(
            self.ids.next_id(),
            document_id.to_string(),
            input,
            self.clock.now(),
        )?;
        let snapshot = Arc::new(snapshot);

        self.write()?
            .insert(snapshot.id().to_string(), Arc::clone(&snapshot));

        tracing::debug!(
            snapshot_id = snapshot.id(),
            document_id = snapshot.document_id(),
            item_count = snapshot.items().len(),
            digest = snapshot.digest(),
            "snapshot captured"
        );
        Ok(snapshot)
    }

    /// Get a snapshot by id
    ///
    /// # Errors
    ///
    /// Returns `SnapshotNotFound` if the id is unknown.
    pub fn get(&self, snapshot_id: &str) -> Result<Arc<Snapshot>> {
        self.read()?
            .get(snapshot_id)
            .cloned()
            .ok_or_else(|| PlanError::SnapshotNotFound {
                snapshot_id: snapshot_id.to_string(),
            })
    }

    /// Drop a snapshot whose version has been deleted
    ///
    /// # Errors
    ///
    /// Returns `SnapshotNotFound` if the id is unknown.
    pub fn remove(&self, snapshot_id: &str) -> Result<Arc<Snapshot>> {
        let removed = self
            .write()?
            .remove(snapshot_id)
            .ok_or_else(|| PlanError::SnapshotNotFound {
                snapshot_id: snapshot_id.to_string(),
            })?;
        tracing::debug!(snapshot_id, "snapshot removed");
        Ok(removed)
    }

    /// # Errors
    ///
    /// Returns `LockPoisoned` if a writer panicked.
    pub fn contains(&self, snapshot_id: &str) -> Result<bool> {
        Ok(self.read()?.contains_key(snapshot_id))
    }

    /// # Errors
    ///
    /// Returns `LockPoisoned` if a writer panicked.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    /// # Errors
    ///
    /// Returns `LockPoisoned` if a writer panicked.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Arc<Snapshot>>>> {
        self.snapshots.read().map_err(|_| PlanError::LockPoisoned {
            resource: RESOURCE.to_string(),
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Arc<Snapshot>>>> {
        self.snapshots.write().map_err(|_| PlanError::LockPoisoned {
            resource: RESOURCE.to_string(),
        })
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("len", &self.len().unwrap_or_default())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{FixedClock, SequentialIds};
    use crate::model::LineItem;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn store() -> SnapshotStore {
        SnapshotStore::with_collaborators(
            Arc::new(FixedClock::new(Utc::now())),
            Arc::new(SequentialIds::new("snap")),
        )
    }

    fn input() -> SnapshotInput {
        SnapshotInput::with_items(
            vec![LineItem::new("i1", "Roofing", "exterior", Decimal::ONE, Decimal::ONE_HUNDRED)],
            Decimal::ZERO,
        )
    }

    #[test]
    fn test_create_and_get() {
        let store = store();
        let created = store.create("doc", input()).unwrap();
        assert_eq!(created.id(), "snap-1");

        let fetched = store.get("snap-1").unwrap();
        assert_eq!(fetched.digest(), created.digest());
        assert_eq!(store.len().unwrap(), 1);
        assert!(store.contains("snap-1").unwrap());
    }

    #[test]
    fn test_get_unknown() {
        assert_eq!(
            store().get("nope").unwrap_err(),
            PlanError::SnapshotNotFound {
                snapshot_id: "nope".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_input_is_not_stored() {
        let store = store();
        assert!(store.create("", input()).is_err());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_remove() {
        let store = store();
        let snapshot = store.create("doc", input()).unwrap();
        store.remove(snapshot.id()).unwrap();
        assert!(!store.contains(snapshot.id()).unwrap());
        assert!(store.remove(snapshot.id()).is_err());
    }
}
