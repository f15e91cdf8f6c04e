//! Document loading seam and the in-memory workspace behind it.
//!
//! Queries read versions and snapshots through [`DocumentLoader`] so a
//! persistent backend can stand in for the in-memory [`Workspace`]. Loader
//! implementations may fail for reasons unrelated to the request (I/O, a
//! poisoned lock); the engine surfaces those failures as `Persistence`
//! errors that keep the loader's error as their source.

#![allow(clippy::result_large_err)]

use std::sync::Arc;

use plandiff_core::errors::{ExError, ExErrorKind};
use plandiff_core::{Clock, IdGenerator, Snapshot, SnapshotStore, Version, VersionGraph};

/// Read access to stored versions and snapshots
pub trait DocumentLoader: Send + Sync {
    /// # Errors
    ///
    /// `NotFound` for unknown ids; any other kind for backend failures.
    fn load_version(&self, version_id: &str) -> Result<Version, ExError>;

    /// # Errors
    ///
    /// `NotFound` for unknown ids; any other kind for backend failures.
    fn load_snapshot(&self, snapshot_id: &str) -> Result<Arc<Snapshot>, ExError>;

    /// All versions of a document, in creation order (empty if none)
    ///
    /// # Errors
    ///
    /// Backend failures only.
    fn load_document_versions(&self, document_id: &str) -> Result<Vec<Version>, ExError>;
}

/// Surface a loader failure
///
/// `NotFound` passes through unchanged. Everything else becomes a
/// `Persistence` error for `op` carrying the original as its source.
pub(crate) fn surface_load_error(op: &str, err: ExError) -> ExError {
    if err.kind() == ExErrorKind::NotFound {
        return err;
    }
    let message = format!("document loader failed: {}", err.message());
    ExError::new(ExErrorKind::Persistence)
        .with_op(op)
        .with_message(message)
        .with_source(err)
}

/// Snapshot store and version graph sharing one clock and id source
#[derive(Debug, Default)]
pub struct Workspace {
    store: SnapshotStore,
    graph: VersionGraph,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Workspace with injected collaborators, for deterministic tests
    pub fn with_collaborators(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            store: SnapshotStore::with_collaborators(Arc::clone(&clock), Arc::clone(&ids)),
            graph: VersionGraph::with_collaborators(clock, ids),
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn graph(&self) -> &VersionGraph {
        &self.graph
    }
}

impl DocumentLoader for Workspace {
    fn load_version(&self, version_id: &str) -> Result<Version, ExError> {
        self.graph.get(version_id).map_err(ExError::from)
    }

    fn load_snapshot(&self, snapshot_id: &str) -> Result<Arc<Snapshot>, ExError> {
        self.store.get(snapshot_id).map_err(ExError::from)
    }

    fn load_document_versions(&self, document_id: &str) -> Result<Vec<Version>, ExError> {
        self.graph.versions_of(document_id).map_err(ExError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plandiff_core::model::SnapshotInput;

    #[test]
    fn test_not_found_passes_through() {
        let err = ExError::new(ExErrorKind::NotFound).with_message("version v9 not found");
        let surfaced = surface_load_error("compare", err);
        assert_eq!(surfaced.kind(), ExErrorKind::NotFound);
        assert!(surfaced.source_error().is_none());
    }

    #[test]
    fn test_backend_failure_becomes_persistence() {
        let err = ExError::new(ExErrorKind::Internal).with_message("disk unavailable");
        let surfaced = surface_load_error("compare", err);
        assert_eq!(surfaced.kind(), ExErrorKind::Persistence);
        assert_eq!(surfaced.op(), Some("compare"));
        assert!(surfaced.message().contains("disk unavailable"));
        assert_eq!(
            surfaced.source_error().map(|e| e.kind()),
            Some(ExErrorKind::Internal)
        );
    }

    #[test]
    fn test_workspace_loads_what_it_stores() {
        let workspace = Workspace::new();
        let snapshot = workspace
            .store()
            .create("est-1", SnapshotInput::default())
            .unwrap();

        let loaded = workspace.load_snapshot(snapshot.id()).unwrap();
        assert_eq!(loaded.digest(), snapshot.digest());

        let err = workspace.load_version("missing").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotFound);
        assert!(workspace.load_document_versions("est-1").unwrap().is_empty());
    }
}
