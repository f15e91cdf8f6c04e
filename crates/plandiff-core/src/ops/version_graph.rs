use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::collaborators::{Clock, IdGenerator, SystemClock, UuidV7Ids};
use crate::errors::{PlanError, Result};
use crate::model::{
    ActivationRequest, ExpectedActive, NewVersion, Snapshot, Version, VersionKind, VersionStatus,
};
use crate::ops::numbering::next_version_number;
use crate::rules::{invariants, validation};

const RESOURCE: &str = "version_graph";

/// Result of a successful activation
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationOutcome {
    pub activated: Version,
    /// Previously active version, now superseded
    pub superseded: Option<Version>,
}

#[derive(Debug, Default)]
struct GraphState {
    versions: HashMap<String, Version>,
    /// Version ids per document, in creation order
    by_document: HashMap<String, Vec<String>>,
    /// snapshot id -> version id
    bindings: HashMap<String, String>,
    /// document id -> active version id
    active: HashMap<String, String>,
}

impl GraphState {
    fn get(&self, version_id: &str) -> Result<&Version> {
        self.versions
            .get(version_id)
            .ok_or_else(|| PlanError::VersionNotFound {
                version_id: version_id.to_string(),
            })
    }

    fn get_mut(&mut self, version_id: &str) -> Result<&mut Version> {
        self.versions
            .get_mut(version_id)
            .ok_or_else(|| PlanError::VersionNotFound {
                version_id: version_id.to_string(),
            })
    }

    fn document_versions(&self, document_id: &str) -> Vec<&Version> {
        self.by_document
            .get(document_id)
            .map(|ids| ids.iter().filter_map(|id| self.versions.get(id)).collect())
            .unwrap_or_default()
    }
}

/// Parent/child graph of versions with lifecycle enforcement
///
/// All state sits behind one `RwLock`. Mutations (create, activate, archive,
/// promote, delete) take the write lock for their whole duration, so two
/// activations on the same document can never interleave and the document
/// always ends with exactly one active version.
pub struct VersionGraph {
    state: RwLock<GraphState>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl VersionGraph {
    /// Create a graph using the system clock and UUIDv7 ids
    pub fn new() -> Self {
        Self::with_collaborators(Arc::new(SystemClock), Arc::new(UuidV7Ids))
    }

    pub fn with_collaborators(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            state: RwLock::new(GraphState::default()),
            clock,
            ids,
        }
    }

    /// Register a new draft version wrapping `snapshot`
    ///
    /// # Errors
    ///
    /// - `InvalidTitle` / `EmptyDocumentId` for malformed requests
    /// - `VersionNotFound` if the parent is unknown
    /// - `ParentDocumentMismatch` / `SnapshotDocumentMismatch` across documents
    /// - `SnapshotAlreadyBound` if another version wraps the snapshot
    pub fn create_version(&self, request: NewVersion, snapshot: &Snapshot) -> Result<Version> {
        validation::validate_title(&request.title)?;
        if request.document_id.trim().is_empty() {
            return Err(PlanError::EmptyDocumentId);
        }
        if snapshot.document_id() != request.document_id {
            return Err(PlanError::SnapshotDocumentMismatch {
                snapshot_id: snapshot.id().to_string(),
                snapshot_document_id: snapshot.document_id().to_string(),
                document_id: request.document_id,
            });
        }

        let now = self.clock.now();
        let mut state = self.write()?;

        let parent = match request.parent_id.as_deref() {
            Some(parent_id) => {
                let parent = state.get(parent_id)?;
                if parent.document_id != request.document_id {
                    return Err(PlanError::ParentDocumentMismatch {
                        parent_id: parent.id.clone(),
                        parent_document_id: parent.document_id.clone(),
                        document_id: request.document_id,
                    });
                }
                Some(parent.clone())
            }
            None => None,
        };

        if let Some(bound_to) = state.bindings.get(snapshot.id()) {
            return Err(PlanError::SnapshotAlreadyBound {
                snapshot_id: snapshot.id().to_string(),
                version_id: bound_to.clone(),
            });
        }

        let number = next_version_number(
            &state.document_versions(&request.document_id),
            parent.as_ref(),
            request.kind,
        );

        let version = Version {
            id: self.ids.next_id(),
            document_id: request.document_id,
            number,
            kind: request.kind,
            status: VersionStatus::Draft,
            title: request.title,
            description: request.description,
            parent_id: request.parent_id,
            child_ids: Vec::new(),
            snapshot_id: snapshot.id().to_string(),
            created_by: request.created_by,
            created_at: now,
            approved_by: None,
            approved_at: None,
            change_log: request.change_log,
            tags: request.tags,
            status_changed_at: now,
        };

        if let Some(parent) = &parent {
            state.get_mut(&parent.id)?.add_child_id(version.id.clone());
        }
        state
            .by_document
            .entry(version.document_id.clone())
            .or_default()
            .push(version.id.clone());
        state
            .bindings
            .insert(version.snapshot_id.clone(), version.id.clone());
        state.versions.insert(version.id.clone(), version.clone());

        tracing::debug!(
            version_id = %version.id,
            document_id = %version.document_id,
            number = %version.number,
            kind = %version.kind,
            "version created"
        );
        Ok(version)
    }

    /// Activate a draft, superseding the document's current active version
    ///
    /// # Errors
    ///
    /// See [`VersionGraph::activate_with`].
    pub fn activate(&self, version_id: &str) -> Result<ActivationOutcome> {
        self.activate_with(version_id, ActivationRequest::default())
    }

    /// Activate a draft with an approver and an optional expectation about
    /// the currently active version
    ///
    /// Runs entirely under the write lock. On any error nothing changes.
    ///
    /// # Errors
    ///
    /// - `VersionNotFound` for unknown ids
    /// - `IllegalTransition` unless the version is a draft
    /// - `ActiveVersionMismatch` if `expected_active` does not hold
    pub fn activate_with(
        &self,
        version_id: &str,
        request: ActivationRequest,
    ) -> Result<ActivationOutcome> {
        let now = self.clock.now();
        let mut state = self.write()?;

        let target = state.get(version_id)?;
        if !target.status.can_transition_to(VersionStatus::Active) {
            return Err(PlanError::IllegalTransition {
                version_id: version_id.to_string(),
                from: target.status,
                to: VersionStatus::Active,
            });
        }
        let document_id = target.document_id.clone();
        let actual = state.active.get(&document_id).cloned();

        let expectation_holds = match &request.expected_active {
            ExpectedActive::Unchecked => true,
            ExpectedActive::NoActive => actual.is_none(),
            ExpectedActive::Version(expected) => actual.as_deref() == Some(expected.as_str()),
        };
        if !expectation_holds {
            let expected = match request.expected_active {
                ExpectedActive::Version(id) => Some(id),
                _ => None,
            };
            return Err(PlanError::ActiveVersionMismatch {
                document_id,
                expected,
                actual,
            });
        }

        let superseded = match actual {
            Some(previous_id) => {
                let previous = state.get_mut(&previous_id)?;
                previous.status = VersionStatus::Superseded;
                previous.status_changed_at = now;
                Some(previous.clone())
            }
            None => None,
        };

        let activated = state.get_mut(version_id)?;
        activated.status = VersionStatus::Active;
        activated.status_changed_at = now;
        if let Some(approver) = request.approved_by {
            activated.approved_by = Some(approver);
            activated.approved_at = Some(now);
        }
        let activated = activated.clone();
        state
            .active
            .insert(document_id.clone(), activated.id.clone());

        tracing::debug!(
            version_id = %activated.id,
            document_id = %document_id,
            superseded = ?superseded.as_ref().map(|v| v.id.as_str()),
            "version activated"
        );
        Ok(ActivationOutcome {
            activated,
            superseded,
        })
    }

    /// Archive a draft or active version (terminal)
    ///
    /// # Errors
    ///
    /// `VersionNotFound`, or `IllegalTransition` from superseded/archived.
    pub fn archive(&self, version_id: &str) -> Result<Version> {
        let now = self.clock.now();
        let mut state = self.write()?;

        let version = state.get_mut(version_id)?;
        if !version.status.can_transition_to(VersionStatus::Archived) {
            return Err(PlanError::IllegalTransition {
                version_id: version_id.to_string(),
                from: version.status,
                to: VersionStatus::Archived,
            });
        }
        let was_active = version.is_active();
        version.status = VersionStatus::Archived;
        version.status_changed_at = now;
        let archived = version.clone();

        if was_active {
            state.active.remove(&archived.document_id);
        }

        tracing::debug!(version_id = %archived.id, was_active, "version archived");
        Ok(archived)
    }

    /// Turn a draft-kind version into a major or minor one with a real number
    ///
    /// # Errors
    ///
    /// - `InvalidPromotionTarget` when `kind` is draft
    /// - `NotPromotable` unless the version is a draft-kind version in draft status
    pub fn promote(&self, version_id: &str, kind: VersionKind) -> Result<Version> {
        if kind == VersionKind::Draft {
            return Err(PlanError::InvalidPromotionTarget {
                version_id: version_id.to_string(),
            });
        }

        let mut state = self.write()?;
        let version = state.get(version_id)?;
        if version.kind != VersionKind::Draft || version.status != VersionStatus::Draft {
            return Err(PlanError::NotPromotable {
                version_id: version_id.to_string(),
                kind: version.kind,
                status: version.status,
            });
        }

        let parent = match version.parent_id.as_deref() {
            Some(parent_id) => Some(state.get(parent_id)?),
            None => None,
        };
        let others: Vec<&Version> = state
            .document_versions(&version.document_id)
            .into_iter()
            .filter(|v| v.id != version_id)
            .collect();
        let number = next_version_number(&others, parent, kind);

        let version = state.get_mut(version_id)?;
        let from = version.number;
        version.kind = kind;
        version.number = number;

        tracing::debug!(version_id, %from, to = %number, "draft promoted");
        Ok(version.clone())
    }

    /// Remove a childless draft and return the id of its snapshot
    ///
    /// # Errors
    ///
    /// - `VersionNotFound` for unknown ids
    /// - `NotDeletable` unless the status is draft
    /// - `DeleteWithChildren` if other versions derive from it
    pub fn delete_version(&self, version_id: &str) -> Result<String> {
        let mut state = self.write()?;

        let version = state.get(version_id)?;
        if version.status != VersionStatus::Draft {
            return Err(PlanError::NotDeletable {
                version_id: version_id.to_string(),
                status: version.status,
            });
        }
        if !version.child_ids.is_empty() {
            return Err(PlanError::DeleteWithChildren {
                version_id: version_id.to_string(),
                child_count: version.child_ids.len(),
            });
        }

        let version = state
            .versions
            .remove(version_id)
            .ok_or_else(|| PlanError::VersionNotFound {
                version_id: version_id.to_string(),
            })?;
        if let Some(parent_id) = version.parent_id.as_deref() {
            state.get_mut(parent_id)?.remove_child_id(version_id);
        }
        if let Some(ids) = state.by_document.get_mut(&version.document_id) {
            ids.retain(|id| id != version_id);
        }
        state.bindings.remove(&version.snapshot_id);

        tracing::debug!(version_id, snapshot_id = %version.snapshot_id, "version deleted");
        Ok(version.snapshot_id)
    }

    /// # Errors
    ///
    /// Returns `VersionNotFound` if the id is unknown.
    pub fn get(&self, version_id: &str) -> Result<Version> {
        self.read()?.get(version_id).cloned()
    }

    /// Versions of a document in creation order (empty for unknown documents)
    ///
    /// # Errors
    ///
    /// Returns `LockPoisoned` if a writer panicked.
    pub fn versions_of(&self, document_id: &str) -> Result<Vec<Version>> {
        Ok(self
            .read()?
            .document_versions(document_id)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Versions of a document, newest first
    ///
    /// # Errors
    ///
    /// Returns `LockPoisoned` if a writer panicked.
    pub fn history(&self, document_id: &str) -> Result<Vec<Version>> {
        let mut versions = self.versions_of(document_id)?;
        versions.reverse();
        Ok(versions)
    }

    /// # Errors
    ///
    /// Returns `LockPoisoned` if a writer panicked.
    pub fn active_version(&self, document_id: &str) -> Result<Option<Version>> {
        let state = self.read()?;
        match state.active.get(document_id) {
            Some(id) => Ok(Some(state.get(id)?.clone())),
            None => Ok(None),
        }
    }

    /// Root-first chain of ancestors ending with the version itself
    ///
    /// # Errors
    ///
    /// `VersionNotFound` for unknown ids, `InvariantViolation` on a broken chain.
    pub fn lineage(&self, version_id: &str) -> Result<Vec<Version>> {
        let state = self.read()?;
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(version_id.to_string());

        while let Some(id) = current {
            if !visited.insert(id.clone()) {
                return Err(PlanError::InvariantViolation {
                    message: format!("cycle in parent chain at {}", id),
                });
            }
            let version = state.get(&id)?;
            current = version.parent_id.clone();
            chain.push(version.clone());
        }

        chain.reverse();
        Ok(chain)
    }

    /// Direct children in creation order
    ///
    /// # Errors
    ///
    /// Returns `VersionNotFound` if the id is unknown.
    pub fn children(&self, version_id: &str) -> Result<Vec<Version>> {
        let state = self.read()?;
        state
            .get(version_id)?
            .child_ids
            .iter()
            .map(|id| state.get(id).cloned())
            .collect()
    }

    /// Every version, grouped by document (documents sorted by id)
    ///
    /// # Errors
    ///
    /// Returns `LockPoisoned` if a writer panicked.
    pub fn all_versions(&self) -> Result<Vec<Version>> {
        let state = self.read()?;
        let mut documents: Vec<&String> = state.by_document.keys().collect();
        documents.sort();
        Ok(documents
            .into_iter()
            .flat_map(|doc| state.document_versions(doc))
            .cloned()
            .collect())
    }

    /// Re-check every graph invariant
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` for the first broken invariant.
    pub fn check_invariants(&self) -> Result<()> {
        let versions = self.all_versions()?;
        invariants::validate_graph(&versions)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, GraphState>> {
        self.state.read().map_err(|_| PlanError::LockPoisoned {
            resource: RESOURCE.to_string(),
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, GraphState>> {
        self.state.write().map_err(|_| PlanError::LockPoisoned {
            resource: RESOURCE.to_string(),
        })
    }
}

impl Default for VersionGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VersionGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionGraph").finish_non_exhaustive()
    }
}
