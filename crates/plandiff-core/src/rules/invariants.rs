use std::collections::{BTreeMap, HashMap};

use crate::errors::{PlanError, Result};
use crate::model::{Version, VersionStatus};

/// Find documents with more than one active version
///
/// Returns `(document_id, active_version_ids)` pairs, sorted by document id.
pub fn find_multiple_active(versions: &[Version]) -> Vec<(String, Vec<String>)> {
    let mut active: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for version in versions.iter().filter(|v| v.status == VersionStatus::Active) {
        active
            .entry(version.document_id.as_str())
            .or_default()
            .push(version.id.clone());
    }
    active
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(doc, ids)| (doc.to_string(), ids))
        .collect()
}

/// Find versions whose parent doesn't exist
///
/// Returns list of (child_id, parent_id) tuples
pub fn find_orphans(versions: &[Version]) -> Vec<(String, String)> {
    let by_id = index(versions);
    versions
        .iter()
        .filter_map(|v| {
            let parent_id = v.parent_id.as_ref()?;
            (!by_id.contains_key(parent_id.as_str())).then(|| (v.id.clone(), parent_id.clone()))
        })
        .collect()
}

/// Find versions whose parent belongs to another document
///
/// Returns list of (child_id, parent_id) tuples
pub fn find_cross_document_parents(versions: &[Version]) -> Vec<(String, String)> {
    let by_id = index(versions);
    versions
        .iter()
        .filter_map(|v| {
            let parent = by_id.get(v.parent_id.as_deref()?)?;
            (parent.document_id != v.document_id).then(|| (v.id.clone(), parent.id.clone()))
        })
        .collect()
}

/// Find parent/child links that are recorded on only one side
///
/// Returns list of (parent_id, child_id) tuples
pub fn find_link_inconsistencies(versions: &[Version]) -> Vec<(String, String)> {
    let by_id = index(versions);
    let mut broken = Vec::new();

    for version in versions {
        // child -> parent must be mirrored in parent.child_ids
        if let Some(parent) = version.parent_id.as_deref().and_then(|p| by_id.get(p)) {
            if !parent.child_ids.contains(&version.id) {
                broken.push((parent.id.clone(), version.id.clone()));
            }
        }
        // parent.child_ids entries must point back
        for child_id in &version.child_ids {
            let points_back = by_id
                .get(child_id.as_str())
                .is_some_and(|c| c.parent_id.as_deref() == Some(version.id.as_str()));
            if !points_back {
                broken.push((version.id.clone(), child_id.clone()));
            }
        }
    }

    broken
}

/// Find snapshots wrapped by more than one version
///
/// Returns `(snapshot_id, version_ids)` pairs, sorted by snapshot id.
pub fn find_shared_snapshots(versions: &[Version]) -> Vec<(String, Vec<String>)> {
    let mut bindings: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for version in versions {
        bindings
            .entry(version.snapshot_id.as_str())
            .or_default()
            .push(version.id.clone());
    }
    bindings
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(snapshot, ids)| (snapshot.to_string(), ids))
        .collect()
}

/// Validate the whole version graph
///
/// # Errors
///
/// Returns `InvariantViolation` describing the first broken invariant.
pub fn validate_graph(versions: &[Version]) -> Result<()> {
    if let Some((doc, ids)) = find_multiple_active(versions).first() {
        return Err(violation(format!(
            "document {} has {} active versions: {}",
            doc,
            ids.len(),
            ids.join(", ")
        )));
    }
    if let Some((child, parent)) = find_orphans(versions).first() {
        return Err(violation(format!(
            "version {} points to missing parent {}",
            child, parent
        )));
    }
    if let Some((child, parent)) = find_cross_document_parents(versions).first() {
        return Err(violation(format!(
            "version {} has parent {} from another document",
            child, parent
        )));
    }
    if let Some((parent, child)) = find_link_inconsistencies(versions).first() {
        return Err(violation(format!(
            "link {} -> {} is not mirrored",
            parent, child
        )));
    }
    if let Some((snapshot, ids)) = find_shared_snapshots(versions).first() {
        return Err(violation(format!(
            "snapshot {} is bound to versions {}",
            snapshot,
            ids.join(", ")
        )));
    }
    Ok(())
}

fn index(versions: &[Version]) -> HashMap<&str, &Version> {
    versions.iter().map(|v| (v.id.as_str(), v)).collect()
}

fn violation(message: String) -> PlanError {
    PlanError::InvariantViolation { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{VersionKind, VersionNumber};
    use chrono::Utc;

    fn version(id: &str, doc: &str, parent: Option<&str>, status: VersionStatus) -> Version {
        let now = Utc::now();
        Version {
            id: id.to_string(),
            document_id: doc.to_string(),
            number: VersionNumber::INITIAL,
            kind: VersionKind::Major,
            status,
            title: id.to_string(),
            description: None,
            parent_id: parent.map(str::to_string),
            child_ids: Vec::new(),
            snapshot_id: format!("snap-{}", id),
            created_by: "tester".to_string(),
            created_at: now,
            approved_by: None,
            approved_at: None,
            change_log: None,
            tags: Vec::new(),
            status_changed_at: now,
        }
    }

    #[test]
    fn test_consistent_graph_passes() {
        let mut root = version("v1", "doc", None, VersionStatus::Superseded);
        root.child_ids.push("v2".to_string());
        let child = version("v2", "doc", Some("v1"), VersionStatus::Active);
        assert!(validate_graph(&[root, child]).is_ok());
    }

    #[test]
    fn test_detects_multiple_active() {
        let a = version("v1", "doc", None, VersionStatus::Active);
        let b = version("v2", "doc", None, VersionStatus::Active);
        let other = version("v3", "other", None, VersionStatus::Active);
        let found = find_multiple_active(&[a, b, other]);
        assert_eq!(found, vec![("doc".to_string(), vec!["v1".to_string(), "v2".to_string()])]);
    }

    #[test]
    fn test_detects_orphan_and_unmirrored_link() {
        let orphan = version("v2", "doc", Some("ghost"), VersionStatus::Draft);
        assert_eq!(
            find_orphans(&[orphan]),
            vec![("v2".to_string(), "ghost".to_string())]
        );

        let root = version("v1", "doc", None, VersionStatus::Draft);
        let child = version("v2", "doc", Some("v1"), VersionStatus::Draft);
        assert_eq!(
            find_link_inconsistencies(&[root, child]),
            vec![("v1".to_string(), "v2".to_string())]
        );
    }

    #[test]
    fn test_detects_cross_document_parent() {
        let mut root = version("v1", "doc-a", None, VersionStatus::Draft);
        root.child_ids.push("v2".to_string());
        let child = version("v2", "doc-b", Some("v1"), VersionStatus::Draft);
        let err = validate_graph(&[root, child]).unwrap_err();
        assert!(matches!(err, PlanError::InvariantViolation { .. }));
    }

    #[test]
    fn test_detects_shared_snapshot() {
        let a = version("v1", "doc", None, VersionStatus::Draft);
        let mut b = version("v2", "doc", None, VersionStatus::Draft);
        b.snapshot_id = a.snapshot_id.clone();
        assert_eq!(find_shared_snapshots(&[a, b]).len(), 1);
    }
}
