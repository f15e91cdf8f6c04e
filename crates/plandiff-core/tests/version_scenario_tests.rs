mod common;

use common::{baseline_items, dec, item, TestBed};
use plandiff_core::diff::{
    compare, ChangeKind, ComparisonClassification, DiffOptions, PercentageChange,
};
use plandiff_core::errors::{ExError, ExErrorKind, PlanError};
use plandiff_core::model::{FieldValue, SnapshotInput, VersionKind, VersionStatus};
use rust_decimal::Decimal;

#[test]
fn test_v1_to_v2_adds_item_and_changes_quantity() {
    let bed = TestBed::new();
    let v1 = bed.version(
        "est-100",
        None,
        VersionKind::Major,
        SnapshotInput::with_items(baseline_items(), Decimal::ZERO),
    );
    bed.graph.activate(&v1.id).unwrap();

    let mut items = baseline_items();
    items[1].quantity = dec(3);
    items.push(item("scaffold", "Scaffolding", 1, 50_000));
    let v2 = bed.version(
        "est-100",
        Some(&v1.id),
        VersionKind::Minor,
        SnapshotInput::with_items(items, Decimal::ZERO),
    );
    assert_eq!(v2.number.to_string(), "1.1");

    let comparison = compare(
        &v1,
        &bed.snapshot_of(&v1),
        &v2,
        &bed.snapshot_of(&v2),
        &DiffOptions::default(),
        bed.clock_now(),
    )
    .unwrap();

    assert_eq!(comparison.classification, ComparisonClassification::Changed);
    assert_eq!(comparison.added().len(), 1);
    assert_eq!(comparison.deleted().len(), 0);

    let modified = comparison.modified();
    assert_eq!(modified.len(), 1);
    assert_eq!(modified[0].field.as_deref(), Some("quantity"));
    assert_eq!(modified[0].old_value, Some(FieldValue::Number(dec(2))));
    assert_eq!(modified[0].new_value, Some(FieldValue::Number(dec(3))));

    assert_eq!(comparison.price_changes.len(), 1);
    assert_eq!(comparison.price_changes[0].item_id, "beam");
    assert_eq!(comparison.price_changes[0].difference, dec(10_000));

    let total = &comparison.total_change;
    assert_eq!(total.old_total, dec(1_000_000));
    assert_eq!(total.new_total, dec(1_060_000));
    assert_eq!(total.difference, dec(60_000));
    assert_eq!(total.percentage, PercentageChange::Value(dec(6)));
}

#[test]
fn test_activation_supersedes_and_blocks_reactivation() {
    let bed = TestBed::new();
    let v1 = bed.version("est-1", None, VersionKind::Major, SnapshotInput::default());
    let v2 = bed.version("est-1", Some(&v1.id), VersionKind::Minor, SnapshotInput::default());

    bed.graph.activate(&v1.id).unwrap();
    let outcome = bed.graph.activate(&v2.id).unwrap();
    assert_eq!(outcome.superseded.map(|v| v.id), Some(v1.id.clone()));

    assert_eq!(bed.graph.get(&v1.id).unwrap().status, VersionStatus::Superseded);
    assert_eq!(bed.graph.get(&v2.id).unwrap().status, VersionStatus::Active);

    let err: ExError = bed.graph.activate(&v1.id).unwrap_err().into();
    assert_eq!(err.kind(), ExErrorKind::InvalidState);
    bed.graph.check_invariants().unwrap();
}

#[test]
fn test_archived_version_cannot_be_activated() {
    let bed = TestBed::new();
    let v1 = bed.version("est-1", None, VersionKind::Major, SnapshotInput::default());
    bed.graph.archive(&v1.id).unwrap();

    let err = bed.graph.activate(&v1.id).unwrap_err();
    assert_eq!(
        err,
        PlanError::IllegalTransition {
            version_id: v1.id.clone(),
            from: VersionStatus::Archived,
            to: VersionStatus::Active,
        }
    );
    assert_eq!(ExError::from(err).code(), "ERR_INVALID_STATE");
}

#[test]
fn test_version_numbering_sequence() {
    let bed = TestBed::new();
    let doc = "plan-7";
    let v10 = bed.version(doc, None, VersionKind::Major, SnapshotInput::default());
    let v11 = bed.version(doc, Some(&v10.id), VersionKind::Minor, SnapshotInput::default());
    let draft = bed.version(doc, Some(&v11.id), VersionKind::Draft, SnapshotInput::default());
    assert_eq!(v10.number.to_string(), "1.0");
    assert_eq!(v11.number.to_string(), "1.1");
    assert_eq!(draft.number.to_string(), "1.1-draft");

    let promoted = bed.graph.promote(&draft.id, VersionKind::Minor).unwrap();
    assert_eq!(promoted.number.to_string(), "1.2");

    let v13 = bed.version(doc, Some(&v10.id), VersionKind::Minor, SnapshotInput::default());
    assert_eq!(v13.number.to_string(), "1.3");

    let v20 = bed.version(doc, Some(&v11.id), VersionKind::Major, SnapshotInput::default());
    assert_eq!(v20.number.to_string(), "2.0");
}

#[test]
fn test_compare_rejects_versions_of_different_documents() {
    let bed = TestBed::new();
    let a = bed.version("est-a", None, VersionKind::Major, SnapshotInput::default());
    let b = bed.version("est-b", None, VersionKind::Major, SnapshotInput::default());

    let err = compare(
        &a,
        &bed.snapshot_of(&a),
        &b,
        &bed.snapshot_of(&b),
        &DiffOptions::default(),
        bed.clock_now(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Mismatch);
}

#[test]
fn test_compare_rejects_snapshot_not_bound_to_version() {
    let bed = TestBed::new();
    let v1 = bed.version("est-1", None, VersionKind::Major, SnapshotInput::default());
    let v2 = bed.version("est-1", Some(&v1.id), VersionKind::Minor, SnapshotInput::default());

    let err = compare(
        &v1,
        &bed.snapshot_of(&v2),
        &v2,
        &bed.snapshot_of(&v2),
        &DiffOptions::default(),
        bed.clock_now(),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Mismatch);
}

#[test]
fn test_compare_same_version_is_identical() {
    let bed = TestBed::new();
    let v1 = bed.version(
        "est-1",
        None,
        VersionKind::Major,
        SnapshotInput::with_items(baseline_items(), Decimal::new(10, 2)),
    );
    let snapshot = bed.snapshot_of(&v1);
    let comparison = compare(
        &v1,
        &snapshot,
        &v1,
        &snapshot,
        &DiffOptions::default(),
        bed.clock_now(),
    )
    .unwrap();

    assert_eq!(comparison.classification, ComparisonClassification::Identical);
    assert!(comparison.is_empty());
    assert!(comparison.total_change.difference.is_zero());
    assert_eq!(comparison.total_change.percentage, PercentageChange::ZERO);
}

#[test]
fn test_empty_snapshot_on_either_side() {
    let bed = TestBed::new();
    let empty = bed.version("est-1", None, VersionKind::Major, SnapshotInput::default());
    let full = bed.version(
        "est-1",
        Some(&empty.id),
        VersionKind::Minor,
        SnapshotInput::with_items(baseline_items(), Decimal::ZERO),
    );

    let forward = compare(
        &empty,
        &bed.snapshot_of(&empty),
        &full,
        &bed.snapshot_of(&full),
        &DiffOptions::default(),
        bed.clock_now(),
    )
    .unwrap();
    assert_eq!(forward.added().len(), 3);
    assert!(forward.changes.iter().all(|c| c.kind == ChangeKind::Added));
    assert_eq!(forward.total_change.percentage, PercentageChange::UndefinedIncrease);

    let backward = compare(
        &full,
        &bed.snapshot_of(&full),
        &empty,
        &bed.snapshot_of(&empty),
        &DiffOptions::default(),
        bed.clock_now(),
    )
    .unwrap();
    assert_eq!(backward.deleted().len(), 3);
    assert_eq!(backward.total_change.percentage, PercentageChange::Value(dec(-100)));
}

#[test]
fn test_delete_draft_releases_snapshot() {
    let bed = TestBed::new();
    let v1 = bed.version("est-1", None, VersionKind::Major, SnapshotInput::default());
    let draft = bed.version("est-1", Some(&v1.id), VersionKind::Draft, SnapshotInput::default());

    let snapshot_id = bed.graph.delete_version(&draft.id).unwrap();
    bed.store.remove(&snapshot_id).unwrap();

    assert!(!bed.store.contains(&snapshot_id).unwrap());
    assert!(bed.graph.children(&v1.id).unwrap().is_empty());
    let err: ExError = bed.graph.get(&draft.id).unwrap_err().into();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
}
