//! Comparison engine.
//!
//! [`compare`] checks that both sides belong together and delegates to
//! [`diff_snapshots`], which is a pure function of the two snapshots.

#![allow(clippy::result_large_err)]

use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};

use crate::diff::model::{
    Change, ChangeKind, ChangeSet, ChangeTarget, Comparison, ComparisonClassification,
    DiffOptions, PriceChange,
};
use crate::diff::percent::{percentage_change, total_change};
use crate::errors::{ExError, ExErrorKind};
use crate::model::{FieldValue, LineItem, Snapshot, Version};

/// Compute a set-delta between two ordered lists.
///
/// Returns `(added, removed)` where added = in b but not a, removed = in a but not b.
fn set_delta(a: &[String], b: &[String]) -> (Vec<String>, Vec<String>) {
    let set_a: BTreeSet<&str> = a.iter().map(|s| s.as_str()).collect();
    let set_b: BTreeSet<&str> = b.iter().map(|s| s.as_str()).collect();
    let added: Vec<String> = b
        .iter()
        .filter(|s| !set_a.contains(s.as_str()))
        .cloned()
        .collect();
    let removed: Vec<String> = a
        .iter()
        .filter(|s| !set_b.contains(s.as_str()))
        .cloned()
        .collect();
    (added, removed)
}

fn render(value: &Option<FieldValue>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "(none)".to_string(),
    }
}

fn text(value: &Option<String>) -> Option<FieldValue> {
    value.clone().map(FieldValue::Text)
}

/// Tracked line item fields in reporting order
fn tracked_fields(item: &LineItem) -> [(&'static str, Option<FieldValue>); 7] {
    [
        ("name", Some(FieldValue::Text(item.name.clone()))),
        ("category", Some(FieldValue::Text(item.category.clone()))),
        ("description", text(&item.description)),
        ("quantity", Some(FieldValue::Number(item.quantity))),
        ("unit", text(&item.unit)),
        ("unit_price", Some(FieldValue::Number(item.unit_price))),
        ("cost_price", item.cost_price.map(FieldValue::Number)),
    ]
}

fn item_change(kind: ChangeKind, item: &LineItem, detected_at: DateTime<Utc>) -> Change {
    let total = Some(FieldValue::Number(item.line_total()));
    let (old_value, new_value, verb) = match kind {
        ChangeKind::Added => (None, total, "Added"),
        _ => (total, None, "Deleted"),
    };
    Change {
        kind,
        target: ChangeTarget::LineItem,
        item_id: Some(item.id.clone()),
        item_name: Some(item.name.clone()),
        field: None,
        old_value,
        new_value,
        description: format!(
            "{} '{}' ({} x {} = {})",
            verb,
            item.name,
            item.quantity.normalize(),
            item.unit_price.normalize(),
            item.line_total().normalize()
        ),
        detected_at,
    }
}

/// One modification per differing tracked field, in tracked order
fn field_changes(old: &LineItem, new: &LineItem, detected_at: DateTime<Utc>) -> Vec<Change> {
    let mut fields: Vec<(String, Option<FieldValue>, Option<FieldValue>)> = tracked_fields(old)
        .into_iter()
        .zip(tracked_fields(new))
        .map(|((name, a), (_, b))| (name.to_string(), a, b))
        .collect();

    let keys: BTreeSet<&String> = old.attributes.keys().chain(new.attributes.keys()).collect();
    for key in keys {
        fields.push((
            format!("attr.{}", key),
            old.attributes.get(key).cloned(),
            new.attributes.get(key).cloned(),
        ));
    }

    fields
        .into_iter()
        .filter(|(_, a, b)| a != b)
        .map(|(field, old_value, new_value)| Change {
            kind: ChangeKind::Modified,
            target: ChangeTarget::LineItem,
            item_id: Some(new.id.clone()),
            item_name: Some(new.name.clone()),
            description: format!(
                "'{}': {} changed from {} to {}",
                new.name,
                field,
                render(&old_value),
                render(&new_value)
            ),
            field: Some(field),
            old_value,
            new_value,
            detected_at,
        })
        .collect()
}

fn price_change(old: &LineItem, new: &LineItem) -> Option<PriceChange> {
    let (old_total, new_total) = (old.line_total(), new.line_total());
    if old.unit_price == new.unit_price && old_total == new_total {
        return None;
    }
    Some(PriceChange {
        item_id: new.id.clone(),
        item_name: new.name.clone(),
        old_unit_price: old.unit_price,
        new_unit_price: new.unit_price,
        old_line_total: old_total,
        new_line_total: new_total,
        difference: new_total.saturating_sub(old_total),
        percentage: percentage_change(old_total, new_total),
    })
}

/// Categories in order of first appearance
fn sections(snapshot: &Snapshot) -> Vec<String> {
    let mut seen = BTreeSet::new();
    snapshot
        .items()
        .iter()
        .filter(|i| seen.insert(i.category.as_str()))
        .map(|i| i.category.clone())
        .collect()
}

fn section_changes(old: &Snapshot, new: &Snapshot, detected_at: DateTime<Utc>) -> Vec<Change> {
    let (added, removed) = set_delta(&sections(old), &sections(new));
    let removed = removed.into_iter().map(|s| (ChangeKind::Deleted, s));
    let added = added.into_iter().map(|s| (ChangeKind::Added, s));

    removed
        .chain(added)
        .map(|(kind, section)| {
            let value = Some(FieldValue::Text(section.clone()));
            let (old_value, new_value) = match kind {
                ChangeKind::Added => (None, value),
                _ => (value, None),
            };
            Change {
                kind,
                target: ChangeTarget::Section,
                item_id: None,
                item_name: None,
                field: None,
                old_value,
                new_value,
                description: format!("Section '{}' {}", section, kind),
                detected_at,
            }
        })
        .collect()
}

fn document_field_changes(
    old: &Snapshot,
    new: &Snapshot,
    detected_at: DateTime<Utc>,
) -> Vec<Change> {
    let (a, b) = (old.customer(), new.customer());
    let (ta, tb) = (old.terms(), new.terms());

    let fields = [
        (ChangeTarget::CustomerField, "customer.name", text(&a.name), text(&b.name)),
        (ChangeTarget::CustomerField, "customer.company", text(&a.company), text(&b.company)),
        (ChangeTarget::CustomerField, "customer.address", text(&a.address), text(&b.address)),
        (ChangeTarget::CustomerField, "customer.phone", text(&a.phone), text(&b.phone)),
        (ChangeTarget::CustomerField, "customer.email", text(&a.email), text(&b.email)),
        (
            ChangeTarget::Term,
            "terms.payment_terms",
            text(&ta.payment_terms),
            text(&tb.payment_terms),
        ),
        (
            ChangeTarget::Term,
            "terms.delivery_period",
            text(&ta.delivery_period),
            text(&tb.delivery_period),
        ),
        (ChangeTarget::Term, "terms.remarks", text(&ta.remarks), text(&tb.remarks)),
        (
            ChangeTarget::Term,
            "tax_rate",
            Some(FieldValue::Number(old.tax_rate())),
            Some(FieldValue::Number(new.tax_rate())),
        ),
        (
            ChangeTarget::Term,
            "valid_until",
            old.valid_until().map(FieldValue::Date),
            new.valid_until().map(FieldValue::Date),
        ),
    ];

    fields
        .into_iter()
        .filter(|(_, _, a, b)| a != b)
        .map(|(target, field, old_value, new_value)| Change {
            kind: ChangeKind::Modified,
            target,
            item_id: None,
            item_name: None,
            field: Some(field.to_string()),
            description: format!(
                "{} changed from {} to {}",
                field,
                render(&old_value),
                render(&new_value)
            ),
            old_value,
            new_value,
            detected_at,
        })
        .collect()
}

/// Diff two snapshots; `old` is A, `new` is B
///
/// Change order: deletions (order of A), additions (order of B),
/// modifications (order of B), then section and document-field changes
/// when enabled in `options`.
pub fn diff_snapshots(
    old: &Snapshot,
    new: &Snapshot,
    options: &DiffOptions,
    detected_at: DateTime<Utc>,
) -> ChangeSet {
    let total_change = total_change(old.totals().total, new.totals().total);

    // Fast-path: same content digest
    if old.digest() == new.digest() {
        return ChangeSet {
            classification: ComparisonClassification::Identical,
            changes: Vec::new(),
            price_changes: Vec::new(),
            total_change,
        };
    }

    let old_index: HashMap<&str, &LineItem> =
        old.items().iter().map(|i| (i.id.as_str(), i)).collect();
    let new_index: HashMap<&str, &LineItem> =
        new.items().iter().map(|i| (i.id.as_str(), i)).collect();

    let mut changes = Vec::new();
    let mut price_changes = Vec::new();

    for item in old.items() {
        if !new_index.contains_key(item.id.as_str()) {
            changes.push(item_change(ChangeKind::Deleted, item, detected_at));
        }
    }
    for item in new.items() {
        if !old_index.contains_key(item.id.as_str()) {
            changes.push(item_change(ChangeKind::Added, item, detected_at));
        }
    }
    for item in new.items() {
        if let Some(previous) = old_index.get(item.id.as_str()) {
            changes.extend(field_changes(previous, item, detected_at));
            price_changes.extend(price_change(previous, item));
        }
    }

    if options.include_sections {
        changes.extend(section_changes(old, new, detected_at));
    }
    if options.include_document_fields {
        changes.extend(document_field_changes(old, new, detected_at));
    }

    let classification = if changes.is_empty() && price_changes.is_empty() {
        ComparisonClassification::NoTrackedChange
    } else {
        ComparisonClassification::Changed
    };

    ChangeSet {
        classification,
        changes,
        price_changes,
        total_change,
    }
}

fn mismatch(message: String, document_id: &str) -> ExError {
    ExError::new(ExErrorKind::Mismatch)
        .with_op("compare")
        .with_document_id(document_id)
        .with_message(message)
}

/// Compare two versions of the same document
///
/// # Errors
///
/// - `Mismatch`: the versions belong to different documents, or a snapshot
///   is not the one bound to its version
/// - `DeterminismViolation`: the comparison does not survive a JSON
///   round-trip (should never occur in correct builds)
pub fn compare(
    old_version: &Version,
    old_snapshot: &Snapshot,
    new_version: &Version,
    new_snapshot: &Snapshot,
    options: &DiffOptions,
    compared_at: DateTime<Utc>,
) -> Result<Comparison, ExError> {
    if old_version.document_id != new_version.document_id {
        return Err(mismatch(
            format!(
                "versions {} and {} belong to different documents ({} vs {})",
                old_version.id, new_version.id, old_version.document_id, new_version.document_id
            ),
            &old_version.document_id,
        ));
    }
    for (version, snapshot) in [(old_version, old_snapshot), (new_version, new_snapshot)] {
        if version.snapshot_id != snapshot.id() || snapshot.document_id() != version.document_id
        {
            return Err(mismatch(
                format!(
                    "snapshot {} is not bound to version {}",
                    snapshot.id(),
                    version.id
                ),
                &version.document_id,
            ));
        }
    }

    let change_set = diff_snapshots(old_snapshot, new_snapshot, options, compared_at);

    let comparison = Comparison {
        document_id: old_version.document_id.clone(),
        old_version_id: old_version.id.clone(),
        new_version_id: new_version.id.clone(),
        old_digest: old_snapshot.digest().to_string(),
        new_digest: new_snapshot.digest().to_string(),
        classification: change_set.classification,
        changes: change_set.changes,
        price_changes: change_set.price_changes,
        total_change: change_set.total_change,
        options: *options,
        compared_at,
    };

    // Determinism guard: round-trip through JSON must produce an equal struct
    let serialized = serde_json::to_string(&comparison).map_err(|e| {
        ExError::new(ExErrorKind::DeterminismViolation)
            .with_op("compare")
            .with_message(format!("failed to serialize comparison: {}", e))
    })?;
    let reparsed: Comparison = serde_json::from_str(&serialized).map_err(|e| {
        ExError::new(ExErrorKind::DeterminismViolation)
            .with_op("compare")
            .with_message(format!("failed to re-parse comparison: {}", e))
    })?;
    if reparsed != comparison {
        return Err(ExError::new(ExErrorKind::DeterminismViolation)
            .with_op("compare")
            .with_message("comparison is not deterministic: round-trip produced different struct"));
    }

    tracing::debug!(
        document_id = %comparison.document_id,
        change_count = comparison.changes.len(),
        classification = ?comparison.classification,
        "comparison computed"
    );
    Ok(comparison)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::model::PercentageChange;
    use crate::model::{CustomerInfo, SnapshotInput};
    use rust_decimal::Decimal;

    fn item(id: &str, category: &str, qty: i64, price: i64) -> LineItem {
        LineItem::new(id, id.to_uppercase(), category, Decimal::new(qty, 0), Decimal::new(price, 0))
    }

    fn snapshot(id: &str, input: SnapshotInput) -> Snapshot {
        Snapshot::capture(id.to_string(), "doc".to_string(), input, Utc::now()).unwrap()
    }

    fn items(items: Vec<LineItem>) -> SnapshotInput {
        SnapshotInput::with_items(items, Decimal::ZERO)
    }

    #[test]
    fn test_set_delta_preserves_order() {
        let a = vec!["x".to_string(), "y".to_string(), "z".to_string()];
        let b = vec!["w".to_string(), "y".to_string(), "v".to_string()];
        let (added, removed) = set_delta(&a, &b);
        assert_eq!(added, ["w", "v"]);
        assert_eq!(removed, ["x", "z"]);
    }

    #[test]
    fn test_identical_fast_path() {
        let a = snapshot("s1", items(vec![item("a", "c", 1, 10)]));
        let b = snapshot("s2", items(vec![item("a", "c", 1, 10)]));
        let set = diff_snapshots(&a, &b, &DiffOptions::default(), Utc::now());
        assert_eq!(set.classification, ComparisonClassification::Identical);
        assert!(set.changes.is_empty());
        assert!(set.total_change.difference.is_zero());
    }

    #[test]
    fn test_change_ordering() {
        let a = snapshot(
            "s1",
            items(vec![
                item("gone1", "c", 1, 1),
                item("kept", "c", 1, 1),
                item("gone2", "c", 1, 1),
            ]),
        );
        let b = snapshot(
            "s2",
            items(vec![
                item("new1", "c", 1, 1),
                item("kept", "c", 2, 1),
                item("new2", "c", 1, 1),
            ]),
        );
        let set = diff_snapshots(&a, &b, &DiffOptions::default(), Utc::now());

        let order: Vec<(ChangeKind, &str)> = set
            .changes
            .iter()
            .map(|c| (c.kind, c.item_id.as_deref().unwrap_or("")))
            .collect();
        assert_eq!(
            order,
            vec![
                (ChangeKind::Deleted, "gone1"),
                (ChangeKind::Deleted, "gone2"),
                (ChangeKind::Added, "new1"),
                (ChangeKind::Added, "new2"),
                (ChangeKind::Modified, "kept"),
            ]
        );
    }

    #[test]
    fn test_fields_reported_in_tracked_order() {
        let old = item("a", "c", 1, 10).with_attribute("grade", "B");
        let new = LineItem {
            unit_price: Decimal::new(12, 0),
            name: "Renamed".to_string(),
            ..item("a", "c", 1, 10).with_attribute("grade", "A").with_attribute("fire_rated", true)
        };
        let changes = field_changes(&old, &new, Utc::now());
        let fields: Vec<&str> = changes.iter().filter_map(|c| c.field.as_deref()).collect();
        assert_eq!(fields, ["name", "unit_price", "attr.fire_rated", "attr.grade"]);
        assert_eq!(changes[2].old_value, None);
    }

    #[test]
    fn test_price_change_on_quantity_only() {
        let old = item("a", "c", 2, 10_000);
        let new = item("a", "c", 3, 10_000);
        let pc = price_change(&old, &new).unwrap();
        assert_eq!(pc.old_unit_price, pc.new_unit_price);
        assert_eq!(pc.difference, Decimal::new(10_000, 0));
        assert_eq!(pc.percentage.value(), Some(Decimal::new(50, 0)));
        assert!(price_change(&old, &old).is_none());
    }

    #[test]
    fn test_price_change_past_decimal_range() {
        let old = LineItem::new("a", "A", "c", Decimal::ONE, Decimal::new(1, 28));
        let new = item("a", "c", 1, 7_000_000_000);
        let pc = price_change(&old, &new).unwrap();
        assert_eq!(pc.percentage, PercentageChange::OutOfRange);
        assert!(pc.difference > Decimal::ZERO);
    }

    #[test]
    fn test_sections_only_when_enabled() {
        let a = snapshot("s1", items(vec![item("a", "civil", 1, 1), item("b", "roof", 1, 1)]));
        let b = snapshot(
            "s2",
            items(vec![item("a", "civil", 1, 1), item("c", "electrical", 1, 1)]),
        );

        let default = diff_snapshots(&a, &b, &DiffOptions::default(), Utc::now());
        assert!(default.changes.iter().all(|c| c.target != ChangeTarget::Section));

        let options = DiffOptions {
            include_sections: true,
            ..DiffOptions::default()
        };
        let set = diff_snapshots(&a, &b, &options, Utc::now());
        let sections: Vec<(ChangeKind, String)> = set
            .changes
            .iter()
            .filter(|c| c.target == ChangeTarget::Section)
            .map(|c| (c.kind, c.description.clone()))
            .collect();
        assert_eq!(
            sections,
            vec![
                (ChangeKind::Deleted, "Section 'roof' deleted".to_string()),
                (ChangeKind::Added, "Section 'electrical' added".to_string()),
            ]
        );
    }

    #[test]
    fn test_document_fields() {
        let mut input_b = items(vec![]);
        input_b.customer = CustomerInfo {
            email: Some("new@example.com".to_string()),
            ..CustomerInfo::default()
        };
        input_b.tax_rate = Decimal::new(8, 2);
        let a = snapshot("s1", items(vec![]));
        let b = snapshot("s2", input_b);

        let set = diff_snapshots(&a, &b, &DiffOptions::default(), Utc::now());
        let fields: Vec<&str> = set.changes.iter().filter_map(|c| c.field.as_deref()).collect();
        assert_eq!(fields, ["customer.email", "tax_rate"]);
        assert_eq!(set.changes[0].target, ChangeTarget::CustomerField);
        assert_eq!(set.changes[1].target, ChangeTarget::Term);

        let options = DiffOptions {
            include_document_fields: false,
            ..DiffOptions::default()
        };
        let set = diff_snapshots(&a, &b, &options, Utc::now());
        assert_eq!(set.classification, ComparisonClassification::NoTrackedChange);
    }

    #[test]
    fn test_metadata_only_difference_is_untracked() {
        let mut input_b = items(vec![item("a", "c", 1, 1)]);
        input_b.metadata.notes = Some("reviewed".to_string());
        let a = snapshot("s1", items(vec![item("a", "c", 1, 1)]));
        let b = snapshot("s2", input_b);
        let set = diff_snapshots(&a, &b, &DiffOptions::default(), Utc::now());
        assert_eq!(set.classification, ComparisonClassification::NoTrackedChange);
        assert!(set.changes.is_empty());
    }
}
