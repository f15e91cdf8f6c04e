mod common;

use common::{baseline_items, dec, item, TestBed};
use plandiff_core::diff::{compare, DiffOptions};
use plandiff_core::errors::ExErrorKind;
use plandiff_core::model::{SnapshotInput, VersionKind};
use plandiff_core::report::{render_human_summary, summarize};
use rust_decimal::Decimal;

fn changed_comparison(bed: &TestBed) -> plandiff_core::diff::Comparison {
    let mut old_items = baseline_items();
    old_items.push(item("paint", "Paint", 10, 1_000));
    old_items.push(item("glass", "Glass", 10, 1_000));
    let v1 = bed.version(
        "est-9",
        None,
        VersionKind::Major,
        SnapshotInput::with_items(old_items, Decimal::ZERO),
    );

    let mut new_items = baseline_items();
    new_items[0].unit_price = dec(550_000); // -50,000
    new_items[1].quantity = dec(3); // +10,000
    new_items.retain(|i| i.id != "roof");
    new_items.push(item("paint", "Paint", 11, 1_000)); // +1,000
    new_items.push(item("glass", "Glass", 9, 1_000)); // -1,000
    new_items.push(item("gutter", "Gutter", 4, 2_500));
    let v2 = bed.version(
        "est-9",
        Some(&v1.id),
        VersionKind::Minor,
        SnapshotInput::with_items(new_items, Decimal::ZERO),
    );

    compare(
        &v1,
        &bed.snapshot_of(&v1),
        &v2,
        &bed.snapshot_of(&v2),
        &DiffOptions::default(),
        bed.clock_now(),
    )
    .unwrap()
}

#[test]
fn test_summarize_without_comparison_is_invalid_argument() {
    let err = summarize(None).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidArgument);
    assert_eq!(err.op(), Some("summarize"));
}

#[test]
fn test_summary_counts() {
    let bed = TestBed::new();
    let comparison = changed_comparison(&bed);
    let summary = summarize(Some(&comparison)).unwrap();

    assert_eq!(summary.added_count, 1);
    assert_eq!(summary.deleted_count, 1);
    assert_eq!(summary.modified_count, 4);
    assert_eq!(summary.total_changes(), 6);
    assert_eq!(summary.changed_item_count, 6);
    assert_eq!(summary.highlights.len(), 6);
    assert_eq!(summary.total_change, comparison.total_change);
}

#[test]
fn test_price_changes_ranked_by_absolute_difference() {
    let bed = TestBed::new();
    let summary = summarize(Some(&changed_comparison(&bed))).unwrap();

    let ranked: Vec<&str> = summary.price_changes.iter().map(|p| p.item_id.as_str()).collect();
    // paint and glass tie at 1,000 and keep comparison order
    assert_eq!(ranked, ["foundation", "beam", "paint", "glass"]);
}

#[test]
fn test_rendered_summary() {
    let bed = TestBed::new();
    let summary = summarize(Some(&changed_comparison(&bed))).unwrap();
    let text = render_human_summary(&summary);

    assert!(text.starts_with("## Version Comparison"));
    assert!(text.contains("**Classification**: Changed"));
    assert!(text.contains("- **Added**: 1"));
    assert!(text.contains("| Foundation work | 600000 -> 550000 |"));
    assert!(text.contains("Deleted 'Roofing'"));
}
