#![allow(clippy::result_large_err)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::diff::model::{
    ChangeKind, ChangeTarget, Comparison, ComparisonClassification, PriceChange, TotalChange,
};
use crate::errors::{ExError, ExErrorKind};

/// Aggregated view of a [`Comparison`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonSummary {
    pub document_id: String,
    pub old_version_id: String,
    pub new_version_id: String,
    pub classification: ComparisonClassification,
    pub added_count: usize,
    pub modified_count: usize,
    pub deleted_count: usize,
    /// Distinct line items touched by any change
    pub changed_item_count: usize,
    /// Sorted by absolute difference, largest first
    pub price_changes: Vec<PriceChange>,
    pub total_change: TotalChange,
    /// Change descriptions in comparison order
    pub highlights: Vec<String>,
}

impl ComparisonSummary {
    pub fn total_changes(&self) -> usize {
        self.added_count + self.modified_count + self.deleted_count
    }
}

/// Summarize a comparison
///
/// Price changes with equal absolute differences keep their comparison order.
///
/// # Errors
///
/// `InvalidArgument` when no comparison is given.
pub fn summarize(comparison: Option<&Comparison>) -> Result<ComparisonSummary, ExError> {
    let comparison = comparison.ok_or_else(|| {
        ExError::new(ExErrorKind::InvalidArgument)
            .with_op("summarize")
            .with_message("no comparison to summarize")
    })?;

    let count = |kind: ChangeKind| comparison.changes.iter().filter(|c| c.kind == kind).count();

    let changed_items: BTreeSet<&str> = comparison
        .changes
        .iter()
        .filter(|c| c.target == ChangeTarget::LineItem)
        .filter_map(|c| c.item_id.as_deref())
        .collect();

    let mut price_changes = comparison.price_changes.clone();
    price_changes.sort_by(|a, b| b.difference.abs().cmp(&a.difference.abs()));

    Ok(ComparisonSummary {
        document_id: comparison.document_id.clone(),
        old_version_id: comparison.old_version_id.clone(),
        new_version_id: comparison.new_version_id.clone(),
        classification: comparison.classification,
        added_count: count(ChangeKind::Added),
        modified_count: count(ChangeKind::Modified),
        deleted_count: count(ChangeKind::Deleted),
        changed_item_count: changed_items.len(),
        price_changes,
        total_change: comparison.total_change.clone(),
        highlights: comparison
            .changes
            .iter()
            .map(|c| c.description.clone())
            .collect(),
    })
}
