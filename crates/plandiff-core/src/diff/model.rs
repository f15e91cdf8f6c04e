//! Comparison output types.
//!
//! All types implement `Debug, Clone, Serialize, Deserialize, PartialEq` so a
//! comparison can be round-tripped through JSON and checked for equality.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::FieldValue;

/// What happened to the target
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
        })
    }
}

/// Which part of the document a change touches
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTarget {
    LineItem,
    Section,
    CustomerField,
    Term,
    Price,
}

/// One detected difference between two snapshots
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Change {
    pub kind: ChangeKind,
    pub target: ChangeTarget,
    /// Affected line item (line-item and price changes only)
    pub item_id: Option<String>,
    pub item_name: Option<String>,
    /// Field name for modifications (`quantity`, `attr.fire_rated`, `customer.email`)
    pub field: Option<String>,
    pub old_value: Option<FieldValue>,
    pub new_value: Option<FieldValue>,
    /// Human-readable one-liner
    pub description: String,
    pub detected_at: DateTime<Utc>,
}

/// Percentage change between two amounts
///
/// `(new - old) / old * 100`, rounded to four decimal places. A change away
/// from zero has no finite percentage and is reported as
/// [`PercentageChange::UndefinedIncrease`]; a ratio too large for a `Decimal`
/// is [`PercentageChange::OutOfRange`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PercentageChange {
    Value(Decimal),
    UndefinedIncrease,
    /// The ratio does not fit in a `Decimal`
    OutOfRange,
}

impl PercentageChange {
    pub const ZERO: PercentageChange = PercentageChange::Value(Decimal::ZERO);

    /// The finite value, if any
    pub fn value(&self) -> Option<Decimal> {
        match self {
            PercentageChange::Value(v) => Some(*v),
            PercentageChange::UndefinedIncrease | PercentageChange::OutOfRange => None,
        }
    }
}

impl fmt::Display for PercentageChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PercentageChange::Value(v) if v.is_sign_positive() && !v.is_zero() => {
                write!(f, "+{}%", v.normalize())
            }
            PercentageChange::Value(v) => write!(f, "{}%", v.normalize()),
            PercentageChange::UndefinedIncrease => f.write_str("n/a (from zero)"),
            PercentageChange::OutOfRange => f.write_str("n/a (out of range)"),
        }
    }
}

/// Price movement of one line item present in both snapshots
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceChange {
    pub item_id: String,
    pub item_name: String,
    pub old_unit_price: Decimal,
    pub new_unit_price: Decimal,
    pub old_line_total: Decimal,
    pub new_line_total: Decimal,
    /// `new_line_total - old_line_total`
    pub difference: Decimal,
    pub percentage: PercentageChange,
}

/// Movement of the document total
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TotalChange {
    pub old_total: Decimal,
    pub new_total: Decimal,
    pub difference: Decimal,
    pub percentage: PercentageChange,
}

/// High-level classification of a comparison
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ComparisonClassification {
    /// Both snapshots have the same content digest
    Identical,
    /// Content differs only in untracked data (metadata, disabled sections)
    NoTrackedChange,
    /// At least one tracked difference
    Changed,
}

/// Knobs controlling which change families are reported
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffOptions {
    /// Report categories that appeared or disappeared
    pub include_sections: bool,
    /// Report customer, terms, tax rate and validity changes
    pub include_document_fields: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            include_sections: false,
            include_document_fields: true,
        }
    }
}

/// Changes, price movements and total delta between two snapshots
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeSet {
    pub classification: ComparisonClassification,
    pub changes: Vec<Change>,
    pub price_changes: Vec<PriceChange>,
    pub total_change: TotalChange,
}

/// Structured comparison of two versions of one document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comparison {
    pub document_id: String,
    /// The "old" side (A)
    pub old_version_id: String,
    /// The "new" side (B)
    pub new_version_id: String,
    pub old_digest: String,
    pub new_digest: String,
    pub classification: ComparisonClassification,
    /// Ordered: deletions, additions, modifications, sections, document fields
    pub changes: Vec<Change>,
    pub price_changes: Vec<PriceChange>,
    pub total_change: TotalChange,
    pub options: DiffOptions,
    pub compared_at: DateTime<Utc>,
}

impl Comparison {
    pub fn added(&self) -> Vec<&Change> {
        self.of_kind(ChangeKind::Added)
    }

    pub fn modified(&self) -> Vec<&Change> {
        self.of_kind(ChangeKind::Modified)
    }

    pub fn deleted(&self) -> Vec<&Change> {
        self.of_kind(ChangeKind::Deleted)
    }

    /// No changes and no price movement
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.price_changes.is_empty()
    }

    fn of_kind(&self, kind: ChangeKind) -> Vec<&Change> {
        self.changes.iter().filter(|c| c.kind == kind).collect()
    }
}
