use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use super::line_item::LineItem;
use crate::errors::{PlanError, Result};
use crate::rules::validation::validate_snapshot_input;

/// Aggregate amounts of a document as presented to the customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl Totals {
    /// Derive totals from the line items: subtotal is the sum of line totals,
    /// tax is `subtotal * tax_rate` (rate as a fraction, 0.10 for 10%).
    ///
    /// # Errors
    ///
    /// `AmountOverflow` if a line total or any of the sums leaves the
    /// `Decimal` range.
    pub fn from_items(items: &[LineItem], tax_rate: Decimal) -> Result<Self> {
        let mut subtotal = Decimal::ZERO;
        for item in items {
            subtotal = item
                .checked_line_total()
                .and_then(|line_total| subtotal.checked_add(line_total))
                .ok_or_else(|| PlanError::AmountOverflow {
                    item_id: Some(item.id.clone()),
                })?;
        }
        let overflow = || PlanError::AmountOverflow { item_id: None };
        let tax = subtotal.checked_mul(tax_rate).ok_or_else(overflow)?;
        let total = subtotal.checked_add(tax).ok_or_else(overflow)?;
        Ok(Self {
            subtotal,
            tax,
            total,
        })
    }
}

/// Customer block printed on the document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Commercial terms
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terms {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_terms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// Descriptive metadata. Included in the content digest but not diffed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Working data submitted by the caller when capturing a snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotInput {
    #[serde(default)]
    pub items: Vec<LineItem>,

    /// Explicit totals; derived from the items when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totals: Option<Totals>,

    #[serde(default)]
    pub tax_rate: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<NaiveDate>,

    #[serde(default)]
    pub customer: CustomerInfo,

    #[serde(default)]
    pub terms: Terms,

    #[serde(default)]
    pub metadata: SnapshotMetadata,
}

impl SnapshotInput {
    /// Input holding only line items and a tax rate
    pub fn with_items(items: Vec<LineItem>, tax_rate: Decimal) -> Self {
        Self {
            items,
            tax_rate,
            ..Self::default()
        }
    }

    pub fn totals(mut self, totals: Totals) -> Self {
        self.totals = Some(totals);
        self
    }
}

/// Immutable point-in-time capture of a document
///
/// Fields are only reachable through accessors; a snapshot is never edited
/// after [`Snapshot::capture`]. Editing a document means capturing a new
/// snapshot and wrapping it in a new version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    id: String,
    document_id: String,
    items: Vec<LineItem>,
    totals: Totals,
    tax_rate: Decimal,
    valid_until: Option<NaiveDate>,
    customer: CustomerInfo,
    terms: Terms,
    metadata: SnapshotMetadata,
    captured_at: DateTime<Utc>,
    digest: String,
}

/// Borrowed view of everything that defines a snapshot's content
#[derive(Serialize)]
struct SemanticContent<'a> {
    document_id: &'a str,
    items: &'a [LineItem],
    totals: &'a Totals,
    tax_rate: &'a Decimal,
    valid_until: &'a Option<NaiveDate>,
    customer: &'a CustomerInfo,
    terms: &'a Terms,
    metadata: &'a SnapshotMetadata,
}

impl Snapshot {
    /// Validate the input and capture it as a snapshot
    ///
    /// # Errors
    ///
    /// Any validation failure from [`validate_snapshot_input`], or
    /// `Serialization` if the content cannot be digested.
    pub fn capture(
        id: String,
        document_id: String,
        input: SnapshotInput,
        captured_at: DateTime<Utc>,
    ) -> Result<Self> {
        validate_snapshot_input(&document_id, &input)?;

        let totals = match input.totals {
            Some(totals) => totals,
            None => Totals::from_items(&input.items, input.tax_rate)?,
        };

        let mut snapshot = Self {
            id,
            document_id,
            items: input.items,
            totals,
            tax_rate: input.tax_rate,
            valid_until: input.valid_until,
            customer: input.customer,
            terms: input.terms,
            metadata: input.metadata,
            captured_at,
            digest: String::new(),
        };
        snapshot.digest = snapshot.compute_digest()?;
        Ok(snapshot)
    }

    /// SHA-256 over the canonical JSON of the semantic content
    ///
    /// # Errors
    ///
    /// `Serialization` if the content cannot be encoded.
    pub fn compute_digest(&self) -> Result<String> {
        let content = SemanticContent {
            document_id: &self.document_id,
            items: &self.items,
            totals: &self.totals,
            tax_rate: &self.tax_rate,
            valid_until: &self.valid_until,
            customer: &self.customer,
            terms: &self.terms,
            metadata: &self.metadata,
        };
        let canonical = serde_json::to_vec(&content)?;
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        Ok(hex::encode(hasher.finalize()))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Line items in document order
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn item(&self, item_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    pub fn valid_until(&self) -> Option<NaiveDate> {
        self.valid_until
    }

    pub fn customer(&self) -> &CustomerInfo {
        &self.customer
    }

    pub fn terms(&self) -> &Terms {
        &self.terms
    }

    pub fn metadata(&self) -> &SnapshotMetadata {
        &self.metadata
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PlanError;

    fn item(id: &str, qty: i64, price: i64) -> LineItem {
        LineItem::new(id, id, "general", Decimal::new(qty, 0), Decimal::new(price, 0))
    }

    fn capture(input: SnapshotInput) -> Result<Snapshot> {
        Snapshot::capture("s1".into(), "doc-1".into(), input, Utc::now())
    }

    #[test]
    fn test_totals_derived_when_absent() {
        let input = SnapshotInput::with_items(
            vec![item("a", 2, 100), item("b", 1, 50)],
            Decimal::new(10, 2),
        );
        let snapshot = capture(input).unwrap();
        assert_eq!(snapshot.totals().subtotal, Decimal::new(250, 0));
        assert_eq!(snapshot.totals().tax, Decimal::new(25, 0));
        assert_eq!(snapshot.totals().total, Decimal::new(275, 0));
    }

    #[test]
    fn test_explicit_totals_kept_verbatim() {
        let totals = Totals {
            subtotal: Decimal::new(1_000, 0),
            tax: Decimal::ZERO,
            total: Decimal::new(1_000, 0),
        };
        let input =
            SnapshotInput::with_items(vec![item("a", 1, 1)], Decimal::ZERO).totals(totals.clone());
        assert_eq!(capture(input).unwrap().totals(), &totals);
    }

    #[test]
    fn test_digest_ignores_id_and_capture_time() {
        let input = SnapshotInput::with_items(vec![item("a", 1, 100)], Decimal::ZERO);
        let a = Snapshot::capture("s1".into(), "doc".into(), input.clone(), Utc::now()).unwrap();
        let b = Snapshot::capture("s2".into(), "doc".into(), input, Utc::now()).unwrap();
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn test_digest_tracks_content() {
        let a = capture(SnapshotInput::with_items(vec![item("a", 1, 100)], Decimal::ZERO)).unwrap();
        let b = capture(SnapshotInput::with_items(vec![item("a", 2, 100)], Decimal::ZERO)).unwrap();
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_capture_rejects_invalid_input() {
        let input = SnapshotInput::with_items(vec![item("a", -1, 100)], Decimal::ZERO);
        assert!(matches!(capture(input), Err(PlanError::NegativeQuantity { .. })));
    }

    #[test]
    fn test_totals_out_of_range() {
        let huge = LineItem::new("huge", "Huge", "general", Decimal::MAX, Decimal::TWO);
        assert!(matches!(
            Totals::from_items(&[huge], Decimal::ZERO),
            Err(PlanError::AmountOverflow { item_id: Some(id) }) if id == "huge"
        ));

        // each line fits, their sum does not
        let half = LineItem::new("half", "Half", "general", Decimal::MAX, Decimal::ONE);
        let again = LineItem::new("again", "Again", "general", Decimal::MAX, Decimal::ONE);
        assert!(matches!(
            Totals::from_items(&[half, again], Decimal::ZERO),
            Err(PlanError::AmountOverflow { item_id: Some(id) }) if id == "again"
        ));

        let max = LineItem::new("max", "Max", "general", Decimal::MAX, Decimal::ONE);
        assert!(matches!(
            Totals::from_items(&[max], Decimal::new(10, 2)),
            Err(PlanError::AmountOverflow { item_id: None })
        ));
    }

    #[test]
    fn test_item_lookup() {
        let snapshot = capture(SnapshotInput::with_items(
            vec![item("a", 1, 1), item("b", 1, 1)],
            Decimal::ZERO,
        ))
        .unwrap();
        assert!(snapshot.item("b").is_some());
        assert!(snapshot.item("z").is_none());
        assert!(!snapshot.is_empty());
    }
}
