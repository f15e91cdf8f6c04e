use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::errors::{PlanError, Result};
use crate::model::SnapshotInput;

/// Validate working data before it is captured as a snapshot
///
/// Checks run in a fixed order and the first failure is returned:
///
/// 1. Document id is not blank
/// 2. Every line item has a non-blank id
/// 3. Line item ids are unique
/// 4. Quantity, unit price and cost price are not negative
/// 5. Quantity times unit price fits in a `Decimal`
/// 6. Tax rate is not negative
/// 7. Explicit subtotal, tax and total, when given, are not negative
///
/// # Errors
///
/// Returns the `PlanError` for the first violated rule.
pub fn validate_snapshot_input(document_id: &str, input: &SnapshotInput) -> Result<()> {
    if document_id.trim().is_empty() {
        return Err(PlanError::EmptyDocumentId);
    }

    let mut seen = HashSet::with_capacity(input.items.len());
    for (position, item) in input.items.iter().enumerate() {
        if item.id.trim().is_empty() {
            return Err(PlanError::EmptyItemId { position });
        }
        if !seen.insert(item.id.as_str()) {
            return Err(PlanError::DuplicateItemId {
                item_id: item.id.clone(),
            });
        }
    }

    for item in &input.items {
        if item.quantity < Decimal::ZERO {
            return Err(PlanError::NegativeQuantity {
                item_id: item.id.clone(),
                quantity: item.quantity,
            });
        }
        if item.unit_price < Decimal::ZERO {
            return Err(PlanError::NegativeUnitPrice {
                item_id: item.id.clone(),
                unit_price: item.unit_price,
            });
        }
        if let Some(cost_price) = item.cost_price {
            if cost_price < Decimal::ZERO {
                return Err(PlanError::NegativeCostPrice {
                    item_id: item.id.clone(),
                    cost_price,
                });
            }
        }
        if item.checked_line_total().is_none() {
            return Err(PlanError::AmountOverflow {
                item_id: Some(item.id.clone()),
            });
        }
    }

    if input.tax_rate < Decimal::ZERO {
        return Err(PlanError::NegativeTaxRate {
            tax_rate: input.tax_rate,
        });
    }

    if let Some(totals) = &input.totals {
        let fields = [
            ("subtotal", totals.subtotal),
            ("tax", totals.tax),
            ("total", totals.total),
        ];
        if let Some((field, amount)) = fields.into_iter().find(|(_, a)| *a < Decimal::ZERO) {
            return Err(PlanError::NegativeTotal {
                field: field.to_string(),
                amount,
            });
        }
    }

    Ok(())
}

/// Validate a version title (must contain a non-whitespace character)
///
/// # Errors
///
/// Returns `InvalidTitle` for blank titles.
pub fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(PlanError::InvalidTitle {
            reason: "title cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}
