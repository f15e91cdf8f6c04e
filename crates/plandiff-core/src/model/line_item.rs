use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::value::FieldValue;

/// One priced line of an estimate or financial plan
///
/// `category` doubles as the section the line is listed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Identifier, unique within a snapshot
    pub id: String,

    /// Display name
    pub name: String,

    /// Section / category the line belongs to
    pub category: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub quantity: Decimal,

    /// Unit label (m2, set, day)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    pub unit_price: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_price: Option<Decimal>,

    /// Custom typed attributes, keyed by attribute name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, FieldValue>,
}

impl LineItem {
    /// Create a line item with the mandatory fields
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            description: None,
            quantity,
            unit: None,
            unit_price,
            cost_price: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_cost_price(mut self, cost_price: Decimal) -> Self {
        self.cost_price = Some(cost_price);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Quantity times unit price, `None` if it does not fit in a `Decimal`
    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_price)
    }

    /// Quantity times unit price
    ///
    /// Saturates at the `Decimal` bounds. Captured snapshots never reach
    /// them: capture rejects items whose [`checked_line_total`] overflows.
    ///
    /// [`checked_line_total`]: LineItem::checked_line_total
    pub fn line_total(&self) -> Decimal {
        self.quantity.saturating_mul(self.unit_price)
    }
}
