use rust_decimal::Decimal;

use crate::diff::model::{PercentageChange, TotalChange};

/// Decimal places kept in percentages
pub const PERCENT_SCALE: u32 = 4;

/// Percentage change from `old` to `new`
///
/// Equal amounts (including 0 -> 0) give zero; any move away from a zero
/// baseline gives [`PercentageChange::UndefinedIncrease`]. A ratio that
/// leaves the `Decimal` range gives [`PercentageChange::OutOfRange`].
pub fn percentage_change(old: Decimal, new: Decimal) -> PercentageChange {
    if old == new {
        return PercentageChange::ZERO;
    }
    if old.is_zero() {
        return PercentageChange::UndefinedIncrease;
    }
    new.checked_sub(old)
        .and_then(|delta| delta.checked_div(old))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map_or(PercentageChange::OutOfRange, |ratio| {
            PercentageChange::Value(ratio.round_dp(PERCENT_SCALE))
        })
}

pub fn total_change(old_total: Decimal, new_total: Decimal) -> TotalChange {
    TotalChange {
        old_total,
        new_total,
        difference: new_total.saturating_sub(old_total),
        percentage: percentage_change(old_total, new_total),
    }
}
