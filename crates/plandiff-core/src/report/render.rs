//! Human-readable summary renderer for comparisons.

use rust_decimal::Decimal;

use crate::diff::model::ComparisonClassification;
use crate::report::summary::ComparisonSummary;

fn signed(amount: Decimal) -> String {
    let amount = amount.normalize();
    if amount.is_sign_positive() && !amount.is_zero() {
        format!("+{}", amount)
    } else {
        amount.to_string()
    }
}

/// Render a Markdown summary of a [`ComparisonSummary`].
///
/// Intended for review and approval screens. It is informational only and
/// carries nothing that the structured summary does not.
pub fn render_human_summary(summary: &ComparisonSummary) -> String {
    let mut out = String::new();

    out.push_str("## Version Comparison\n\n");
    let class_label = match summary.classification {
        ComparisonClassification::Identical => "Identical",
        ComparisonClassification::NoTrackedChange => "No Tracked Change",
        ComparisonClassification::Changed => "Changed",
    };
    out.push_str(&format!(
        "**Document**: `{}`  \n**Versions**: `{}` -> `{}`  \n**Classification**: {}\n\n",
        summary.document_id, summary.old_version_id, summary.new_version_id, class_label
    ));

    // Total block is always shown
    let total = &summary.total_change;
    out.push_str("### Total\n\n");
    out.push_str(&format!(
        "| Old | New | Difference | Change |\n\
         |---|---|---|---|\n\
         | {} | {} | {} | {} |\n\n",
        total.old_total.normalize(),
        total.new_total.normalize(),
        signed(total.difference),
        total.percentage
    ));

    if summary.total_changes() == 0 {
        out.push_str("_No tracked changes detected._\n");
        return out;
    }

    out.push_str("### Changes\n\n");
    out.push_str(&format!(
        "- **Added**: {}\n- **Modified**: {}\n- **Deleted**: {}\n- **Items touched**: {}\n\n",
        summary.added_count,
        summary.modified_count,
        summary.deleted_count,
        summary.changed_item_count
    ));
    for line in &summary.highlights {
        out.push_str(&format!("- {}\n", line));
    }
    out.push('\n');

    if !summary.price_changes.is_empty() {
        out.push_str("### Price Changes\n\n");
        out.push_str("| Item | Unit price | Line total | Difference | Change |\n");
        out.push_str("|---|---|---|---|---|\n");
        for pc in &summary.price_changes {
            out.push_str(&format!(
                "| {} | {} -> {} | {} -> {} | {} | {} |\n",
                pc.item_name,
                pc.old_unit_price.normalize(),
                pc.new_unit_price.normalize(),
                pc.old_line_total.normalize(),
                pc.new_line_total.normalize(),
                signed(pc.difference),
                pc.percentage
            ));
        }
        out.push('\n');
    }

    out
}
