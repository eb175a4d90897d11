//! Print rendering: the full report as a standalone Markdown document.
//!
//! Always renders the unfiltered report; the host decides where the text
//! goes (file, printer, stdout).

use rust_decimal::Decimal;

use super::index::{self, total_value};
use super::model::Report;
use super::view::recommendation_or_default;

/// Format an amount in shekels with thousands separators, e.g. `₪12,500`.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(0);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-₪{grouped}")
    } else {
        format!("₪{grouped}")
    }
}

/// Render every record, grouped by authority, with steps and documents.
pub fn render_for_print(report: &Report) -> String {
    let mut out = Vec::new();
    out.push("# Entitlements report".to_string());
    out.push(String::new());
    out.push(format!(
        "Estimated annual value: **{}** across {} entitlements ({} urgent).",
        format_amount(total_value(report)),
        report.len(),
        report.critical_count()
    ));

    let all: Vec<_> = report.iter().collect();
    for group in index::group_by_authority(&all) {
        out.push(String::new());
        out.push(format!("## {}", group.authority));

        for record in group.records {
            out.push(String::new());
            let mut heading = format!("### {} [{}]", record.title, record.priority);
            if let Some(value) = record.numeric_value {
                heading.push_str(&format!(" ({})", format_amount(value)));
            }
            out.push(heading);

            if !record.description.is_empty() {
                out.push(record.description.clone());
            }
            if let Some(ref time) = record.estimated_processing_time {
                out.push(format!("Processing time: {time}"));
            }

            if !record.action_steps.is_empty() {
                out.push(String::new());
                out.push("Action steps:".to_string());
                for (i, step) in record.action_steps.iter().enumerate() {
                    out.push(format!("{}. {}", i + 1, step));
                }
            }

            if !record.documents_to_prepare.is_empty() {
                out.push(String::new());
                out.push("Documents:".to_string());
                for doc in &record.documents_to_prepare {
                    out.push(format!("- [ ] {doc}"));
                }
            }

            out.push(String::new());
            out.push(format!("> {}", recommendation_or_default(record)));

            if let Some(ref link) = record.official_link {
                out.push(format!("Official link: {link}"));
            }
        }
    }

    out.push(String::new());
    out.join("\n")
}
