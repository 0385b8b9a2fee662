// src/format.rs
use crate::models::DamageAnalysis;
use chrono::{DateTime, Utc};

/// Rupee amount with Indian digit grouping, e.g. `₹1,23,456.50`.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let rupees = (cents / 100).to_string();
    let paise = cents % 100;

    let grouped = if rupees.len() <= 3 {
        rupees
    } else {
        let (head, tail) = rupees.split_at(rupees.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 2 {
            groups.push(&head[end - 2..end]);
            end -= 2;
        }
        groups.push(&head[..end]);
        groups.reverse();
        format!("{},{}", groups.join(","), tail)
    };

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}₹{}.{:02}", sign, grouped, paise)
}

pub fn format_analysis_date(ts: &DateTime<Utc>) -> String {
    ts.format("%b %-d, %I:%M %p").to_string()
}

pub fn format_member_since(ts: &DateTime<Utc>) -> String {
    ts.format("%B %Y").to_string()
}

pub fn format_confidence(confidence: f64) -> String {
    format!("{:.0}%", confidence * 100.0)
}

/// Human-readable block for one analysis.
pub fn summarize(analysis: &DamageAnalysis) -> String {
    let mut lines = vec![format!(
        "Analysis {} ({})",
        analysis.id,
        format_analysis_date(&analysis.analysis_date)
    )];

    if !analysis.damage_detected {
        lines.push(format!(
            "  No damage detected (confidence {})",
            format_confidence(analysis.confidence)
        ));
        return lines.join("\n") + "\n";
    }

    lines.push(format!(
        "  Damage detected: {} severity, confidence {}",
        analysis.severity,
        format_confidence(analysis.confidence)
    ));
    lines.extend(analysis.damage_type.iter().map(|finding| {
        format!(
            "  - {} on {} ({})",
            finding.kind, finding.location, finding.severity
        )
    }));

    let cost = &analysis.cost_estimation;
    lines.push(format!("  Estimated cost: {}", format_currency(cost.total_cost)));
    lines.push(format!(
        "    Labor: {}  Parts: {}  Paint: {}",
        format_currency(cost.labor_cost),
        format_currency(cost.parts_cost),
        format_currency(cost.paint_cost)
    ));
    lines.extend(cost.breakdown.iter().map(|entry| {
        format!(
            "    {} [{:?}] {} {}",
            entry.item,
            entry.category,
            format_currency(entry.cost),
            entry.description
        )
    }));

    lines.join("\n") + "\n"
}
