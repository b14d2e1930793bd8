//! Report formatting for terminal output

use crate::models::Money;
use crate::services::report::GroupReport;

/// Format a percentage with appropriate precision
pub fn format_percentage(pct: f64) -> String {
    if pct < 0.1 && pct > 0.0 {
        format!("{:.2}%", pct)
    } else if pct < 10.0 {
        format!("{:.1}%", pct)
    } else {
        format!("{:.0}%", pct)
    }
}

/// Create a simple bar chart representation
pub fn format_bar(value: f64, max_value: f64, width: usize) -> String {
    if max_value <= 0.0 || value <= 0.0 {
        return " ".repeat(width);
    }

    let filled = ((value / max_value) * width as f64).round() as usize;
    let filled = filled.min(width);

    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn separator(width: usize) -> String {
    "─".repeat(width)
}

pub fn double_separator(width: usize) -> String {
    "═".repeat(width)
}

/// Truncate to `max_len` characters, ending in "..." when cut
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        ".".repeat(max_len)
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

fn share_of(part: Money, whole: Money) -> f64 {
    if whole.is_positive() {
        part.cents() as f64 / whole.cents() as f64 * 100.0
    } else {
        0.0
    }
}

/// Full group report
pub fn format_group_report(report: &GroupReport, symbol: &str) -> String {
    let money = |m: Money| m.format_with_symbol(symbol);
    let width = 60;
    let mut output = String::new();

    output.push_str(&double_separator(width));
    output.push('\n');
    output.push_str(&format!("Report: {} ({})\n", report.group.name, report.group.currency));
    output.push_str(&double_separator(width));
    output.push('\n');

    output.push_str(&format!(
        "  Wallet Balance:   {:>16}\n",
        money(report.group.shared_wallet_balance)
    ));
    output.push_str(&format!("  Total Deposits:   {:>16}\n", money(report.total_deposits)));
    output.push_str(&format!("  Total Spent:      {:>16}\n", money(report.total_payments)));
    if report.pending_count > 0 {
        output.push_str(&format!(
            "  Pending:          {:>16}  ({} awaiting approval)\n",
            money(report.pending_amount),
            report.pending_count
        ));
    }
    output.push('\n');

    output.push_str("Spending by Category\n");
    output.push_str(&separator(width));
    output.push('\n');
    if report.categories.is_empty() {
        output.push_str("  No confirmed payments yet.\n");
    } else {
        let max = report
            .categories
            .first()
            .map(|c| c.amount.cents() as f64)
            .unwrap_or(0.0);
        for line in &report.categories {
            output.push_str(&format!(
                "  {:<16} {:>14} {:>5}  {}\n",
                truncate(line.category.label(), 16),
                money(line.amount),
                format_percentage(share_of(line.amount, report.total_payments)),
                format_bar(line.amount.cents() as f64, max, 16),
            ));
        }
    }
    output.push('\n');

    output.push_str("Spending by Member\n");
    output.push_str(&separator(width));
    output.push('\n');
    if report.members.is_empty() {
        output.push_str("  No confirmed payments yet.\n");
    } else {
        for line in &report.members {
            output.push_str(&format!(
                "  {:<18} {:<14} {:>14}\n",
                truncate(&line.member.name, 18),
                truncate(&line.family_name, 14),
                money(line.amount),
            ));
        }
    }
    output.push('\n');

    output.push_str("Families\n");
    output.push_str(&separator(width));
    output.push('\n');
    output.push_str(&format!(
        "  {:<16} {:>7} {:>14} {:>14}\n",
        "Family", "Members", "Contributed", "Balance"
    ));
    for line in &report.families {
        output.push_str(&format!(
            "  {:<16} {:>7} {:>14} {:>14}\n",
            truncate(&line.family.name, 16),
            line.member_count,
            money(line.family.total_contribution),
            money(line.family.balance),
        ));
    }
    output.push('\n');

    let recon = &report.reconciliation;
    if recon.is_balanced() {
        output.push_str("Ledger check: balanced\n");
    } else {
        output.push_str(&format!(
            "Ledger check: OUT OF BALANCE by {} (stored {}, ledger {})\n",
            money(recon.difference()),
            money(recon.stored),
            money(recon.ledger),
        ));
    }

    output
}
