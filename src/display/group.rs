//! Group and family display formatting

use super::report::truncate;
use crate::models::{Group, Money};
use crate::services::FamilyRoster;

/// Format groups as a table, each in its own currency
pub fn format_group_list(groups: &[Group], symbol_for: impl Fn(&str) -> String) -> String {
    if groups.is_empty() {
        return "No groups found.\n".to_string();
    }

    let name_width = groups
        .iter()
        .map(|g| g.name.chars().count())
        .max()
        .unwrap_or(4)
        .clamp(4, 30);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:12}  {:>14}  {:>14}  {}\n",
        "Name",
        "ID",
        "Balance",
        "Spent",
        "Approval",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:-<12}  {:->14}  {:->14}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for group in groups {
        let symbol = symbol_for(&group.currency);
        let symbol = symbol.as_str();
        let approval = if group.require_approval_above_threshold {
            format!(">= {}", group.large_payment_threshold.format_with_symbol(symbol))
        } else {
            "off".to_string()
        };
        output.push_str(&format!(
            "{:<name_width$}  {:12}  {:>14}  {:>14}  {}\n",
            truncate(&group.name, name_width),
            group.id.short(),
            group.shared_wallet_balance.format_with_symbol(symbol),
            group.total_spent.format_with_symbol(symbol),
            approval,
            name_width = name_width,
        ));
    }

    output
}

/// Format one group with its families
pub fn format_group_details(group: &Group, rosters: &[FamilyRoster], symbol: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Group: {}\n", group.name));
    output.push_str(&format!("  ID:             {}\n", group.id));
    if !group.description.is_empty() {
        output.push_str(&format!("  Description:    {}\n", group.description));
    }
    output.push_str(&format!("  Currency:       {}\n", group.currency));
    output.push_str(&format!(
        "  Wallet Balance: {}\n",
        group.shared_wallet_balance.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "  Total Spent:    {}\n",
        group.total_spent.format_with_symbol(symbol)
    ));
    output.push_str(&format!(
        "  Approval:       {}\n",
        if group.require_approval_above_threshold {
            format!(
                "payments of {} or more",
                group.large_payment_threshold.format_with_symbol(symbol)
            )
        } else {
            "not required".to_string()
        }
    ));
    output.push('\n');
    output.push_str(&format_family_rosters(rosters, symbol));

    output
}

/// Families with their members and balances
pub fn format_family_rosters(rosters: &[FamilyRoster], symbol: &str) -> String {
    if rosters.is_empty() {
        return "No families yet.\n".to_string();
    }

    let mut output = String::new();
    for roster in rosters {
        let family = &roster.family;
        let marker = if family.is_in_debit() { "  (in debit)" } else { "" };
        output.push_str(&format!(
            "{} [{}]  balance {}  contributed {}{}\n",
            family.name,
            family.id.short(),
            family.balance.format_with_symbol(symbol),
            family.total_contribution.format_with_symbol(symbol),
            marker,
        ));

        if roster.members.is_empty() {
            output.push_str("    (no members)\n");
        }
        for member in &roster.members {
            let age = member.age.map(|a| format!(", {}", a)).unwrap_or_default();
            output.push_str(&format!(
                "    {:<20} {:<9} {:>5}{}\n",
                truncate(&member.name, 20),
                member.member_type.to_string(),
                member.share_ratio.to_string(),
                age,
            ));
        }
    }

    let total: Money = rosters.iter().map(|r| r.family.balance).sum();
    output.push_str(&format!(
        "\nSum of family balances: {}\n",
        total.format_with_symbol(symbol)
    ));

    output
}
