//! Transaction display formatting
//!
//! Register listings, detail views, and the split breakdown printed after a
//! payment.

use std::collections::HashMap;

use super::report::truncate;
use crate::models::{
    FamilyId, Member, MemberId, Money, Transaction, TransactionKind, TransactionStatus,
};
use crate::services::PaymentReceipt;

fn status_icon(status: TransactionStatus) -> &'static str {
    match status {
        TransactionStatus::Pending => "…",
        TransactionStatus::Confirmed => "✓",
        TransactionStatus::Declined => "✗",
    }
}

/// Signed amount as it affects the wallet
fn signed(txn: &Transaction, symbol: &str) -> String {
    match txn.kind {
        TransactionKind::Deposit => format!("+{}", txn.amount.format_with_symbol(symbol)),
        TransactionKind::Payment => format!("-{}", txn.amount.format_with_symbol(symbol)),
    }
}

/// Format a list of transactions as a register
pub fn format_transaction_register(transactions: &[Transaction], symbol: &str) -> String {
    if transactions.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:2} {:12} {:10} {:24} {:>14}  {}\n",
        "St", "ID", "Date", "Description", "Amount", "Category"
    ));
    output.push_str(&"-".repeat(78));
    output.push('\n');

    for txn in transactions {
        output.push_str(&format!(
            "{:2} {:12} {:10} {:24} {:>14}  {}\n",
            status_icon(txn.status),
            txn.id.short(),
            txn.created_at.format("%Y-%m-%d"),
            truncate(&txn.title(), 24),
            signed(txn, symbol),
            txn.category.map(|c| c.label()).unwrap_or(""),
        ));
    }

    output
}

/// Format one transaction with its per-member splits
pub fn format_transaction_details(txn: &Transaction, members: &[Member], symbol: &str) -> String {
    let names: HashMap<MemberId, &str> = members.iter().map(|m| (m.id, m.name.as_str())).collect();
    let mut output = String::new();

    output.push_str(&format!("Transaction: {}\n", txn.id));
    output.push_str(&format!("  Type:        {}\n", txn.kind));
    output.push_str(&format!("  Amount:      {}\n", txn.amount.format_with_symbol(symbol)));
    output.push_str(&format!("  Status:      {}\n", txn.status));
    output.push_str(&format!(
        "  Created:     {}\n",
        txn.created_at.format("%Y-%m-%d %H:%M")
    ));

    if !txn.description.is_empty() {
        output.push_str(&format!("  Description: {}\n", txn.description));
    }
    if let Some(merchant) = &txn.merchant_name {
        output.push_str(&format!("  Merchant:    {}\n", merchant));
    }
    if let Some(category) = txn.category {
        output.push_str(&format!("  Category:    {}\n", category));
    }
    if let Some(paid_by) = &txn.paid_by {
        output.push_str(&format!("  Paid by:     {}\n", paid_by));
    }
    if let Some(policy) = txn.split_policy {
        output.push_str(&format!("  Split:       {}\n", policy));
    }
    if txn.requires_approval {
        match (&txn.approved_by, txn.approved_at) {
            (Some(by), Some(at)) => output.push_str(&format!(
                "  Resolved:    {} by {}\n",
                at.format("%Y-%m-%d %H:%M"),
                by
            )),
            (None, Some(at)) => {
                output.push_str(&format!("  Resolved:    {}\n", at.format("%Y-%m-%d %H:%M")))
            }
            _ => output.push_str("  Approval:    required\n"),
        }
    }

    if !txn.splits.is_empty() {
        output.push_str("\nSplits:\n");
        for split in &txn.splits {
            let name = names
                .get(&split.member_id)
                .copied()
                .map(str::to_string)
                .unwrap_or_else(|| split.member_id.short());
            output.push_str(&format!(
                "  {:<20} {:>14}\n",
                truncate(&name, 20),
                split.amount.format_with_symbol(symbol)
            ));
        }
    }

    output
}

/// Summary printed after `circle pay`
pub fn format_payment_receipt(
    receipt: &PaymentReceipt,
    members: &[Member],
    family_names: &HashMap<FamilyId, String>,
    symbol: &str,
) -> String {
    let money = |m: Money| m.format_with_symbol(symbol);
    let txn = &receipt.transaction;
    let mut output = String::new();

    if receipt.is_pending() {
        output.push_str(&format!(
            "Payment {} of {} is pending approval (threshold {}).\n",
            txn.id.short(),
            money(txn.amount),
            money(receipt.group.large_payment_threshold)
        ));
        output.push_str("No balances have changed yet.\n");
    } else {
        output.push_str(&format!(
            "Paid {} for {} ({}).\n",
            money(txn.amount),
            txn.title(),
            txn.id.short()
        ));
    }

    let names: HashMap<MemberId, &str> = members.iter().map(|m| (m.id, m.name.as_str())).collect();
    output.push_str(&format!("\n{:<20} {:>14}\n", "Member", "Share"));
    output.push_str(&format!("{:-<20} {:->14}\n", "", ""));
    for share in receipt.allocation.shares() {
        output.push_str(&format!(
            "{:<20} {:>14}\n",
            truncate(names.get(&share.member_id).copied().unwrap_or("?"), 20),
            money(share.amount)
        ));
    }

    output.push_str(&format!("\n{:<20} {:>14}\n", "Family", "Share"));
    output.push_str(&format!("{:-<20} {:->14}\n", "", ""));
    for (family_id, amount) in &receipt.per_family_share {
        let name = family_names
            .get(family_id)
            .cloned()
            .unwrap_or_else(|| family_id.short());
        output.push_str(&format!("{:<20} {:>14}\n", truncate(&name, 20), money(*amount)));
    }

    if !receipt.is_pending() {
        output.push_str(&format!(
            "\nWallet balance: {}\n",
            money(receipt.group.shared_wallet_balance)
        ));
    }
    for warning in &receipt.warnings {
        output.push_str(&format!(
            "Warning: {} is now at {}\n",
            warning.scope,
            money(warning.resulting_balance)
        ));
    }

    output
}
