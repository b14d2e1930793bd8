//! Deposit, payment and approval commands

use std::collections::HashMap;

use clap::Args;

use super::parse_amount;
use crate::config::Settings;
use crate::display::format_payment_receipt;
use crate::engine::{PaymentRequest, TransactionDetails};
use crate::error::{CircleError, CircleResult};
use crate::models::{Category, SplitPolicy};
use crate::services::{FamilyService, GroupService, Resolution, TransactionService, WalletService};
use crate::storage::Storage;

#[derive(Args)]
pub struct DepositArgs {
    /// Amount (e.g. "25000" or "25000.50")
    pub amount: String,
    /// Depositing family; omit for a group-level top-up
    #[arg(short, long)]
    pub family: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    /// Who made the deposit
    #[arg(long, env = "CIRCLE_WALLET_USER")]
    pub by: Option<String>,
}

#[derive(Args)]
pub struct PayArgs {
    /// Amount (e.g. "1800")
    pub amount: String,
    /// everyone, adults or kids; ignored when --member is given
    #[arg(short, long, default_value = "everyone")]
    pub split: String,
    /// Split among these members only (name or ID, repeatable)
    #[arg(short, long = "member")]
    pub members: Vec<String>,
    #[arg(short, long)]
    pub category: Option<String>,
    #[arg(long)]
    pub merchant: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    /// Who paid
    #[arg(long, env = "CIRCLE_WALLET_USER")]
    pub paid_by: Option<String>,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Transaction ID or its short form (txn-1a2b3c4d)
    pub transaction: String,
    /// Admin making the decision
    #[arg(long, env = "CIRCLE_WALLET_USER")]
    pub by: Option<String>,
}

pub fn handle_deposit(
    storage: &Storage,
    settings: &Settings,
    selected: Option<&str>,
    args: DepositArgs,
) -> CircleResult<()> {
    let group = GroupService::new(storage).resolve(selected)?;
    let amount = parse_amount(&args.amount)?;
    let family = args
        .family
        .as_deref()
        .map(|f| FamilyService::new(storage).find_family(group.id, f))
        .transpose()?;

    let details = TransactionDetails {
        description: args.description.unwrap_or_default(),
        paid_by: args.by,
        ..Default::default()
    };
    let receipt = WalletService::new(storage, settings.balance_policy).deposit(
        group.id,
        family.as_ref().map(|f| f.id),
        amount,
        details,
    )?;

    let symbol = settings.symbol_for(&group.currency);
    match &receipt.family {
        Some(family) => println!(
            "Deposited {} from {} ({})",
            amount.format_with_symbol(&symbol),
            family.name,
            receipt.transaction.id.short()
        ),
        None => println!(
            "Deposited {} ({})",
            amount.format_with_symbol(&symbol),
            receipt.transaction.id.short()
        ),
    }
    println!(
        "Wallet balance: {}",
        receipt.group.shared_wallet_balance.format_with_symbol(&symbol)
    );

    Ok(())
}

pub fn handle_pay(
    storage: &Storage,
    settings: &Settings,
    selected: Option<&str>,
    args: PayArgs,
) -> CircleResult<()> {
    let group = GroupService::new(storage).resolve(selected)?;
    let families = FamilyService::new(storage);
    let amount = parse_amount(&args.amount)?;

    let mut request = if args.members.is_empty() {
        let policy = SplitPolicy::parse(&args.split)
            .filter(|p| *p != SplitPolicy::Custom)
            .ok_or_else(|| {
                CircleError::Validation(format!(
                    "Invalid split: '{}'. Use everyone, adults or kids, \
                     or pick members with --member",
                    args.split
                ))
            })?;
        PaymentRequest::new(amount, policy)
    } else {
        let ids = args
            .members
            .iter()
            .map(|m| families.find_member(group.id, m).map(|member| member.id))
            .collect::<CircleResult<Vec<_>>>()?;
        PaymentRequest::custom(amount, ids)
    };

    let category = args
        .category
        .as_deref()
        .map(|c| {
            Category::parse(c)
                .ok_or_else(|| CircleError::Validation(format!("Unknown category: '{}'", c)))
        })
        .transpose()?;
    request = request.with_details(TransactionDetails {
        description: args.description.unwrap_or_default(),
        category,
        merchant_name: args.merchant,
        paid_by: args.paid_by,
    });

    let receipt = WalletService::new(storage, settings.balance_policy).pay(group.id, request)?;

    let members = families.members(group.id)?;
    let family_names: HashMap<_, _> = families
        .list(group.id)?
        .into_iter()
        .map(|f| (f.id, f.name))
        .collect();
    let symbol = settings.symbol_for(&group.currency);
    print!(
        "{}",
        format_payment_receipt(&receipt, &members, &family_names, &symbol)
    );

    Ok(())
}

pub fn handle_approve(
    storage: &Storage,
    settings: &Settings,
    selected: Option<&str>,
    args: ResolveArgs,
) -> CircleResult<()> {
    let group = GroupService::new(storage).resolve(selected)?;
    let txn = TransactionService::new(storage).find(group.id, &args.transaction)?;
    let resolution =
        WalletService::new(storage, settings.balance_policy).approve(txn.id, args.by)?;

    print_resolution("Approved", &resolution, &settings.symbol_for(&group.currency));
    Ok(())
}

pub fn handle_decline(
    storage: &Storage,
    settings: &Settings,
    selected: Option<&str>,
    args: ResolveArgs,
) -> CircleResult<()> {
    let group = GroupService::new(storage).resolve(selected)?;
    let txn = TransactionService::new(storage).find(group.id, &args.transaction)?;
    let resolution =
        WalletService::new(storage, settings.balance_policy).decline(txn.id, args.by)?;

    print_resolution("Declined", &resolution, &settings.symbol_for(&group.currency));
    Ok(())
}

fn print_resolution(verb: &str, resolution: &Resolution, symbol: &str) {
    let txn = &resolution.transaction;
    println!(
        "{} {} ({}) for {}",
        verb,
        txn.title(),
        txn.id.short(),
        txn.amount.format_with_symbol(symbol)
    );
    println!(
        "Wallet balance: {}",
        resolution.group.shared_wallet_balance.format_with_symbol(symbol)
    );
    for warning in &resolution.warnings {
        println!(
            "Warning: {} is now at {}",
            warning.scope,
            warning.resulting_balance.format_with_symbol(symbol)
        );
    }
}
