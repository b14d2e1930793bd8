//! Transaction CLI commands

use clap::Subcommand;

use crate::config::Settings;
use crate::display::{format_transaction_details, format_transaction_register};
use crate::error::{CircleError, CircleResult};
use crate::models::{Category, SplitPolicy, TransactionKind, TransactionStatus};
use crate::services::{FamilyService, GroupService, TransactionFilter, TransactionService};
use crate::storage::Storage;

#[derive(Subcommand)]
pub enum TransactionCommands {
    /// List the group's transactions, newest first
    List {
        /// deposit or payment
        #[arg(short, long)]
        kind: Option<String>,
        /// pending, confirmed or declined
        #[arg(short, long)]
        status: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        /// everyone, adults, kids or custom
        #[arg(long)]
        split: Option<String>,
        /// Text to look for in the description or merchant
        #[arg(long)]
        search: Option<String>,
        #[arg(short, long, default_value = "20")]
        limit: usize,
        #[arg(long)]
        oldest_first: bool,
    },
    /// Show one transaction with its splits
    Show {
        /// Transaction ID or short form
        transaction: String,
    },
    /// Payments waiting for approval
    Pending,
}

pub fn handle_transaction_command(
    storage: &Storage,
    settings: &Settings,
    selected: Option<&str>,
    cmd: TransactionCommands,
) -> CircleResult<()> {
    let group = GroupService::new(storage).resolve(selected)?;
    let service = TransactionService::new(storage);
    let symbol = settings.symbol_for(&group.currency);
    let symbol = symbol.as_str();

    match cmd {
        TransactionCommands::List {
            kind,
            status,
            category,
            split,
            search,
            limit,
            oldest_first,
        } => {
            let mut filter = TransactionFilter::new().limit(limit);
            if let Some(kind) = kind {
                filter = filter.kind(TransactionKind::parse(&kind).ok_or_else(|| {
                    CircleError::Validation(format!(
                        "Invalid kind: '{}'. Use deposit or payment",
                        kind
                    ))
                })?);
            }
            if let Some(status) = status {
                filter = filter.status(TransactionStatus::parse(&status).ok_or_else(|| {
                    CircleError::Validation(format!(
                        "Invalid status: '{}'. Use pending, confirmed or declined",
                        status
                    ))
                })?);
            }
            if let Some(category) = category {
                filter = filter.category(Category::parse(&category).ok_or_else(|| {
                    CircleError::Validation(format!("Unknown category: '{}'", category))
                })?);
            }
            if let Some(split) = split {
                filter = filter.split_policy(SplitPolicy::parse(&split).ok_or_else(|| {
                    CircleError::Validation(format!(
                        "Invalid split: '{}'. Use everyone, adults, kids or custom",
                        split
                    ))
                })?);
            }
            if let Some(search) = search {
                filter = filter.search(search);
            }
            if oldest_first {
                filter = filter.oldest_first();
            }

            let transactions = service.list(group.id, &filter)?;
            print!("{}", format_transaction_register(&transactions, symbol));
        }

        TransactionCommands::Show { transaction } => {
            let txn = service.find(group.id, &transaction)?;
            let members = FamilyService::new(storage).members(group.id)?;
            print!("{}", format_transaction_details(&txn, &members, symbol));
        }

        TransactionCommands::Pending => {
            let pending = service.pending(group.id)?;
            if pending.is_empty() {
                println!("No payments awaiting approval.");
            } else {
                print!("{}", format_transaction_register(&pending, symbol));
                println!();
                println!(
                    "Approve with 'circle approve <ID>' or decline with 'circle decline <ID>'."
                );
            }
        }
    }

    Ok(())
}
