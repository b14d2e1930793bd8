//! Group CLI commands

use clap::Subcommand;

use super::parse_amount;
use crate::config::Settings;
use crate::display::{format_group_details, format_group_list};
use crate::error::CircleResult;
use crate::services::{FamilyService, GroupService, NewGroup};
use crate::storage::Storage;

#[derive(Subcommand)]
pub enum GroupCommands {
    /// Create a new group with an empty shared wallet
    Create {
        /// Group name
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        /// ISO currency code (defaults to the configured one)
        #[arg(short, long)]
        currency: Option<String>,
        /// Payments at or above this need approval (e.g. "50000")
        #[arg(short, long)]
        threshold: Option<String>,
        /// Never hold payments for approval
        #[arg(long)]
        no_approval: bool,
    },
    /// List all groups
    List,
    /// Show a group with its families and members
    Show {
        /// Group name or ID (defaults to --group, or the only group)
        #[arg(value_name = "GROUP")]
        name: Option<String>,
    },
    /// Rename a group or change its description
    Edit {
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New description ("" clears it)
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Change the approval threshold or switch approval on/off
    Settings {
        #[arg(short, long)]
        threshold: Option<String>,
        /// "true" or "false"
        #[arg(long)]
        require_approval: Option<bool>,
    },
}

pub fn handle_group_command(
    storage: &Storage,
    settings: &Settings,
    selected: Option<&str>,
    cmd: GroupCommands,
) -> CircleResult<()> {
    let service = GroupService::new(storage);

    match cmd {
        GroupCommands::Create {
            name,
            description,
            currency,
            threshold,
            no_approval,
        } => {
            let threshold = threshold.as_deref().map(parse_amount).transpose()?;
            let group = service.create(
                NewGroup {
                    name,
                    description,
                    currency,
                    large_payment_threshold: threshold,
                    require_approval: no_approval.then_some(false),
                },
                settings,
            )?;

            let symbol = settings.symbol_for(&group.currency);
            println!("Created group: {}", group.name);
            println!("  Currency: {}", group.currency);
            if group.require_approval_above_threshold {
                println!(
                    "  Approval: payments of {} or more",
                    group.large_payment_threshold.format_with_symbol(&symbol)
                );
            } else {
                println!("  Approval: not required");
            }
            println!("  ID: {}", group.id);
        }

        GroupCommands::List => {
            let groups = service.list()?;
            print!("{}", format_group_list(&groups, |code| settings.symbol_for(code)));
        }

        GroupCommands::Show { name } => {
            let group = service.resolve(name.as_deref().or(selected))?;
            let rosters = FamilyService::new(storage).rosters(group.id)?;
            let symbol = settings.symbol_for(&group.currency);
            print!("{}", format_group_details(&group, &rosters, &symbol));
        }

        GroupCommands::Edit { name, description } => {
            let group = service.resolve(selected)?;
            if name.is_none() && description.is_none() {
                println!("No changes specified. Use --name or --description.");
                return Ok(());
            }

            let updated = service.update_details(group.id, name, description)?;
            println!("Updated group: {}", updated.name);
            if !updated.description.is_empty() {
                println!("  Description: {}", updated.description);
            }
        }

        GroupCommands::Settings {
            threshold,
            require_approval,
        } => {
            let group = service.resolve(selected)?;
            if threshold.is_none() && require_approval.is_none() {
                println!("No changes specified. Use --threshold or --require-approval.");
                return Ok(());
            }

            let threshold = threshold.as_deref().map(parse_amount).transpose()?;
            let updated = service.update_settings(group.id, threshold, require_approval)?;
            let symbol = settings.symbol_for(&updated.currency);
            println!("Updated group: {}", updated.name);
            println!(
                "  Threshold: {}  Approval: {}",
                updated.large_payment_threshold.format_with_symbol(&symbol),
                if updated.require_approval_above_threshold {
                    "on"
                } else {
                    "off"
                }
            );
        }
    }

    Ok(())
}
