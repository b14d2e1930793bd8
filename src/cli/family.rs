//! Family and member CLI commands

use clap::Subcommand;

use crate::config::Settings;
use crate::display::format_family_rosters;
use crate::error::{CircleError, CircleResult};
use crate::models::MemberType;
use crate::services::{FamilyService, GroupService, NewMember};
use crate::storage::Storage;

#[derive(Subcommand)]
pub enum FamilyCommands {
    /// Add a family to the group
    Add {
        /// Family name
        name: String,
    },
    /// List families with members and balances
    List,
}

#[derive(Subcommand)]
pub enum MemberCommands {
    /// Add a member to a family
    Add {
        /// Family name or ID
        family: String,
        /// Member name
        name: String,
        /// adult, teenager or child
        #[arg(short = 't', long = "type", default_value = "adult")]
        member_type: String,
        #[arg(short, long)]
        age: Option<u8>,
        /// Share ratio in (0, 1]; defaults by type (1.0, 0.8, 0.5)
        #[arg(short, long)]
        ratio: Option<f64>,
    },
}

pub fn handle_family_command(
    storage: &Storage,
    settings: &Settings,
    selected: Option<&str>,
    cmd: FamilyCommands,
) -> CircleResult<()> {
    let group = GroupService::new(storage).resolve(selected)?;
    let service = FamilyService::new(storage);

    match cmd {
        FamilyCommands::Add { name } => {
            let family = service.add_family(group.id, &name)?;
            println!("Added family '{}' to {}", family.name, group.name);
            println!("  ID: {}", family.id);
        }

        FamilyCommands::List => {
            let rosters = service.rosters(group.id)?;
            let symbol = settings.symbol_for(&group.currency);
            print!("{}", format_family_rosters(&rosters, &symbol));
        }
    }

    Ok(())
}

pub fn handle_member_command(
    storage: &Storage,
    selected: Option<&str>,
    cmd: MemberCommands,
) -> CircleResult<()> {
    let group = GroupService::new(storage).resolve(selected)?;
    let service = FamilyService::new(storage);

    match cmd {
        MemberCommands::Add {
            family,
            name,
            member_type,
            age,
            ratio,
        } => {
            let member_type = MemberType::parse(&member_type).ok_or_else(|| {
                CircleError::Validation(format!(
                    "Invalid member type: '{}'. Valid types: adult, teenager, child",
                    member_type
                ))
            })?;
            let family = service.find_family(group.id, &family)?;

            let member = service.add_member(
                family.id,
                NewMember {
                    name,
                    member_type,
                    age,
                    share_ratio: ratio,
                },
            )?;
            println!(
                "Added {} to {} as {} (share {})",
                member.name, family.name, member.member_type, member.share_ratio
            );
            println!("  ID: {}", member.id);
        }
    }

    Ok(())
}
