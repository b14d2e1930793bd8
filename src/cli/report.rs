//! Report and audit commands

use clap::Args;

use crate::audit::EntityType;
use crate::config::Settings;
use crate::display::format_group_report;
use crate::error::{CircleError, CircleResult};
use crate::services::{GroupService, ReportService};
use crate::storage::Storage;

#[derive(Args)]
pub struct AuditArgs {
    /// Number of entries to show
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
    /// Only entries for group, family, member or transaction
    #[arg(short, long)]
    pub entity: Option<String>,
}

pub fn handle_report(
    storage: &Storage,
    settings: &Settings,
    selected: Option<&str>,
) -> CircleResult<()> {
    let group = GroupService::new(storage).resolve(selected)?;
    let report = ReportService::new(storage).generate(group.id)?;
    let symbol = settings.symbol_for(&group.currency);
    print!("{}", format_group_report(&report, &symbol));
    Ok(())
}

pub fn handle_audit(storage: &Storage, args: AuditArgs) -> CircleResult<()> {
    let entity_type = args
        .entity
        .as_deref()
        .map(|e| {
            EntityType::parse(e).ok_or_else(|| {
                CircleError::Validation(format!(
                    "Invalid entity: '{}'. Use group, family, member or transaction",
                    e
                ))
            })
        })
        .transpose()?;

    let entries = storage.audit().read_recent(args.limit, entity_type)?;
    if entries.is_empty() {
        println!("No audit entries.");
        return Ok(());
    }
    for entry in entries {
        println!("{}", entry.format_human_readable());
    }
    Ok(())
}
