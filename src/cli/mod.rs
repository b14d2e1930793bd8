//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod config;
pub mod family;
pub mod group;
pub mod report;
pub mod transaction;
pub mod wallet;

pub use config::{handle_config_command, ConfigCommands};
pub use family::{handle_family_command, handle_member_command, FamilyCommands, MemberCommands};
pub use group::{handle_group_command, GroupCommands};
pub use report::{handle_audit, handle_report, AuditArgs};
pub use transaction::{handle_transaction_command, TransactionCommands};
pub use wallet::{
    handle_approve, handle_decline, handle_deposit, handle_pay, DepositArgs, PayArgs, ResolveArgs,
};

use crate::error::{CircleError, CircleResult};
use crate::models::Money;

/// Parse a user-typed amount
pub(crate) fn parse_amount(input: &str) -> CircleResult<Money> {
    Money::parse(input).map_err(|e| {
        CircleError::Validation(format!(
            "Invalid amount '{}'. Use a format like '2500' or '2500.50'. Error: {}",
            input, e
        ))
    })
}
