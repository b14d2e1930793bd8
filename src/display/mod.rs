//! Display formatting for terminal output
//!
//! Plain-text tables for groups, transactions and reports. Amounts are
//! rendered with the currency symbol from settings.

pub mod group;
pub mod report;
pub mod transaction;

pub use group::{format_family_rosters, format_group_details, format_group_list};
pub use report::format_group_report;
pub use transaction::{
    format_payment_receipt, format_transaction_details, format_transaction_register,
};
