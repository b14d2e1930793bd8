//! Service layer for Circle Wallet
//!
//! Services sit between the CLI and the store: they validate input, run the
//! engine, persist its results through [`crate::storage::WalletStore`], and
//! write the audit trail.

pub mod family;
pub mod group;
pub mod report;
pub mod transaction;
pub mod wallet;

pub use family::{FamilyRoster, FamilyService, NewMember};
pub use group::{GroupService, NewGroup};
pub use report::{GroupReport, ReportService};
pub use transaction::{TransactionFilter, TransactionService};
pub use wallet::{DepositReceipt, PaymentReceipt, Resolution, WalletService};
