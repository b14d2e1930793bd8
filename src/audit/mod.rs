//! Audit logging for Circle Wallet
//!
//! Every group, family, member and transaction creation is appended to
//! `audit.log` as one JSON line, as is every group edit and transaction
//! status change, with before/after snapshots.
//!
//! ```rust,ignore
//! let logger = AuditLogger::new(paths.audit_log());
//! let entry = AuditEntry::create(
//!     EntityType::Group,
//!     group.id.to_string(),
//!     Some(group.name.clone()),
//!     &group,
//! );
//! logger.log(&entry)?;
//! ```

mod entry;
mod logger;

pub use entry::{summarize_changes, AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
