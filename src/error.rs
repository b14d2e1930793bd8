//! Error types for Circle Wallet
//!
//! Every rejected operation surfaces as a [`CircleError`]. The first four
//! variants are the split & balance engine's own taxonomy; the rest come from
//! configuration, storage and input validation.

use thiserror::Error;

use crate::models::{Money, TransactionStatus};

/// The main error type for Circle Wallet operations
#[derive(Error, Debug)]
pub enum CircleError {
    /// The split policy resolved to nobody, or to members whose share ratios are all zero
    #[error("No participants: the split has no members with a positive share ratio")]
    NoParticipants,

    /// Deposits and payments must be strictly positive
    #[error("Invalid amount: {0} (amounts must be greater than zero)")]
    InvalidAmount(Money),

    /// Approve/decline called on a transaction that is no longer pending
    #[error("Cannot {action} a transaction that is {from}")]
    InvalidStateTransition {
        from: TransactionStatus,
        action: &'static str,
    },

    /// A payment would drive a wallet or family balance below zero
    #[error("Insufficient balance in {scope}: need {needed}, have {available}")]
    InsufficientBalance {
        scope: String,
        needed: Money,
        available: Money,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Validation errors for input and records
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },
}

impl CircleError {
    pub fn group_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Group",
            identifier: identifier.into(),
        }
    }

    pub fn family_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Family",
            identifier: identifier.into(),
        }
    }

    pub fn member_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Member",
            identifier: identifier.into(),
        }
    }

    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// An aggregate update that would leave the representable money range
    pub fn overflow(scope: impl std::fmt::Display, delta: Money) -> Self {
        Self::Validation(format!(
            "Amount out of range: applying {} to {} would overflow",
            delta, scope
        ))
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// True for the engine's rejections (as opposed to I/O or config failures)
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::NoParticipants
                | Self::InvalidAmount(_)
                | Self::InvalidStateTransition { .. }
                | Self::InsufficientBalance { .. }
        )
    }
}

impl From<std::io::Error> for CircleError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CircleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for Circle Wallet operations
pub type CircleResult<T> = Result<T, CircleError>;
