//! Group model
//!
//! A group is one trip or circle with a single shared prepaid wallet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::GroupId;
use super::money::Money;

/// A travelling group and its shared wallet aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// ISO currency code, e.g. "INR"
    pub currency: String,

    /// Confirmed deposits minus confirmed payments
    #[serde(default)]
    pub shared_wallet_balance: Money,

    /// Sum of confirmed payments
    #[serde(default)]
    pub total_spent: Money,

    /// Payments at or above this amount need admin approval (when enabled)
    pub large_payment_threshold: Money,

    #[serde(default)]
    pub require_approval_above_threshold: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Group {
    pub fn new(
        name: impl Into<String>,
        currency: impl Into<String>,
        large_payment_threshold: Money,
        require_approval_above_threshold: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: GroupId::new(),
            name: name.into(),
            description: String::new(),
            currency: currency.into(),
            shared_wallet_balance: Money::zero(),
            total_spent: Money::zero(),
            large_payment_threshold,
            require_approval_above_threshold,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether a payment of `amount` must wait for an admin
    pub fn requires_approval(&self, amount: Money) -> bool {
        self.require_approval_above_threshold && amount >= self.large_payment_threshold
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Group name cannot be empty".into());
        }
        if self.currency.trim().is_empty() {
            return Err("Group currency cannot be empty".into());
        }
        if self.large_payment_threshold.is_negative() {
            return Err("Large payment threshold cannot be negative".into());
        }
        Ok(())
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_group_starts_empty() {
        let group = Group::new("Goa Trip", "INR", Money::from_major(50_000), true);
        assert!(group.shared_wallet_balance.is_zero());
        assert!(group.total_spent.is_zero());
        assert!(group.validate().is_ok());
    }

    #[test]
    fn test_requires_approval_at_threshold() {
        let group = Group::new("Goa Trip", "INR", Money::from_major(50_000), true);
        assert!(!group.requires_approval(Money::from_major(49_999)));
        assert!(group.requires_approval(Money::from_major(50_000)));
        assert!(group.requires_approval(Money::from_major(60_000)));
    }

    #[test]
    fn test_requires_approval_disabled() {
        let group = Group::new("Goa Trip", "INR", Money::from_major(50_000), false);
        assert!(!group.requires_approval(Money::from_major(60_000)));
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let group = Group::new("  ", "INR", Money::zero(), false);
        assert!(group.validate().is_err());
    }
}
