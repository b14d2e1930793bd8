//! Family model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{FamilyId, GroupId};
use super::money::Money;

/// A household inside a group; owns members and carries its own balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    pub id: FamilyId,

    pub group_id: GroupId,

    pub name: String,

    /// Deposits made by this family minus its share of confirmed payments
    #[serde(default)]
    pub balance: Money,

    /// Cumulative deposits; only ever grows
    #[serde(default)]
    pub total_contribution: Money,

    pub created_at: DateTime<Utc>,
}

impl Family {
    pub fn new(group_id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id: FamilyId::new(),
            group_id,
            name: name.into(),
            balance: Money::zero(),
            total_contribution: Money::zero(),
            created_at: Utc::now(),
        }
    }

    /// A family in debit has spent more than it has put in
    pub fn is_in_debit(&self) -> bool {
        self.balance.is_negative()
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_family() {
        let group_id = GroupId::new();
        let family = Family::new(group_id, "Sharma");
        assert_eq!(family.group_id, group_id);
        assert!(family.balance.is_zero());
        assert!(!family.is_in_debit());
    }

    #[test]
    fn test_missing_aggregates_default_to_zero() {
        let json = format!(
            r#"{{"id":"{}","group_id":"{}","name":"Iyer","created_at":"2025-01-15T10:00:00Z"}}"#,
            uuid::Uuid::new_v4(),
            uuid::Uuid::new_v4()
        );
        let family: Family = serde_json::from_str(&json).unwrap();
        assert!(family.balance.is_zero());
        assert!(family.total_contribution.is_zero());
    }
}
