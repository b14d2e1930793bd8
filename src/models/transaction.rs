//! Transaction model
//!
//! Deposits into and payments out of the shared wallet. The financial facts
//! (amount, kind, splits) never change after creation; only the status moves,
//! and only out of `Pending`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{FamilyId, GroupId, MemberId, TransactionId};
use super::money::Money;
use crate::error::{CircleError, CircleResult};

/// Deposit into or payment out of the shared wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Payment,
}

impl TransactionKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "deposit" => Some(Self::Deposit),
            "payment" | "pay" => Some(Self::Payment),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deposit => write!(f, "deposit"),
            Self::Payment => write!(f, "payment"),
        }
    }
}

/// Approval state of a transaction
///
/// `Pending` is the only state with outgoing transitions. `Confirmed` and
/// `Declined` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Declined,
}

impl TransactionStatus {
    /// Pending -> Confirmed
    pub fn approve(self) -> CircleResult<Self> {
        match self {
            Self::Pending => Ok(Self::Confirmed),
            from => Err(CircleError::InvalidStateTransition {
                from,
                action: "approve",
            }),
        }
    }

    /// Pending -> Declined
    pub fn decline(self) -> CircleResult<Self> {
        match self {
            Self::Pending => Ok(Self::Declined),
            from => Err(CircleError::InvalidStateTransition {
                from,
                action: "decline",
            }),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Declined => write!(f, "declined"),
        }
    }
}

/// Who shares the cost of a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SplitPolicy {
    #[default]
    #[serde(alias = "all")]
    Everyone,
    #[serde(rename = "adults")]
    AdultsOnly,
    /// Teenagers and children
    #[serde(rename = "kids", alias = "children")]
    KidsOnly,
    /// An explicit member selection
    Custom,
}

impl SplitPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "everyone" | "all" => Some(Self::Everyone),
            "adults" | "adultsonly" | "adults-only" => Some(Self::AdultsOnly),
            "kids" | "children" | "kidsonly" | "kids-only" => Some(Self::KidsOnly),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

impl fmt::Display for SplitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Everyone => write!(f, "everyone"),
            Self::AdultsOnly => write!(f, "adults"),
            Self::KidsOnly => write!(f, "kids"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

/// Spending category for payments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Accommodation,
    Food,
    Transport,
    Activities,
    Drinks,
    Shopping,
    Utilities,
    Medical,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Self::Accommodation,
        Self::Food,
        Self::Transport,
        Self::Activities,
        Self::Drinks,
        Self::Shopping,
        Self::Utilities,
        Self::Medical,
        Self::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Accommodation => "Accommodation",
            Self::Food => "Food & Dining",
            Self::Transport => "Transport",
            Self::Activities => "Activities",
            Self::Drinks => "Drinks",
            Self::Shopping => "Shopping",
            Self::Utilities => "Utilities",
            Self::Medical => "Medical",
            Self::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let needle = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| {
            c.label().to_lowercase() == needle || format!("{:?}", c).to_lowercase() == needle
        })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One member's portion of a payment (a `transaction_splits` row)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSplit {
    pub member_id: MemberId,
    pub family_id: FamilyId,
    pub amount: Money,
}

/// A deposit or payment against a group's shared wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,

    pub group_id: GroupId,

    pub kind: TransactionKind,

    /// Always positive; direction comes from `kind`
    pub amount: Money,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,

    /// Identity of whoever submitted it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_by: Option<String>,

    /// Depositing family; None for group-level deposits and for payments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_id: Option<FamilyId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_policy: Option<SplitPolicy>,

    /// Participants, re-derived from the policy or chosen explicitly
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub split_among: Vec<MemberId>,

    /// Per-member allocation, fixed at creation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub splits: Vec<TransactionSplit>,

    pub status: TransactionStatus,

    #[serde(default)]
    pub requires_approval: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    fn new(group_id: GroupId, kind: TransactionKind, amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            group_id,
            kind,
            amount,
            description: String::new(),
            category: None,
            merchant_name: None,
            paid_by: None,
            family_id: None,
            split_policy: None,
            split_among: Vec::new(),
            splits: Vec::new(),
            status: TransactionStatus::Confirmed,
            requires_approval: false,
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// A confirmed deposit, optionally attributed to a family
    pub fn deposit(group_id: GroupId, family_id: Option<FamilyId>, amount: Money) -> Self {
        let mut txn = Self::new(group_id, TransactionKind::Deposit, amount);
        txn.family_id = family_id;
        txn
    }

    /// A payment; pending when it needs approval, confirmed otherwise
    pub fn payment(
        group_id: GroupId,
        amount: Money,
        split_policy: SplitPolicy,
        requires_approval: bool,
    ) -> Self {
        let mut txn = Self::new(group_id, TransactionKind::Payment, amount);
        txn.split_policy = Some(split_policy);
        txn.requires_approval = requires_approval;
        txn.status = if requires_approval {
            TransactionStatus::Pending
        } else {
            TransactionStatus::Confirmed
        };
        txn
    }

    pub fn is_deposit(&self) -> bool {
        self.kind == TransactionKind::Deposit
    }

    pub fn is_payment(&self) -> bool {
        self.kind == TransactionKind::Payment
    }

    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == TransactionStatus::Confirmed
    }

    /// Move out of `Pending` and stamp who did it
    pub fn transition(
        &mut self,
        status: TransactionStatus,
        actor: Option<String>,
        at: DateTime<Utc>,
    ) -> CircleResult<()> {
        let next = match status {
            TransactionStatus::Confirmed => self.status.approve()?,
            TransactionStatus::Declined => self.status.decline()?,
            TransactionStatus::Pending => {
                return Err(CircleError::InvalidStateTransition {
                    from: self.status,
                    action: "reopen",
                })
            }
        };
        self.status = next;
        self.approved_by = actor;
        self.approved_at = Some(at);
        self.updated_at = at;
        Ok(())
    }

    /// Sum of the stored per-member splits
    pub fn splits_total(&self) -> Money {
        self.splits.iter().map(|s| s.amount).sum()
    }

    pub fn validate(&self) -> CircleResult<()> {
        if !self.amount.is_positive() {
            return Err(CircleError::InvalidAmount(self.amount));
        }
        match self.kind {
            TransactionKind::Payment => {
                if self.splits.is_empty() {
                    return Err(CircleError::NoParticipants);
                }
                if self.splits_total() != self.amount {
                    return Err(CircleError::Validation(format!(
                        "Split totals ({}) do not match transaction amount ({})",
                        self.splits_total(),
                        self.amount
                    )));
                }
            }
            TransactionKind::Deposit => {
                if !self.splits.is_empty() {
                    return Err(CircleError::Validation(
                        "Deposits cannot carry member splits".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Label for listings: merchant, then description, then the kind
    pub fn title(&self) -> String {
        if let Some(merchant) = self.merchant_name.as_deref().filter(|m| !m.is_empty()) {
            return merchant.to_string();
        }
        if !self.description.is_empty() {
            return self.description.clone();
        }
        self.kind.to_string()
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} [{}]",
            self.created_at.format("%Y-%m-%d"),
            self.title(),
            self.amount,
            self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(amount: i64) -> TransactionSplit {
        TransactionSplit {
            member_id: MemberId::new(),
            family_id: FamilyId::new(),
            amount: Money::from_cents(amount),
        }
    }

    #[test]
    fn test_status_transition_table() {
        use TransactionStatus::*;
        assert_eq!(Pending.approve().unwrap(), Confirmed);
        assert_eq!(Pending.decline().unwrap(), Declined);
        for terminal in [Confirmed, Declined] {
            assert!(terminal.is_terminal());
            assert!(matches!(
                terminal.approve(),
                Err(CircleError::InvalidStateTransition { .. })
            ));
            assert!(matches!(
                terminal.decline(),
                Err(CircleError::InvalidStateTransition { .. })
            ));
        }
    }

    #[test]
    fn test_payment_initial_status() {
        let group = GroupId::new();
        let gated =
            Transaction::payment(group, Money::from_major(60_000), SplitPolicy::Everyone, true);
        assert_eq!(gated.status, TransactionStatus::Pending);
        let direct =
            Transaction::payment(group, Money::from_major(600), SplitPolicy::Everyone, false);
        assert_eq!(direct.status, TransactionStatus::Confirmed);
    }

    #[test]
    fn test_deposit_is_confirmed() {
        let txn = Transaction::deposit(GroupId::new(), None, Money::from_major(5000));
        assert!(txn.is_confirmed());
        assert!(txn.is_deposit());
        assert!(txn.validate().is_ok());
    }

    #[test]
    fn test_transition_stamps_approver() {
        let mut txn = Transaction::payment(
            GroupId::new(),
            Money::from_major(60_000),
            SplitPolicy::Everyone,
            true,
        );
        let at = Utc::now();
        txn.transition(TransactionStatus::Confirmed, Some("admin".into()), at)
            .unwrap();
        assert!(txn.is_confirmed());
        assert_eq!(txn.approved_by.as_deref(), Some("admin"));
        assert_eq!(txn.approved_at, Some(at));

        let again = txn.transition(TransactionStatus::Declined, None, Utc::now());
        assert!(again.is_err());
        assert!(txn.is_confirmed());
    }

    #[test]
    fn test_validate_payment_splits() {
        let mut txn = Transaction::payment(
            GroupId::new(),
            Money::from_cents(1000),
            SplitPolicy::Everyone,
            false,
        );
        assert!(matches!(txn.validate(), Err(CircleError::NoParticipants)));

        txn.splits = vec![split(600), split(300)];
        assert!(txn.validate().unwrap_err().is_validation());

        txn.splits.push(split(100));
        assert!(txn.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_positive_amount() {
        let txn = Transaction::deposit(GroupId::new(), None, Money::zero());
        assert!(matches!(txn.validate(), Err(CircleError::InvalidAmount(_))));
    }

    #[test]
    fn test_split_policy_aliases() {
        let policy: SplitPolicy = serde_json::from_str("\"children\"").unwrap();
        assert_eq!(policy, SplitPolicy::KidsOnly);
        let policy: SplitPolicy = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(policy, SplitPolicy::Everyone);
        assert_eq!(SplitPolicy::parse("adults"), Some(SplitPolicy::AdultsOnly));
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse("food"), Some(Category::Food));
        assert_eq!(Category::parse("Food & Dining"), Some(Category::Food));
        assert_eq!(Category::parse("spaceships"), None);
    }

    #[test]
    fn test_title_prefers_merchant() {
        let mut txn = Transaction::payment(
            GroupId::new(),
            Money::from_major(10),
            SplitPolicy::Everyone,
            false,
        );
        assert_eq!(txn.title(), "payment");
        txn.description = "Lunch".into();
        assert_eq!(txn.title(), "Lunch");
        txn.merchant_name = Some("Beach Shack".into());
        assert_eq!(txn.title(), "Beach Shack");
    }
}
