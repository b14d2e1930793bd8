//! Wallet and family balance bookkeeping
//!
//! These functions decide what a deposit, payment, approval or decline does
//! to the group and family aggregates. They never touch storage. Each
//! outcome carries the updated records for display plus the list of
//! [`BalanceMutation`]s the caller must push through the store's atomic
//! increment primitives.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::allocation::{allocate, Allocation};
use super::participants::select_participants;
use crate::error::{CircleError, CircleResult};
use crate::models::{
    Category, Family, FamilyId, Group, GroupId, Member, MemberId, Money, SplitPolicy, Transaction,
    TransactionKind, TransactionStatus,
};

/// What to do when a payment would push a balance below zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BalancePolicy {
    /// Let it through and report a [`BalanceWarning`]
    #[default]
    AllowNegative,
    /// Fail with [`CircleError::InsufficientBalance`] before anything changes
    RejectNegative,
}

impl BalancePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "allow_negative" | "allow" | "warn" => Some(Self::AllowNegative),
            "reject_negative" | "reject" | "strict" => Some(Self::RejectNegative),
            _ => None,
        }
    }
}

impl std::fmt::Display for BalancePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AllowNegative => write!(f, "allow_negative"),
            Self::RejectNegative => write!(f, "reject_negative"),
        }
    }
}

/// A single atomic delta against a stored aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum BalanceMutation {
    GroupBalance { group_id: GroupId, delta: Money },
    GroupSpent { group_id: GroupId, delta: Money },
    FamilyBalance { family_id: FamilyId, delta: Money },
    FamilyContribution { family_id: FamilyId, delta: Money },
}

impl BalanceMutation {
    /// The same target with the delta negated; undoes `self`
    pub fn reversed(&self) -> Self {
        match *self {
            Self::GroupBalance { group_id, delta } => Self::GroupBalance {
                group_id,
                delta: -delta,
            },
            Self::GroupSpent { group_id, delta } => Self::GroupSpent {
                group_id,
                delta: -delta,
            },
            Self::FamilyBalance { family_id, delta } => Self::FamilyBalance {
                family_id,
                delta: -delta,
            },
            Self::FamilyContribution { family_id, delta } => Self::FamilyContribution {
                family_id,
                delta: -delta,
            },
        }
    }

    /// Add the delta to `group` if it targets it; overflow is an error, never a wrap
    pub fn apply_to_group(&self, group: &mut Group) -> CircleResult<()> {
        match *self {
            Self::GroupBalance { group_id, delta } if group_id == group.id => {
                group.shared_wallet_balance = group
                    .shared_wallet_balance
                    .checked_add(delta)
                    .ok_or_else(|| CircleError::overflow("the group wallet", delta))?;
            }
            Self::GroupSpent { group_id, delta } if group_id == group.id => {
                group.total_spent = group
                    .total_spent
                    .checked_add(delta)
                    .ok_or_else(|| CircleError::overflow("the group's total spent", delta))?;
            }
            _ => {}
        }
        Ok(())
    }

    pub fn apply_to_family(&self, family: &mut Family) -> CircleResult<()> {
        match *self {
            Self::FamilyBalance { family_id, delta } if family_id == family.id => {
                family.balance = family.balance.checked_add(delta).ok_or_else(|| {
                    CircleError::overflow(format!("family '{}'", family.name), delta)
                })?;
            }
            Self::FamilyContribution { family_id, delta } if family_id == family.id => {
                family.total_contribution =
                    family.total_contribution.checked_add(delta).ok_or_else(|| {
                        CircleError::overflow(
                            format!("family '{}' contributions", family.name),
                            delta,
                        )
                    })?;
            }
            _ => {}
        }
        Ok(())
    }
}

/// A balance that went negative under [`BalancePolicy::AllowNegative`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceWarning {
    pub scope: String,
    pub resulting_balance: Money,
}

/// Descriptive fields copied onto the created transaction
#[derive(Debug, Clone, Default)]
pub struct TransactionDetails {
    pub description: String,
    pub category: Option<Category>,
    pub merchant_name: Option<String>,
    pub paid_by: Option<String>,
}

impl TransactionDetails {
    fn stamp(self, txn: &mut Transaction) {
        txn.description = self.description;
        txn.category = self.category;
        txn.merchant_name = self.merchant_name;
        txn.paid_by = self.paid_by;
    }
}

#[derive(Debug, Clone)]
pub struct DepositOutcome {
    pub group: Group,
    pub family: Option<Family>,
    pub transaction: Transaction,
    pub mutations: Vec<BalanceMutation>,
}

/// Credit the wallet, and the depositing family if there is one
///
/// Deposits are never gated by approval, so the transaction is created
/// `Confirmed` and the mutations apply immediately.
pub fn apply_deposit(
    group: &Group,
    family: Option<&Family>,
    amount: Money,
    details: TransactionDetails,
) -> CircleResult<DepositOutcome> {
    if !amount.is_positive() {
        return Err(CircleError::InvalidAmount(amount));
    }
    if let Some(family) = family {
        if family.group_id != group.id {
            return Err(CircleError::Validation(format!(
                "Family '{}' does not belong to group '{}'",
                family.name, group.name
            )));
        }
    }

    let mut transaction = Transaction::deposit(group.id, family.map(|f| f.id), amount);
    details.stamp(&mut transaction);

    let mutations = confirmed_mutations(&transaction);
    let mut group = group.clone();
    let mut family = family.cloned();
    for mutation in &mutations {
        mutation.apply_to_group(&mut group)?;
        if let Some(family) = family.as_mut() {
            mutation.apply_to_family(family)?;
        }
    }

    Ok(DepositOutcome {
        group,
        family,
        transaction,
        mutations,
    })
}

/// Input for [`apply_payment`]
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub amount: Money,
    pub policy: SplitPolicy,
    /// Only read for [`SplitPolicy::Custom`]
    pub custom_selection: BTreeSet<MemberId>,
    pub details: TransactionDetails,
}

impl PaymentRequest {
    pub fn new(amount: Money, policy: SplitPolicy) -> Self {
        Self {
            amount,
            policy,
            custom_selection: BTreeSet::new(),
            details: TransactionDetails::default(),
        }
    }

    pub fn custom(amount: Money, selection: impl IntoIterator<Item = MemberId>) -> Self {
        Self {
            custom_selection: selection.into_iter().collect(),
            ..Self::new(amount, SplitPolicy::Custom)
        }
    }

    pub fn with_details(mut self, details: TransactionDetails) -> Self {
        self.details = details;
        self
    }
}

#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    pub group: Group,
    /// Every family passed in, with confirmed shares already deducted
    pub families: Vec<Family>,
    pub transaction: Transaction,
    pub allocation: Allocation,
    /// Family id -> that family's total share; sums to the payment amount
    pub per_family_share: BTreeMap<FamilyId, Money>,
    /// Empty while the payment waits for approval
    pub mutations: Vec<BalanceMutation>,
    pub warnings: Vec<BalanceWarning>,
}

/// Pay a merchant from the shared wallet and split the cost
///
/// `members` may include members of other groups; only those belonging to
/// one of `families` are considered. Every guard (amount, participants,
/// balance policy) runs before any mutation is produced.
///
/// Payments at or above the group's threshold, with approval enabled, come
/// back `Pending` with no mutations; [`approve_transaction`] applies them
/// later from the stored splits.
pub fn apply_payment(
    group: &Group,
    families: &[Family],
    members: &[Member],
    request: PaymentRequest,
    balance_policy: BalancePolicy,
) -> CircleResult<PaymentOutcome> {
    let amount = request.amount;
    if !amount.is_positive() {
        return Err(CircleError::InvalidAmount(amount));
    }

    let group_families: BTreeSet<FamilyId> = families
        .iter()
        .filter(|f| f.group_id == group.id)
        .map(|f| f.id)
        .collect();
    let roster: Vec<Member> = members
        .iter()
        .filter(|m| group_families.contains(&m.family_id))
        .cloned()
        .collect();

    let participants = select_participants(request.policy, &roster, &request.custom_selection);
    let allocation = allocate(amount, &participants)?;
    let per_family_share = allocation.per_family();

    let requires_approval = group.requires_approval(amount);
    let mut transaction = Transaction::payment(group.id, amount, request.policy, requires_approval);
    transaction.split_among = participants.iter().map(|m| m.id).collect();
    transaction.splits = allocation.to_splits();
    request.details.stamp(&mut transaction);
    transaction.validate()?;

    let (mutations, warnings) = if requires_approval {
        (Vec::new(), Vec::new())
    } else {
        let mutations = confirmed_mutations(&transaction);
        let warnings = check_balances(group, families, &mutations, balance_policy)?;
        (mutations, warnings)
    };

    let (group, families) = project(group, families, &mutations)?;

    Ok(PaymentOutcome {
        group,
        families,
        transaction,
        allocation,
        per_family_share,
        mutations,
        warnings,
    })
}

#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub group: Group,
    pub families: Vec<Family>,
    pub transaction: Transaction,
    pub mutations: Vec<BalanceMutation>,
    pub warnings: Vec<BalanceWarning>,
}

/// Pending -> Confirmed, releasing the deferred balance mutation
///
/// The mutation is rebuilt from the splits stored on the transaction, not
/// from today's member list.
///
/// # Errors
///
/// [`CircleError::InvalidStateTransition`] unless the transaction is pending;
/// [`CircleError::InsufficientBalance`] under [`BalancePolicy::RejectNegative`].
pub fn approve_transaction(
    transaction: &Transaction,
    group: &Group,
    families: &[Family],
    approver: Option<String>,
    balance_policy: BalancePolicy,
) -> CircleResult<ApprovalOutcome> {
    if transaction.group_id != group.id {
        return Err(CircleError::Validation(format!(
            "Transaction {} does not belong to group '{}'",
            transaction.id, group.name
        )));
    }

    let mut approved = transaction.clone();
    approved.transition(TransactionStatus::Confirmed, approver, Utc::now())?;

    let mutations = confirmed_mutations(&approved);
    let warnings = check_balances(group, families, &mutations, balance_policy)?;
    let (group, families) = project(group, families, &mutations)?;

    Ok(ApprovalOutcome {
        group,
        families,
        transaction: approved,
        mutations,
        warnings,
    })
}

/// Pending -> Declined; a declined transaction never touches a balance
pub fn decline_transaction(
    transaction: &Transaction,
    approver: Option<String>,
) -> CircleResult<Transaction> {
    let mut declined = transaction.clone();
    declined.transition(TransactionStatus::Declined, approver, Utc::now())?;
    Ok(declined)
}

/// The aggregate deltas a transaction causes once it is confirmed
pub fn confirmed_mutations(transaction: &Transaction) -> Vec<BalanceMutation> {
    let group_id = transaction.group_id;
    let amount = transaction.amount;
    match transaction.kind {
        TransactionKind::Deposit => {
            let mut mutations = vec![BalanceMutation::GroupBalance {
                group_id,
                delta: amount,
            }];
            if let Some(family_id) = transaction.family_id {
                mutations.push(BalanceMutation::FamilyBalance {
                    family_id,
                    delta: amount,
                });
                mutations.push(BalanceMutation::FamilyContribution {
                    family_id,
                    delta: amount,
                });
            }
            mutations
        }
        TransactionKind::Payment => {
            let mut per_family: BTreeMap<FamilyId, Money> = BTreeMap::new();
            for split in &transaction.splits {
                *per_family.entry(split.family_id).or_insert_with(Money::zero) += split.amount;
            }

            let mut mutations = vec![
                BalanceMutation::GroupBalance {
                    group_id,
                    delta: -amount,
                },
                BalanceMutation::GroupSpent {
                    group_id,
                    delta: amount,
                },
            ];
            mutations.extend(
                per_family
                    .into_iter()
                    .filter(|(_, share)| !share.is_zero())
                    .map(|(family_id, share)| BalanceMutation::FamilyBalance {
                        family_id,
                        delta: -share,
                    }),
            );
            mutations
        }
    }
}

/// Wallet balance implied by the ledger: confirmed deposits minus confirmed payments
pub fn ledger_balance<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Money {
    transactions
        .into_iter()
        .filter(|t| t.is_confirmed())
        .map(|t| match t.kind {
            TransactionKind::Deposit => t.amount,
            TransactionKind::Payment => -t.amount,
        })
        .fold(Money::zero(), Money::saturating_add)
}

fn check_balances(
    group: &Group,
    families: &[Family],
    mutations: &[BalanceMutation],
    policy: BalancePolicy,
) -> CircleResult<Vec<BalanceWarning>> {
    let mut warnings = Vec::new();
    let mut flag = |scope: String, available: Money, delta: Money| -> CircleResult<()> {
        let resulting = available
            .checked_add(delta)
            .ok_or_else(|| CircleError::overflow(&scope, delta))?;
        if !delta.is_negative() || !resulting.is_negative() {
            return Ok(());
        }
        match policy {
            BalancePolicy::RejectNegative => Err(CircleError::InsufficientBalance {
                scope,
                needed: -delta,
                available,
            }),
            BalancePolicy::AllowNegative => {
                warnings.push(BalanceWarning {
                    scope,
                    resulting_balance: resulting,
                });
                Ok(())
            }
        }
    };

    for mutation in mutations {
        match *mutation {
            BalanceMutation::GroupBalance { group_id, delta } if group_id == group.id => {
                flag("group wallet".to_string(), group.shared_wallet_balance, delta)?;
            }
            BalanceMutation::FamilyBalance { family_id, delta } => {
                if let Some(family) = families.iter().find(|f| f.id == family_id) {
                    flag(format!("family '{}'", family.name), family.balance, delta)?;
                }
            }
            _ => {}
        }
    }
    Ok(warnings)
}

fn project(
    group: &Group,
    families: &[Family],
    mutations: &[BalanceMutation],
) -> CircleResult<(Group, Vec<Family>)> {
    let mut group = group.clone();
    let mut families = families.to_vec();
    for mutation in mutations {
        mutation.apply_to_group(&mut group)?;
        for family in families.iter_mut() {
            mutation.apply_to_family(family)?;
        }
    }
    Ok((group, families))
}
