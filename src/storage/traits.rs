//! The persistence boundary used by the services

use chrono::{DateTime, Utc};

use crate::audit::AuditEntry;
use crate::engine::BalanceMutation;
use crate::error::CircleResult;
use crate::models::{
    Family, FamilyId, Group, GroupId, Member, Money, Transaction, TransactionId, TransactionStatus,
};

/// Listing order for [`WalletStore::fetch_transactions`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// The transaction row written by a [`Commit`]
#[derive(Debug, Clone)]
pub enum TransactionWrite {
    Insert(Transaction),
    /// Pending -> `status`, as a compare-and-set
    Transition {
        id: TransactionId,
        status: TransactionStatus,
        approved_by: Option<String>,
        approved_at: DateTime<Utc>,
    },
}

/// A transaction write plus the aggregate deltas it causes
///
/// Applied as one unit by [`WalletStore::commit`]: either the row and every
/// mutation land, or none of them do.
#[derive(Debug, Clone)]
pub struct Commit {
    pub write: TransactionWrite,
    pub mutations: Vec<BalanceMutation>,
}

impl Commit {
    pub fn insert(transaction: Transaction, mutations: Vec<BalanceMutation>) -> Self {
        Self {
            write: TransactionWrite::Insert(transaction),
            mutations,
        }
    }

    pub fn transition(
        id: TransactionId,
        status: TransactionStatus,
        approved_by: Option<String>,
        approved_at: DateTime<Utc>,
        mutations: Vec<BalanceMutation>,
    ) -> Self {
        Self {
            write: TransactionWrite::Transition {
                id,
                status,
                approved_by,
                approved_at,
            },
            mutations,
        }
    }
}

/// Reads, inserts and atomic aggregate updates for the wallet records
///
/// Implementations must apply every `increment_*` as a single in-place
/// `value = value + delta` against the current stored value (under a lock
/// that other writers, including other processes, respect) and return the
/// new value. Callers never write back a value they read earlier.
pub trait WalletStore {
    /// Re-read anything cached so the next fetches see other writers' changes
    fn refresh(&self) -> CircleResult<()> {
        Ok(())
    }

    fn fetch_group(&self, id: GroupId) -> CircleResult<Group>;

    fn fetch_groups(&self) -> CircleResult<Vec<Group>>;

    fn fetch_families(&self, group_id: GroupId) -> CircleResult<Vec<Family>>;

    fn fetch_family(&self, id: FamilyId) -> CircleResult<Family>;

    /// Members of the given families, in family order then creation order
    fn fetch_members(&self, family_ids: &[FamilyId]) -> CircleResult<Vec<Member>>;

    fn fetch_transactions(
        &self,
        group_id: GroupId,
        limit: Option<usize>,
        order: TransactionOrder,
    ) -> CircleResult<Vec<Transaction>>;

    fn fetch_transaction(&self, id: TransactionId) -> CircleResult<Transaction>;

    fn insert_group(&self, group: Group) -> CircleResult<Group>;

    fn insert_family(&self, family: Family) -> CircleResult<Family>;

    fn insert_member(&self, member: Member) -> CircleResult<Member>;

    fn insert_transaction(&self, transaction: Transaction) -> CircleResult<Transaction>;

    /// Replace the approval settings of an existing group
    fn update_group_settings(
        &self,
        id: GroupId,
        large_payment_threshold: Money,
        require_approval_above_threshold: bool,
    ) -> CircleResult<Group>;

    /// Change a group's name and/or description
    fn update_group_details(
        &self,
        id: GroupId,
        name: Option<String>,
        description: Option<String>,
    ) -> CircleResult<Group>;

    /// Move a pending transaction to `status`
    ///
    /// Compare-and-set: fails with `InvalidStateTransition` if the stored
    /// status is no longer pending, so a racing second approval loses.
    fn update_transaction_status(
        &self,
        id: TransactionId,
        status: TransactionStatus,
        approved_by: Option<String>,
        approved_at: DateTime<Utc>,
    ) -> CircleResult<Transaction>;

    fn increment_group_balance(&self, id: GroupId, delta: Money) -> CircleResult<Money>;

    fn increment_group_spent(&self, id: GroupId, delta: Money) -> CircleResult<Money>;

    fn increment_family_balance(&self, id: FamilyId, delta: Money) -> CircleResult<Money>;

    fn increment_family_contribution(&self, id: FamilyId, delta: Money) -> CircleResult<Money>;

    /// Undo a transaction write: restore `previous`, or remove the row if it was new
    fn revert_transaction(
        &self,
        id: TransactionId,
        previous: Option<Transaction>,
    ) -> CircleResult<()>;

    /// Append to the audit trail; stores without one ignore it
    fn record_audit(&self, _entry: AuditEntry) {}

    /// Route an engine mutation to the matching increment
    fn apply_mutation(&self, mutation: &BalanceMutation) -> CircleResult<Money> {
        match *mutation {
            BalanceMutation::GroupBalance { group_id, delta } => {
                self.increment_group_balance(group_id, delta)
            }
            BalanceMutation::GroupSpent { group_id, delta } => {
                self.increment_group_spent(group_id, delta)
            }
            BalanceMutation::FamilyBalance { family_id, delta } => {
                self.increment_family_balance(family_id, delta)
            }
            BalanceMutation::FamilyContribution { family_id, delta } => {
                self.increment_family_contribution(family_id, delta)
            }
        }
    }

    /// Write the transaction row and apply its mutations as one unit
    ///
    /// This default runs the steps one by one and compensates on failure:
    /// applied mutations are reversed and the row is reverted. Stores that
    /// can write everything under one lock should override it.
    fn commit(&self, commit: &Commit) -> CircleResult<Transaction> {
        let (saved, previous) = match &commit.write {
            TransactionWrite::Insert(transaction) => {
                (self.insert_transaction(transaction.clone())?, None)
            }
            TransactionWrite::Transition {
                id,
                status,
                approved_by,
                approved_at,
            } => {
                let before = self.fetch_transaction(*id)?;
                let after = self.update_transaction_status(
                    *id,
                    *status,
                    approved_by.clone(),
                    *approved_at,
                )?;
                (after, Some(before))
            }
        };

        for (applied, mutation) in commit.mutations.iter().enumerate() {
            if let Err(e) = self.apply_mutation(mutation) {
                tracing::error!(error = %e, ?mutation, "balance mutation failed, rolling back");
                for done in commit.mutations[..applied].iter().rev() {
                    if let Err(undo) = self.apply_mutation(&done.reversed()) {
                        tracing::error!(error = %undo, mutation = ?done, "rollback failed");
                    }
                }
                if let Err(undo) = self.revert_transaction(saved.id, previous) {
                    tracing::error!(error = %undo, transaction = %saved.id, "rollback failed");
                }
                return Err(e);
            }
        }

        Ok(saved)
    }
}
