//! Wallet service
//!
//! Orchestrates deposits, payments, approvals and declines. Each operation
//! refreshes the store, runs the engine against that snapshot, then hands
//! the transaction row and the engine's mutations to [`WalletStore::commit`]
//! as one unit. Audit entries, log lines and feed events follow a successful
//! commit.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::audit::{AuditEntry, EntityType};
use crate::engine::{
    self, Allocation, BalancePolicy, BalanceWarning, PaymentRequest, TransactionDetails,
};
use crate::error::CircleResult;
use crate::models::{
    Family, FamilyId, Group, GroupId, Money, Transaction, TransactionId, TransactionStatus,
};
use crate::realtime::{TransactionEvent, TransactionFeed};
use crate::storage::{Commit, WalletStore};

/// A recorded deposit with the aggregates as stored afterwards
#[derive(Debug, Clone)]
pub struct DepositReceipt {
    pub transaction: Transaction,
    pub group: Group,
    pub family: Option<Family>,
}

/// A recorded payment; `pending` ones have not moved any balance yet
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub transaction: Transaction,
    pub group: Group,
    pub allocation: Allocation,
    pub per_family_share: BTreeMap<FamilyId, Money>,
    pub warnings: Vec<BalanceWarning>,
}

impl PaymentReceipt {
    pub fn is_pending(&self) -> bool {
        self.transaction.is_pending()
    }
}

/// Result of approving or declining a pending payment
#[derive(Debug, Clone)]
pub struct Resolution {
    pub transaction: Transaction,
    pub group: Group,
    pub warnings: Vec<BalanceWarning>,
}

pub struct WalletService<'a, S: WalletStore> {
    store: &'a S,
    balance_policy: BalancePolicy,
    feed: Option<&'a TransactionFeed>,
}

impl<'a, S: WalletStore> WalletService<'a, S> {
    pub fn new(store: &'a S, balance_policy: BalancePolicy) -> Self {
        Self {
            store,
            balance_policy,
            feed: None,
        }
    }

    /// Publish inserts and status changes to `feed`
    pub fn with_feed(mut self, feed: &'a TransactionFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Credit the shared wallet, attributed to `family_id` if given
    pub fn deposit(
        &self,
        group_id: GroupId,
        family_id: Option<FamilyId>,
        amount: Money,
        details: TransactionDetails,
    ) -> CircleResult<DepositReceipt> {
        self.store.refresh()?;
        let group = self.store.fetch_group(group_id)?;
        let family = family_id.map(|id| self.store.fetch_family(id)).transpose()?;

        let outcome = engine::apply_deposit(&group, family.as_ref(), amount, details)?;

        let transaction = self
            .store
            .commit(&Commit::insert(outcome.transaction, outcome.mutations))?;

        self.audit_created(&transaction);
        tracing::info!(
            group = %group_id,
            transaction = %transaction.id,
            family = ?family_id,
            amount = %amount,
            "deposit recorded"
        );
        self.publish(TransactionEvent::Inserted(transaction.clone()));

        Ok(DepositReceipt {
            group: self.store.fetch_group(group_id)?,
            family: family_id.map(|id| self.store.fetch_family(id)).transpose()?,
            transaction,
        })
    }

    /// Pay from the shared wallet; large payments may come back pending
    pub fn pay(&self, group_id: GroupId, request: PaymentRequest) -> CircleResult<PaymentReceipt> {
        self.store.refresh()?;
        let group = self.store.fetch_group(group_id)?;
        let families = self.store.fetch_families(group_id)?;
        let family_ids: Vec<FamilyId> = families.iter().map(|f| f.id).collect();
        let members = self.store.fetch_members(&family_ids)?;

        let outcome =
            engine::apply_payment(&group, &families, &members, request, self.balance_policy)?;

        let transaction = self
            .store
            .commit(&Commit::insert(outcome.transaction, outcome.mutations))?;
        self.warn(&transaction, &outcome.warnings);

        self.audit_created(&transaction);
        tracing::info!(
            group = %group_id,
            transaction = %transaction.id,
            amount = %transaction.amount,
            status = %transaction.status,
            participants = transaction.split_among.len(),
            "payment recorded"
        );
        self.publish(TransactionEvent::Inserted(transaction.clone()));

        Ok(PaymentReceipt {
            group: self.store.fetch_group(group_id)?,
            transaction,
            allocation: outcome.allocation,
            per_family_share: outcome.per_family_share,
            warnings: outcome.warnings,
        })
    }

    /// Confirm a pending payment and apply its stored splits
    pub fn approve(
        &self,
        transaction_id: TransactionId,
        approver: Option<String>,
    ) -> CircleResult<Resolution> {
        self.store.refresh()?;
        let before = self.store.fetch_transaction(transaction_id)?;
        let group = self.store.fetch_group(before.group_id)?;
        let families = self.store.fetch_families(before.group_id)?;

        let outcome = engine::approve_transaction(
            &before,
            &group,
            &families,
            approver.clone(),
            self.balance_policy,
        )?;

        // the status CAS inside the commit decides the winner; only the winner's mutations land
        let after = self.store.commit(&Commit::transition(
            transaction_id,
            TransactionStatus::Confirmed,
            approver.clone(),
            outcome.transaction.approved_at.unwrap_or_else(Utc::now),
            outcome.mutations,
        ))?;
        self.warn(&after, &outcome.warnings);

        self.audit_status_change(&before, &after, approver);
        tracing::info!(
            group = %after.group_id,
            transaction = %after.id,
            amount = %after.amount,
            "payment approved"
        );
        self.publish(TransactionEvent::Updated(after.clone()));

        Ok(Resolution {
            group: self.store.fetch_group(after.group_id)?,
            transaction: after,
            warnings: outcome.warnings,
        })
    }

    /// Decline a pending payment; no balance changes
    pub fn decline(
        &self,
        transaction_id: TransactionId,
        approver: Option<String>,
    ) -> CircleResult<Resolution> {
        self.store.refresh()?;
        let before = self.store.fetch_transaction(transaction_id)?;
        let declined = engine::decline_transaction(&before, approver.clone())?;

        let after = self.store.commit(&Commit::transition(
            transaction_id,
            TransactionStatus::Declined,
            approver.clone(),
            declined.approved_at.unwrap_or_else(Utc::now),
            Vec::new(),
        ))?;

        self.audit_status_change(&before, &after, approver);
        tracing::info!(group = %after.group_id, transaction = %after.id, "payment declined");
        self.publish(TransactionEvent::Updated(after.clone()));

        Ok(Resolution {
            group: self.store.fetch_group(after.group_id)?,
            transaction: after,
            warnings: Vec::new(),
        })
    }

    fn warn(&self, transaction: &Transaction, warnings: &[BalanceWarning]) {
        for warning in warnings {
            tracing::warn!(
                transaction = %transaction.id,
                scope = %warning.scope,
                balance = %warning.resulting_balance,
                "balance went negative"
            );
        }
    }

    fn audit_created(&self, transaction: &Transaction) {
        self.store.record_audit(
            AuditEntry::create(
                EntityType::Transaction,
                transaction.id.to_string(),
                Some(transaction.title()),
                transaction,
            )
            .with_actor(transaction.paid_by.clone()),
        );
    }

    fn audit_status_change(
        &self,
        before: &Transaction,
        after: &Transaction,
        actor: Option<String>,
    ) {
        self.store.record_audit(
            AuditEntry::update(
                EntityType::Transaction,
                after.id.to_string(),
                Some(after.title()),
                before,
                after,
            )
            .with_actor(actor),
        );
    }

    fn publish(&self, event: TransactionEvent) {
        if let Some(feed) = self.feed {
            let group_id = match &event {
                TransactionEvent::Inserted(txn) | TransactionEvent::Updated(txn) => txn.group_id,
                TransactionEvent::Deleted(_) => return,
            };
            feed.publish(group_id, event);
        }
    }
}
