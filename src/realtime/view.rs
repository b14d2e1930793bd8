//! In-memory, newest-first view of a group's transactions

use crate::models::{GroupId, Transaction, TransactionId};

use super::feed::{Subscription, TransactionEvent};

/// Merges feed events into an ordered list; no business logic runs here
#[derive(Debug, Clone)]
pub struct TransactionView {
    group_id: GroupId,
    transactions: Vec<Transaction>,
}

impl TransactionView {
    /// Seed from a newest-first fetch
    pub fn new(group_id: GroupId, initial: Vec<Transaction>) -> Self {
        Self {
            group_id,
            transactions: initial
                .into_iter()
                .filter(|t| t.group_id == group_id)
                .collect(),
        }
    }

    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn pending(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(|t| t.is_pending())
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Apply one event; returns whether the view changed
    pub fn apply(&mut self, event: TransactionEvent) -> bool {
        match event {
            TransactionEvent::Inserted(txn) => {
                if txn.group_id != self.group_id || self.get(txn.id).is_some() {
                    return false;
                }
                self.transactions.insert(0, txn);
                true
            }
            TransactionEvent::Updated(txn) => {
                match self.transactions.iter_mut().find(|t| t.id == txn.id) {
                    Some(slot) if *slot != txn => {
                        *slot = txn;
                        true
                    }
                    _ => false,
                }
            }
            TransactionEvent::Deleted(id) => {
                let before = self.transactions.len();
                self.transactions.retain(|t| t.id != id);
                self.transactions.len() != before
            }
        }
    }

    /// Apply everything queued on `subscription`; returns how many events changed the view
    pub fn sync(&mut self, subscription: &Subscription) -> usize {
        if subscription.group_id() != self.group_id {
            return 0;
        }
        subscription
            .drain()
            .into_iter()
            .map(|event| self.apply(event))
            .filter(|changed| *changed)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, SplitPolicy, TransactionStatus};
    use crate::realtime::TransactionFeed;
    use chrono::Utc;

    #[test]
    fn test_insert_goes_to_top_and_duplicates_are_ignored() {
        let group = GroupId::new();
        let older = Transaction::deposit(group, None, Money::from_major(1));
        let mut view = TransactionView::new(group, vec![older.clone()]);

        let newer = Transaction::deposit(group, None, Money::from_major(2));
        assert!(view.apply(TransactionEvent::Inserted(newer.clone())));
        assert!(!view.apply(TransactionEvent::Inserted(newer.clone())));

        let ids: Vec<_> = view.transactions().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[test]
    fn test_update_replaces_in_place() {
        let group = GroupId::new();
        let pending =
            Transaction::payment(group, Money::from_major(60_000), SplitPolicy::Everyone, true);
        let mut view = TransactionView::new(group, vec![pending.clone()]);
        assert_eq!(view.pending().count(), 1);

        let mut confirmed = pending.clone();
        confirmed
            .transition(TransactionStatus::Confirmed, None, Utc::now())
            .unwrap();

        assert!(view.apply(TransactionEvent::Updated(confirmed.clone())));
        assert_eq!(view.get(pending.id).unwrap().status, TransactionStatus::Confirmed);
        assert_eq!(view.pending().count(), 0);
        assert!(!view.apply(TransactionEvent::Updated(confirmed)));
    }

    #[test]
    fn test_delete_and_foreign_group_events() {
        let group = GroupId::new();
        let txn = Transaction::deposit(group, None, Money::from_major(1));
        let mut view = TransactionView::new(group, vec![txn.clone()]);

        let foreign = Transaction::deposit(GroupId::new(), None, Money::from_major(1));
        assert!(!view.apply(TransactionEvent::Inserted(foreign)));

        assert!(view.apply(TransactionEvent::Deleted(txn.id)));
        assert!(view.is_empty());
        assert!(!view.apply(TransactionEvent::Deleted(txn.id)));
    }

    #[test]
    fn test_sync_from_subscription() {
        let feed = TransactionFeed::new();
        let group = GroupId::new();
        let sub = feed.subscribe(group);
        let mut view = TransactionView::new(group, Vec::new());

        let txn = Transaction::deposit(group, None, Money::from_major(5));
        feed.publish(group, TransactionEvent::Inserted(txn.clone()));
        feed.publish(group, TransactionEvent::Inserted(txn));

        assert_eq!(view.sync(&sub), 1);
        assert_eq!(view.len(), 1);
    }
}
