//! Per-group transaction change feed
//!
//! Subscribers get a channel receiver per group. Publishing never blocks and
//! never fails the publisher: subscribers whose receiver was dropped are
//! pruned on the next publish.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Mutex;
use std::time::Duration;

use crate::models::{GroupId, Transaction, TransactionId};

/// A change to one of a group's transaction rows
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionEvent {
    Inserted(Transaction),
    Updated(Transaction),
    Deleted(TransactionId),
}

impl TransactionEvent {
    pub fn transaction_id(&self) -> TransactionId {
        match self {
            Self::Inserted(txn) | Self::Updated(txn) => txn.id,
            Self::Deleted(id) => *id,
        }
    }
}

/// Receiving end returned by [`TransactionFeed::subscribe`]
///
/// Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    group_id: GroupId,
    receiver: Receiver<TransactionEvent>,
}

impl Subscription {
    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    /// Next event if one is already queued
    pub fn try_next(&self) -> Option<TransactionEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Wait up to `timeout` for the next event
    pub fn next_timeout(&self, timeout: Duration) -> Option<TransactionEvent> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Everything queued right now, oldest first
    pub fn drain(&self) -> Vec<TransactionEvent> {
        self.receiver.try_iter().collect()
    }
}

#[derive(Default)]
pub struct TransactionFeed {
    subscribers: Mutex<HashMap<GroupId, Vec<Sender<TransactionEvent>>>>,
}

impl TransactionFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, group_id: GroupId) -> Subscription {
        let (sender, receiver) = mpsc::channel();
        match self.subscribers.lock() {
            Ok(mut subscribers) => subscribers.entry(group_id).or_default().push(sender),
            Err(poisoned) => poisoned
                .into_inner()
                .entry(group_id)
                .or_default()
                .push(sender),
        }
        Subscription { group_id, receiver }
    }

    /// Deliver `event` to every live subscriber of `group_id`
    pub fn publish(&self, group_id: GroupId, event: TransactionEvent) {
        let mut subscribers = match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let Some(senders) = subscribers.get_mut(&group_id) else {
            return;
        };

        senders.retain(|sender| sender.send(event.clone()).is_ok());
        tracing::debug!(
            group = %group_id,
            transaction = %event.transaction_id(),
            subscribers = senders.len(),
            "published transaction event"
        );
        if senders.is_empty() {
            subscribers.remove(&group_id);
        }
    }

    pub fn subscriber_count(&self, group_id: GroupId) -> usize {
        self.subscribers
            .lock()
            .map(|s| s.get(&group_id).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}
