//! Transaction repository (transactions.json)
//!
//! Transactions are indexed by group. Amounts and splits never change after
//! insert; the only update is the status compare-and-set.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::error::{CircleError, CircleResult};
use crate::models::{GroupId, Transaction, TransactionId, TransactionStatus};

use super::file_io::{read_json, read_lock, write_json_atomic, write_lock};
use super::traits::TransactionOrder;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct TransactionData {
    transactions: Vec<Transaction>,
}

pub struct TransactionRepository {
    path: PathBuf,
    data: RwLock<HashMap<TransactionId, Transaction>>,
    /// Index: group_id -> transaction_ids
    by_group: RwLock<HashMap<GroupId, Vec<TransactionId>>>,
}

impl TransactionRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_group: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> CircleResult<()> {
        let file_data: TransactionData = read_json(&self.path)?;
        self.replace_all(file_data.transactions)
    }

    fn replace_all(&self, transactions: Vec<Transaction>) -> CircleResult<()> {
        let mut data = write_lock(&self.data)?;
        let mut by_group = write_lock(&self.by_group)?;
        data.clear();
        by_group.clear();

        for txn in transactions {
            by_group.entry(txn.group_id).or_default().push(txn.id);
            data.insert(txn.id, txn);
        }
        Ok(())
    }

    fn persist(&self, data: &HashMap<TransactionId, Transaction>) -> CircleResult<()> {
        let mut transactions: Vec<_> = data.values().cloned().collect();
        sort(&mut transactions, TransactionOrder::NewestFirst);
        write_json_atomic(&self.path, &TransactionData { transactions })
    }

    pub fn get(&self, id: TransactionId) -> CircleResult<Option<Transaction>> {
        Ok(read_lock(&self.data)?.get(&id).cloned())
    }

    pub fn get_by_group(
        &self,
        group_id: GroupId,
        limit: Option<usize>,
        order: TransactionOrder,
    ) -> CircleResult<Vec<Transaction>> {
        let data = read_lock(&self.data)?;
        let by_group = read_lock(&self.by_group)?;

        let ids = by_group.get(&group_id).map(|v| v.as_slice()).unwrap_or(&[]);
        let mut transactions: Vec<_> = ids.iter().filter_map(|id| data.get(id).cloned()).collect();
        sort(&mut transactions, order);
        if let Some(limit) = limit {
            transactions.truncate(limit);
        }
        Ok(transactions)
    }

    pub fn insert(&self, txn: Transaction) -> CircleResult<Transaction> {
        let mut data = write_lock(&self.data)?;
        let mut by_group = write_lock(&self.by_group)?;

        if data.contains_key(&txn.id) {
            return Err(CircleError::Duplicate {
                entity_type: "Transaction",
                identifier: txn.id.to_string(),
            });
        }

        by_group.entry(txn.group_id).or_default().push(txn.id);
        data.insert(txn.id, txn.clone());
        self.persist(&data)?;
        Ok(txn)
    }

    /// Pending -> `status`, checked and applied under one write lock
    pub fn update_status(
        &self,
        id: TransactionId,
        status: TransactionStatus,
        approved_by: Option<String>,
        approved_at: DateTime<Utc>,
    ) -> CircleResult<Transaction> {
        let mut data = write_lock(&self.data)?;
        let txn = data
            .get_mut(&id)
            .ok_or_else(|| CircleError::transaction_not_found(id.to_string()))?;

        let mut next = txn.clone();
        next.transition(status, approved_by, approved_at)?;
        *txn = next.clone();

        self.persist(&data)?;
        Ok(next)
    }

    /// Put `previous` back, or drop the row entirely when there was none
    pub fn revert(&self, id: TransactionId, previous: Option<Transaction>) -> CircleResult<()> {
        let mut data = write_lock(&self.data)?;
        let mut by_group = write_lock(&self.by_group)?;

        match previous {
            Some(txn) => {
                data.insert(id, txn);
            }
            None => {
                if let Some(removed) = data.remove(&id) {
                    if let Some(ids) = by_group.get_mut(&removed.group_id) {
                        ids.retain(|other| *other != id);
                    }
                }
            }
        }
        self.persist(&data)
    }

    pub fn snapshot(&self) -> CircleResult<Vec<Transaction>> {
        Ok(read_lock(&self.data)?.values().cloned().collect())
    }

    pub fn restore(&self, transactions: Vec<Transaction>) -> CircleResult<()> {
        self.replace_all(transactions)?;
        self.persist(&*read_lock(&self.data)?)
    }

    pub fn count(&self) -> CircleResult<usize> {
        Ok(read_lock(&self.data)?.len())
    }
}

fn sort(transactions: &mut [Transaction], order: TransactionOrder) {
    transactions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    if order == TransactionOrder::NewestFirst {
        transactions.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, SplitPolicy};
    use chrono::Duration;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, TransactionRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = TransactionRepository::new(temp_dir.path().join("transactions.json"));
        (temp_dir, repo)
    }

    fn deposit_at(group: GroupId, major: i64, minutes_ago: i64) -> Transaction {
        let mut txn = Transaction::deposit(group, None, Money::from_major(major));
        txn.created_at = Utc::now() - Duration::minutes(minutes_ago);
        txn
    }

    #[test]
    fn test_listing_order_and_limit() {
        let (_temp, repo) = create_test_repo();
        let group = GroupId::new();

        repo.insert(deposit_at(group, 1, 30)).unwrap();
        repo.insert(deposit_at(group, 2, 20)).unwrap();
        repo.insert(deposit_at(group, 3, 10)).unwrap();
        repo.insert(deposit_at(GroupId::new(), 99, 5)).unwrap();

        let newest = repo
            .get_by_group(group, Some(2), TransactionOrder::NewestFirst)
            .unwrap();
        let amounts: Vec<_> = newest.iter().map(|t| t.amount.major()).collect();
        assert_eq!(amounts, vec![3, 2]);

        let oldest = repo.get_by_group(group, None, TransactionOrder::OldestFirst).unwrap();
        let amounts: Vec<_> = oldest.iter().map(|t| t.amount.major()).collect();
        assert_eq!(amounts, vec![1, 2, 3]);
    }

    #[test]
    fn test_status_compare_and_set() {
        let (_temp, repo) = create_test_repo();
        let txn = repo
            .insert(Transaction::payment(
                GroupId::new(),
                Money::from_major(60_000),
                SplitPolicy::Everyone,
                true,
            ))
            .unwrap();

        let approved = repo
            .update_status(
                txn.id,
                TransactionStatus::Confirmed,
                Some("admin".into()),
                Utc::now(),
            )
            .unwrap();
        assert!(approved.is_confirmed());

        let again = repo.update_status(txn.id, TransactionStatus::Confirmed, None, Utc::now());
        assert!(matches!(again, Err(CircleError::InvalidStateTransition { .. })));

        let stored = repo.get(txn.id).unwrap().unwrap();
        assert_eq!(stored.approved_by.as_deref(), Some("admin"));
    }

    #[test]
    fn test_reload_rebuilds_group_index() {
        let (temp, repo) = create_test_repo();
        let group = GroupId::new();
        repo.insert(deposit_at(group, 1, 1)).unwrap();

        let reopened = TransactionRepository::new(temp.path().join("transactions.json"));
        reopened.load().unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
        assert_eq!(
            reopened
                .get_by_group(group, None, TransactionOrder::NewestFirst)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_revert_removes_or_restores() {
        let (_temp, repo) = create_test_repo();
        let group = GroupId::new();
        let pending = repo
            .insert(Transaction::payment(
                group,
                Money::from_major(9000),
                SplitPolicy::Everyone,
                true,
            ))
            .unwrap();
        let deposit = repo.insert(deposit_at(group, 5, 1)).unwrap();

        repo.update_status(pending.id, TransactionStatus::Declined, None, Utc::now())
            .unwrap();
        repo.revert(pending.id, Some(pending.clone())).unwrap();
        assert!(repo.get(pending.id).unwrap().unwrap().is_pending());

        repo.revert(deposit.id, None).unwrap();
        assert!(repo.get(deposit.id).unwrap().is_none());
        assert_eq!(
            repo.get_by_group(group, None, TransactionOrder::NewestFirst)
                .unwrap()
                .len(),
            1
        );
    }
}
