//! Transaction queries: filtered listings, lookups, the pending queue

use crate::error::{CircleError, CircleResult};
use crate::models::{
    Category, GroupId, SplitPolicy, Transaction, TransactionId, TransactionKind, TransactionStatus,
};
use crate::storage::{TransactionOrder, WalletStore};

/// Filter for listing transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub status: Option<TransactionStatus>,
    pub category: Option<Category>,
    pub split_policy: Option<SplitPolicy>,
    /// Case-insensitive text matched against description and merchant
    pub search: Option<String>,
    pub limit: Option<usize>,
    pub order: TransactionOrder,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn split_policy(mut self, policy: SplitPolicy) -> Self {
        self.split_policy = Some(policy);
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        let text = text.into().trim().to_lowercase();
        self.search = (!text.is_empty()).then_some(text);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn oldest_first(mut self) -> Self {
        self.order = TransactionOrder::OldestFirst;
        self
    }

    fn matches(&self, txn: &Transaction) -> bool {
        self.kind.map_or(true, |k| txn.kind == k)
            && self.status.map_or(true, |s| txn.status == s)
            && self.category.map_or(true, |c| txn.category == Some(c))
            && self.split_policy.map_or(true, |p| txn.split_policy == Some(p))
            && self.search.as_deref().map_or(true, |needle| {
                txn.description.to_lowercase().contains(needle)
                    || txn
                        .merchant_name
                        .as_deref()
                        .is_some_and(|m| m.to_lowercase().contains(needle))
            })
    }
}

pub struct TransactionService<'a, S: WalletStore> {
    store: &'a S,
}

impl<'a, S: WalletStore> TransactionService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn list(
        &self,
        group_id: GroupId,
        filter: &TransactionFilter,
    ) -> CircleResult<Vec<Transaction>> {
        let mut transactions: Vec<_> = self
            .store
            .fetch_transactions(group_id, None, filter.order)?
            .into_iter()
            .filter(|t| filter.matches(t))
            .collect();
        if let Some(limit) = filter.limit {
            transactions.truncate(limit);
        }
        Ok(transactions)
    }

    /// Payments waiting for an admin, oldest first
    pub fn pending(&self, group_id: GroupId) -> CircleResult<Vec<Transaction>> {
        self.list(
            group_id,
            &TransactionFilter::new()
                .status(TransactionStatus::Pending)
                .oldest_first(),
        )
    }

    pub fn get(&self, id: TransactionId) -> CircleResult<Transaction> {
        self.store.fetch_transaction(id)
    }

    /// Resolve a full transaction id or a unique prefix of it (`txn-1a2b3c4d`)
    pub fn find(&self, group_id: GroupId, query: &str) -> CircleResult<Transaction> {
        if let Ok(id) = query.parse::<TransactionId>() {
            let txn = self.store.fetch_transaction(id)?;
            if txn.group_id != group_id {
                return Err(CircleError::transaction_not_found(query));
            }
            return Ok(txn);
        }

        let lowered = query.trim().to_lowercase();
        let prefix = lowered
            .strip_prefix("txn-")
            .unwrap_or(&lowered)
            .replace('-', "");
        if prefix.is_empty() {
            return Err(CircleError::transaction_not_found(query));
        }

        let transactions = self
            .store
            .fetch_transactions(group_id, None, TransactionOrder::NewestFirst)?;
        let mut matches = transactions
            .into_iter()
            .filter(|t| t.id.as_uuid().simple().to_string().starts_with(&prefix));

        match (matches.next(), matches.next()) {
            (Some(only), None) => Ok(only),
            (Some(_), Some(_)) => Err(CircleError::Validation(format!(
                "Transaction id '{}' is ambiguous; use more characters",
                query
            ))),
            (None, _) => Err(CircleError::transaction_not_found(query)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::CirclePaths;
    use crate::engine::{BalancePolicy, PaymentRequest, TransactionDetails};
    use crate::models::{Family, Group, Member, MemberType, Money};
    use crate::services::WalletService;
    use crate::storage::Storage;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Storage, GroupId) {
        let temp = TempDir::new().unwrap();
        let storage = Storage::open(CirclePaths::with_base_dir(temp.path().to_path_buf())).unwrap();
        let group = storage
            .insert_group(Group::new("Goa Trip", "INR", Money::from_major(5000), true))
            .unwrap();
        let family = storage.insert_family(Family::new(group.id, "Sharma")).unwrap();
        storage
            .insert_member(Member::new(family.id, "Asha", MemberType::Adult))
            .unwrap();
        (temp, storage, group.id)
    }

    fn pay(storage: &Storage, group: GroupId, major: i64, category: Category) -> Transaction {
        pay_with(storage, group, major, SplitPolicy::Everyone, category, "")
    }

    fn pay_with(
        storage: &Storage,
        group: GroupId,
        major: i64,
        policy: SplitPolicy,
        category: Category,
        merchant: &str,
    ) -> Transaction {
        let request = PaymentRequest::new(Money::from_major(major), policy).with_details(
            TransactionDetails {
                category: Some(category),
                merchant_name: (!merchant.is_empty()).then(|| merchant.to_string()),
                ..Default::default()
            },
        );
        WalletService::new(storage, BalancePolicy::AllowNegative)
            .pay(group, request)
            .unwrap()
            .transaction
    }

    #[test]
    fn test_filters_combine() {
        let (_temp, storage, group) = setup();
        WalletService::new(&storage, BalancePolicy::AllowNegative)
            .deposit(group, None, Money::from_major(20_000), TransactionDetails::default())
            .unwrap();
        pay(&storage, group, 100, Category::Food);
        pay(&storage, group, 200, Category::Transport);
        pay(&storage, group, 9000, Category::Food);

        let service = TransactionService::new(&storage);
        assert_eq!(service.list(group, &TransactionFilter::new()).unwrap().len(), 4);
        assert_eq!(
            service
                .list(group, &TransactionFilter::new().kind(TransactionKind::Payment))
                .unwrap()
                .len(),
            3
        );
        let food = service
            .list(group, &TransactionFilter::new().category(Category::Food))
            .unwrap();
        assert_eq!(food.len(), 2);
        let confirmed_food = service
            .list(
                group,
                &TransactionFilter::new()
                    .category(Category::Food)
                    .status(TransactionStatus::Confirmed),
            )
            .unwrap();
        assert_eq!(confirmed_food.len(), 1);
        assert_eq!(
            service.list(group, &TransactionFilter::new().limit(2)).unwrap().len(),
            2
        );
    }

    #[test]
    fn test_search_and_split_filters() {
        let (_temp, storage, group) = setup();
        WalletService::new(&storage, BalancePolicy::AllowNegative)
            .deposit(
                group,
                None,
                Money::from_major(1000),
                TransactionDetails {
                    description: "Airport top-up".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        let shack = "Curlies Beach Shack";
        pay_with(&storage, group, 90, SplitPolicy::AdultsOnly, Category::Drinks, shack);
        pay_with(&storage, group, 40, SplitPolicy::Everyone, Category::Food, "Beach Cafe");

        let service = TransactionService::new(&storage);
        let beach = service
            .list(group, &TransactionFilter::new().search("  BEACH "))
            .unwrap();
        assert_eq!(beach.len(), 2);
        let top_up = service.list(group, &TransactionFilter::new().search("top-up")).unwrap();
        assert_eq!(top_up.len(), 1);
        assert_eq!(top_up[0].kind, TransactionKind::Deposit);

        let adults = service
            .list(group, &TransactionFilter::new().split_policy(SplitPolicy::AdultsOnly))
            .unwrap();
        assert_eq!(adults.len(), 1);
        assert_eq!(adults[0].merchant_name.as_deref(), Some(shack));

        let blank = TransactionFilter::new().search("   ");
        assert!(blank.search.is_none());
    }

    #[test]
    fn test_pending_queue() {
        let (_temp, storage, group) = setup();
        let big = pay(&storage, group, 6000, Category::Accommodation);
        pay(&storage, group, 50, Category::Drinks);

        let pending = TransactionService::new(&storage).pending(group).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, big.id);
    }

    #[test]
    fn test_find_by_full_and_short_id() {
        let (_temp, storage, group) = setup();
        let txn = pay(&storage, group, 10, Category::Other);
        let service = TransactionService::new(&storage);

        assert_eq!(service.find(group, &txn.id.to_string()).unwrap().id, txn.id);
        assert_eq!(service.find(group, &txn.id.short()).unwrap().id, txn.id);
        assert!(service.find(group, "txn-").unwrap_err().is_not_found());
        assert!(service.find(group, "zzzz").unwrap_err().is_not_found());
    }
}
