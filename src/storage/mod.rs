//! Storage layer for Circle Wallet
//!
//! JSON file storage with atomic writes. [`Storage`] coordinates one
//! repository per record type and implements [`WalletStore`].
//!
//! Every write takes the data directory's lock file, reloads the files from
//! disk and only then applies its change, so several `circle` processes
//! sharing one directory never overwrite each other's updates.

pub mod families;
pub mod file_io;
pub mod groups;
pub mod members;
pub mod traits;
pub mod transactions;

pub use families::FamilyRepository;
pub use file_io::{read_json, write_json_atomic, DirLock};
pub use groups::GroupRepository;
pub use members::MemberRepository;
pub use traits::{Commit, TransactionOrder, TransactionWrite, WalletStore};
pub use transactions::TransactionRepository;

use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::audit::{AuditEntry, AuditLogger};
use crate::config::paths::CirclePaths;
use crate::error::{CircleError, CircleResult};
use crate::engine::BalanceMutation;
use crate::models::{
    Family, FamilyId, Group, GroupId, Member, Money, Transaction, TransactionId,
    TransactionStatus,
};

use file_io::mutex_lock;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: CirclePaths,
    pub groups: GroupRepository,
    pub families: FamilyRepository,
    pub members: MemberRepository,
    pub transactions: TransactionRepository,
    audit: AuditLogger,
    /// Serializes this process's writers; the lock file covers other processes
    writer: Mutex<()>,
}

impl Storage {
    /// Open (and create directories for) the store under `paths`; call [`Storage::load_all`] next
    pub fn new(paths: CirclePaths) -> CircleResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            groups: GroupRepository::new(paths.groups_file()),
            families: FamilyRepository::new(paths.families_file()),
            members: MemberRepository::new(paths.members_file()),
            transactions: TransactionRepository::new(paths.transactions_file()),
            audit: AuditLogger::new(paths.audit_log()),
            writer: Mutex::new(()),
            paths,
        })
    }

    /// [`Storage::new`] followed by [`Storage::load_all`]
    pub fn open(paths: CirclePaths) -> CircleResult<Self> {
        let storage = Self::new(paths)?;
        storage.load_all()?;
        Ok(storage)
    }

    pub fn paths(&self) -> &CirclePaths {
        &self.paths
    }

    pub fn load_all(&self) -> CircleResult<()> {
        self.groups.load()?;
        self.families.load()?;
        self.members.load()?;
        self.transactions.load()?;
        Ok(())
    }

    /// Run `write` holding both the writer mutex and the directory lock,
    /// against data freshly reloaded from disk
    pub fn exclusive<T>(&self, write: impl FnOnce() -> CircleResult<T>) -> CircleResult<T> {
        let _writer = mutex_lock(&self.writer)?;
        let _dir = DirLock::acquire(&self.paths.lock_file())?;
        self.load_all()?;
        write()
    }

    fn apply_commit(&self, commit: &Commit) -> CircleResult<Transaction> {
        let saved = match &commit.write {
            TransactionWrite::Insert(transaction) => {
                self.fetch_group(transaction.group_id)?;
                self.transactions.insert(transaction.clone())?
            }
            TransactionWrite::Transition {
                id,
                status,
                approved_by,
                approved_at,
            } => self
                .transactions
                .update_status(*id, *status, approved_by.clone(), *approved_at)?,
        };

        for mutation in &commit.mutations {
            match *mutation {
                BalanceMutation::GroupBalance { group_id, delta } => {
                    self.groups.increment_balance(group_id, delta)?;
                }
                BalanceMutation::GroupSpent { group_id, delta } => {
                    self.groups.increment_spent(group_id, delta)?;
                }
                BalanceMutation::FamilyBalance { family_id, delta } => {
                    self.families.increment_balance(family_id, delta)?;
                }
                BalanceMutation::FamilyContribution { family_id, delta } => {
                    self.families.increment_contribution(family_id, delta)?;
                }
            }
        }
        Ok(saved)
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }
}

impl WalletStore for Storage {
    fn fetch_group(&self, id: GroupId) -> CircleResult<Group> {
        self.groups
            .get(id)?
            .ok_or_else(|| CircleError::group_not_found(id.to_string()))
    }

    fn fetch_groups(&self) -> CircleResult<Vec<Group>> {
        self.groups.get_all()
    }

    fn fetch_families(&self, group_id: GroupId) -> CircleResult<Vec<Family>> {
        self.families.get_by_group(group_id)
    }

    fn fetch_family(&self, id: FamilyId) -> CircleResult<Family> {
        self.families
            .get(id)?
            .ok_or_else(|| CircleError::family_not_found(id.to_string()))
    }

    fn fetch_members(&self, family_ids: &[FamilyId]) -> CircleResult<Vec<Member>> {
        self.members.get_by_families(family_ids)
    }

    fn fetch_transactions(
        &self,
        group_id: GroupId,
        limit: Option<usize>,
        order: TransactionOrder,
    ) -> CircleResult<Vec<Transaction>> {
        self.transactions.get_by_group(group_id, limit, order)
    }

    fn fetch_transaction(&self, id: TransactionId) -> CircleResult<Transaction> {
        self.transactions
            .get(id)?
            .ok_or_else(|| CircleError::transaction_not_found(id.to_string()))
    }

    fn insert_group(&self, group: Group) -> CircleResult<Group> {
        self.exclusive(|| self.groups.insert(group))
    }

    fn insert_family(&self, family: Family) -> CircleResult<Family> {
        self.exclusive(|| {
            self.fetch_group(family.group_id)?;
            self.families.insert(family)
        })
    }

    fn insert_member(&self, member: Member) -> CircleResult<Member> {
        self.exclusive(|| {
            self.fetch_family(member.family_id)?;
            self.members.insert(member)
        })
    }

    fn insert_transaction(&self, transaction: Transaction) -> CircleResult<Transaction> {
        self.exclusive(|| {
            self.fetch_group(transaction.group_id)?;
            self.transactions.insert(transaction)
        })
    }

    fn update_group_settings(
        &self,
        id: GroupId,
        large_payment_threshold: Money,
        require_approval_above_threshold: bool,
    ) -> CircleResult<Group> {
        self.exclusive(|| {
            self.groups
                .update_settings(id, large_payment_threshold, require_approval_above_threshold)
        })
    }

    fn update_group_details(
        &self,
        id: GroupId,
        name: Option<String>,
        description: Option<String>,
    ) -> CircleResult<Group> {
        self.exclusive(|| self.groups.update_details(id, name, description))
    }

    fn update_transaction_status(
        &self,
        id: TransactionId,
        status: TransactionStatus,
        approved_by: Option<String>,
        approved_at: DateTime<Utc>,
    ) -> CircleResult<Transaction> {
        self.exclusive(|| {
            self.transactions
                .update_status(id, status, approved_by, approved_at)
        })
    }

    fn increment_group_balance(&self, id: GroupId, delta: Money) -> CircleResult<Money> {
        let balance = self.exclusive(|| self.groups.increment_balance(id, delta))?;
        tracing::debug!(group = %id, %delta, %balance, "group balance incremented");
        Ok(balance)
    }

    fn increment_group_spent(&self, id: GroupId, delta: Money) -> CircleResult<Money> {
        let spent = self.exclusive(|| self.groups.increment_spent(id, delta))?;
        tracing::debug!(group = %id, %delta, total_spent = %spent, "group spent incremented");
        Ok(spent)
    }

    fn increment_family_balance(&self, id: FamilyId, delta: Money) -> CircleResult<Money> {
        let balance = self.exclusive(|| self.families.increment_balance(id, delta))?;
        tracing::debug!(family = %id, %delta, %balance, "family balance incremented");
        Ok(balance)
    }

    fn increment_family_contribution(&self, id: FamilyId, delta: Money) -> CircleResult<Money> {
        let total = self.exclusive(|| self.families.increment_contribution(id, delta))?;
        tracing::debug!(
            family = %id,
            %delta,
            total_contribution = %total,
            "family contribution incremented"
        );
        Ok(total)
    }

    fn revert_transaction(
        &self,
        id: TransactionId,
        previous: Option<Transaction>,
    ) -> CircleResult<()> {
        self.exclusive(|| self.transactions.revert(id, previous))
    }

    fn refresh(&self) -> CircleResult<()> {
        let _writer = mutex_lock(&self.writer)?;
        self.load_all()
    }

    /// One locked batch: on any failure every touched file is rewritten
    /// with its contents from before the commit
    fn commit(&self, commit: &Commit) -> CircleResult<Transaction> {
        self.exclusive(|| {
            let groups = self.groups.snapshot()?;
            let families = self.families.snapshot()?;
            let transactions = self.transactions.snapshot()?;

            self.apply_commit(commit).map_err(|e| {
                tracing::error!(error = %e, "commit failed, restoring previous state");
                let restored = self
                    .groups
                    .restore(groups)
                    .and_then(|_| self.families.restore(families))
                    .and_then(|_| self.transactions.restore(transactions));
                if let Err(undo) = restored {
                    tracing::error!(error = %undo, "restoring previous state failed");
                }
                e
            })
        })
    }

    /// A failed audit write is logged, not propagated
    fn record_audit(&self, entry: AuditEntry) {
        if let Err(e) = self.audit.log(&entry) {
            tracing::warn!(error = %e, entity = %entry.entity_id, "failed to write audit entry");
        }
    }
}
