//! Group repository (groups.json)

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::Utc;

use crate::error::{CircleError, CircleResult};
use crate::models::{Group, GroupId, Money};

use super::file_io::{read_json, read_lock, write_json_atomic, write_lock};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct GroupData {
    groups: Vec<Group>,
}

/// Write-through repository: every mutation is persisted before the lock is released
pub struct GroupRepository {
    path: PathBuf,
    data: RwLock<HashMap<GroupId, Group>>,
}

impl GroupRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> CircleResult<()> {
        let file_data: GroupData = read_json(&self.path)?;
        let mut data = write_lock(&self.data)?;

        data.clear();
        for group in file_data.groups {
            data.insert(group.id, group);
        }
        Ok(())
    }

    fn persist(&self, data: &HashMap<GroupId, Group>) -> CircleResult<()> {
        let mut groups: Vec<_> = data.values().cloned().collect();
        groups.sort_by_key(|g| g.created_at);
        write_json_atomic(&self.path, &GroupData { groups })
    }

    pub fn get(&self, id: GroupId) -> CircleResult<Option<Group>> {
        Ok(read_lock(&self.data)?.get(&id).cloned())
    }

    /// Oldest first
    pub fn get_all(&self) -> CircleResult<Vec<Group>> {
        let mut groups: Vec<_> = read_lock(&self.data)?.values().cloned().collect();
        groups.sort_by_key(|g| g.created_at);
        Ok(groups)
    }

    /// Case-insensitive name lookup
    pub fn get_by_name(&self, name: &str) -> CircleResult<Option<Group>> {
        let needle = name.trim().to_lowercase();
        Ok(read_lock(&self.data)?
            .values()
            .find(|g| g.name.to_lowercase() == needle)
            .cloned())
    }

    pub fn insert(&self, group: Group) -> CircleResult<Group> {
        let mut data = write_lock(&self.data)?;

        let needle = group.name.to_lowercase();
        if data.values().any(|g| g.name.to_lowercase() == needle) {
            return Err(CircleError::Duplicate {
                entity_type: "Group",
                identifier: group.name,
            });
        }

        data.insert(group.id, group.clone());
        self.persist(&data)?;
        Ok(group)
    }

    pub fn update_settings(
        &self,
        id: GroupId,
        threshold: Money,
        require_approval: bool,
    ) -> CircleResult<Group> {
        let mut data = write_lock(&self.data)?;
        let group = data
            .get_mut(&id)
            .ok_or_else(|| CircleError::group_not_found(id.to_string()))?;

        group.large_payment_threshold = threshold;
        group.require_approval_above_threshold = require_approval;
        group.updated_at = Utc::now();
        let updated = group.clone();

        self.persist(&data)?;
        Ok(updated)
    }

    /// Rename or re-describe a group; names stay unique
    pub fn update_details(
        &self,
        id: GroupId,
        name: Option<String>,
        description: Option<String>,
    ) -> CircleResult<Group> {
        let mut data = write_lock(&self.data)?;

        if let Some(name) = &name {
            let needle = name.trim().to_lowercase();
            if data
                .values()
                .any(|g| g.id != id && g.name.to_lowercase() == needle)
            {
                return Err(CircleError::Duplicate {
                    entity_type: "Group",
                    identifier: name.clone(),
                });
            }
        }

        let mut updated = data
            .get(&id)
            .cloned()
            .ok_or_else(|| CircleError::group_not_found(id.to_string()))?;
        if let Some(name) = name {
            updated.name = name.trim().to_string();
        }
        if let Some(description) = description {
            updated.description = description.trim().to_string();
        }
        updated.validate().map_err(CircleError::Validation)?;
        updated.updated_at = Utc::now();

        data.insert(id, updated.clone());
        self.persist(&data)?;
        Ok(updated)
    }

    /// `shared_wallet_balance += delta`, returning the new balance
    pub fn increment_balance(&self, id: GroupId, delta: Money) -> CircleResult<Money> {
        self.increment(id, |g| {
            g.shared_wallet_balance = g
                .shared_wallet_balance
                .checked_add(delta)
                .ok_or_else(|| CircleError::overflow(format!("group '{}'", g.name), delta))?;
            Ok(g.shared_wallet_balance)
        })
    }

    /// `total_spent += delta`, returning the new total
    pub fn increment_spent(&self, id: GroupId, delta: Money) -> CircleResult<Money> {
        self.increment(id, |g| {
            g.total_spent = g
                .total_spent
                .checked_add(delta)
                .ok_or_else(|| CircleError::overflow(format!("group '{}'", g.name), delta))?;
            Ok(g.total_spent)
        })
    }

    fn increment(
        &self,
        id: GroupId,
        apply: impl FnOnce(&mut Group) -> CircleResult<Money>,
    ) -> CircleResult<Money> {
        let mut data = write_lock(&self.data)?;
        let group = data
            .get_mut(&id)
            .ok_or_else(|| CircleError::group_not_found(id.to_string()))?;

        let value = apply(group)?;
        group.updated_at = Utc::now();

        self.persist(&data)?;
        Ok(value)
    }

    /// Every stored group, for [`GroupRepository::restore`]
    pub fn snapshot(&self) -> CircleResult<Vec<Group>> {
        Ok(read_lock(&self.data)?.values().cloned().collect())
    }

    /// Replace the contents (memory and file) with an earlier snapshot
    pub fn restore(&self, groups: Vec<Group>) -> CircleResult<()> {
        let mut data = write_lock(&self.data)?;
        *data = groups.into_iter().map(|g| (g.id, g)).collect();
        self.persist(&data)
    }

    pub fn count(&self) -> CircleResult<usize> {
        Ok(read_lock(&self.data)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, GroupRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = GroupRepository::new(temp_dir.path().join("groups.json"));
        (temp_dir, repo)
    }

    fn goa() -> Group {
        Group::new("Goa Trip", "INR", Money::from_major(50_000), true)
    }

    #[test]
    fn test_insert_and_get() {
        let (_temp, repo) = create_test_repo();
        let group = repo.insert(goa()).unwrap();

        assert_eq!(repo.get(group.id).unwrap().unwrap().name, "Goa Trip");
        assert!(repo.get_by_name("goa trip").unwrap().is_some());
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let (_temp, repo) = create_test_repo();
        repo.insert(goa()).unwrap();
        let result = repo.insert(Group::new("GOA TRIP", "INR", Money::zero(), false));
        assert!(matches!(result, Err(CircleError::Duplicate { .. })));
    }

    #[test]
    fn test_increments_accumulate_and_persist() {
        let (temp, repo) = create_test_repo();
        let group = repo.insert(goa()).unwrap();

        repo.increment_balance(group.id, Money::from_major(10_000)).unwrap();
        let balance = repo.increment_balance(group.id, Money::from_major(5000)).unwrap();
        assert_eq!(balance, Money::from_major(15_000));

        repo.increment_spent(group.id, Money::from_major(300)).unwrap();

        let reopened = GroupRepository::new(temp.path().join("groups.json"));
        reopened.load().unwrap();
        let stored = reopened.get(group.id).unwrap().unwrap();
        assert_eq!(stored.shared_wallet_balance, Money::from_major(15_000));
        assert_eq!(stored.total_spent, Money::from_major(300));
    }

    #[test]
    fn test_increment_unknown_group() {
        let (_temp, repo) = create_test_repo();
        let result = repo.increment_balance(GroupId::new(), Money::from_major(1));
        assert!(result.unwrap_err().is_not_found());
    }

    #[test]
    fn test_increment_overflow_leaves_balance_alone() {
        let (_temp, repo) = create_test_repo();
        let group = repo.insert(goa()).unwrap();
        repo.increment_balance(group.id, Money::from_cents(i64::MAX)).unwrap();

        let result = repo.increment_balance(group.id, Money::from_cents(1));
        assert!(result.unwrap_err().is_validation());
        assert_eq!(
            repo.get(group.id).unwrap().unwrap().shared_wallet_balance,
            Money::from_cents(i64::MAX)
        );
    }

    #[test]
    fn test_update_details() {
        let (_temp, repo) = create_test_repo();
        let group = repo.insert(goa()).unwrap();
        repo.insert(Group::new("Manali", "INR", Money::zero(), false)).unwrap();

        let renamed = repo
            .update_details(group.id, Some("Goa 2025".into()), Some("Beach week".into()))
            .unwrap();
        assert_eq!(renamed.name, "Goa 2025");
        assert_eq!(renamed.description, "Beach week");

        let clash = repo.update_details(group.id, Some("manali".into()), None);
        assert!(matches!(clash, Err(CircleError::Duplicate { .. })));
        assert!(repo.update_details(group.id, Some("  ".into()), None).is_err());
        assert_eq!(repo.get(group.id).unwrap().unwrap().name, "Goa 2025");
    }

    #[test]
    fn test_update_settings() {
        let (_temp, repo) = create_test_repo();
        let group = repo.insert(goa()).unwrap();

        let updated = repo
            .update_settings(group.id, Money::from_major(20_000), false)
            .unwrap();
        assert_eq!(updated.large_payment_threshold, Money::from_major(20_000));
        assert!(!updated.require_approval_above_threshold);
    }
}
