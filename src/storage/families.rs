//! Family repository (families.json)

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{CircleError, CircleResult};
use crate::models::{Family, FamilyId, GroupId, Money};

use super::file_io::{read_json, read_lock, write_json_atomic, write_lock};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct FamilyData {
    families: Vec<Family>,
}

pub struct FamilyRepository {
    path: PathBuf,
    data: RwLock<HashMap<FamilyId, Family>>,
}

impl FamilyRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> CircleResult<()> {
        let file_data: FamilyData = read_json(&self.path)?;
        let mut data = write_lock(&self.data)?;

        data.clear();
        for family in file_data.families {
            data.insert(family.id, family);
        }
        Ok(())
    }

    fn persist(&self, data: &HashMap<FamilyId, Family>) -> CircleResult<()> {
        let mut families: Vec<_> = data.values().cloned().collect();
        families.sort_by_key(|f| f.created_at);
        write_json_atomic(&self.path, &FamilyData { families })
    }

    pub fn get(&self, id: FamilyId) -> CircleResult<Option<Family>> {
        Ok(read_lock(&self.data)?.get(&id).cloned())
    }

    /// Families of a group, oldest first
    pub fn get_by_group(&self, group_id: GroupId) -> CircleResult<Vec<Family>> {
        let mut families: Vec<_> = read_lock(&self.data)?
            .values()
            .filter(|f| f.group_id == group_id)
            .cloned()
            .collect();
        families.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        Ok(families)
    }

    pub fn get_by_name(&self, group_id: GroupId, name: &str) -> CircleResult<Option<Family>> {
        let needle = name.trim().to_lowercase();
        Ok(read_lock(&self.data)?
            .values()
            .find(|f| f.group_id == group_id && f.name.to_lowercase() == needle)
            .cloned())
    }

    /// Family names are unique within a group
    pub fn insert(&self, family: Family) -> CircleResult<Family> {
        let mut data = write_lock(&self.data)?;

        let needle = family.name.to_lowercase();
        if data
            .values()
            .any(|f| f.group_id == family.group_id && f.name.to_lowercase() == needle)
        {
            return Err(CircleError::Duplicate {
                entity_type: "Family",
                identifier: family.name,
            });
        }

        data.insert(family.id, family.clone());
        self.persist(&data)?;
        Ok(family)
    }

    pub fn increment_balance(&self, id: FamilyId, delta: Money) -> CircleResult<Money> {
        self.increment(id, |f| {
            f.balance = f
                .balance
                .checked_add(delta)
                .ok_or_else(|| CircleError::overflow(format!("family '{}'", f.name), delta))?;
            Ok(f.balance)
        })
    }

    pub fn increment_contribution(&self, id: FamilyId, delta: Money) -> CircleResult<Money> {
        self.increment(id, |f| {
            f.total_contribution = f
                .total_contribution
                .checked_add(delta)
                .ok_or_else(|| CircleError::overflow(format!("family '{}'", f.name), delta))?;
            Ok(f.total_contribution)
        })
    }

    fn increment(
        &self,
        id: FamilyId,
        apply: impl FnOnce(&mut Family) -> CircleResult<Money>,
    ) -> CircleResult<Money> {
        let mut data = write_lock(&self.data)?;
        let family = data
            .get_mut(&id)
            .ok_or_else(|| CircleError::family_not_found(id.to_string()))?;

        let value = apply(family)?;
        self.persist(&data)?;
        Ok(value)
    }

    pub fn snapshot(&self) -> CircleResult<Vec<Family>> {
        Ok(read_lock(&self.data)?.values().cloned().collect())
    }

    pub fn restore(&self, families: Vec<Family>) -> CircleResult<()> {
        let mut data = write_lock(&self.data)?;
        *data = families.into_iter().map(|f| (f.id, f)).collect();
        self.persist(&data)
    }
}
