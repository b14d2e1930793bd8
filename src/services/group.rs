//! Group service
//!
//! Creating groups, resolving them from user input, renaming them, and
//! changing their approval settings.

use crate::audit::{AuditEntry, EntityType};
use crate::config::Settings;
use crate::error::{CircleError, CircleResult};
use crate::models::{Group, GroupId, Money};
use crate::storage::WalletStore;

/// Optional overrides for [`GroupService::create`]; unset fields come from settings
#[derive(Debug, Clone, Default)]
pub struct NewGroup {
    pub name: String,
    pub description: Option<String>,
    pub currency: Option<String>,
    pub large_payment_threshold: Option<Money>,
    pub require_approval: Option<bool>,
}

pub struct GroupService<'a, S: WalletStore> {
    store: &'a S,
}

impl<'a, S: WalletStore> GroupService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn create(&self, new: NewGroup, settings: &Settings) -> CircleResult<Group> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(CircleError::Validation("Group name cannot be empty".into()));
        }

        let mut group = Group::new(
            name,
            new.currency
                .unwrap_or_else(|| settings.currency_code.clone())
                .to_uppercase(),
            new.large_payment_threshold
                .unwrap_or(settings.default_large_payment_threshold),
            new.require_approval
                .unwrap_or(settings.default_require_approval),
        );
        if let Some(description) = new.description {
            group.description = description.trim().to_string();
        }
        group.validate().map_err(CircleError::Validation)?;

        let group = self.store.insert_group(group)?;
        self.store.record_audit(AuditEntry::create(
            EntityType::Group,
            group.id.to_string(),
            Some(group.name.clone()),
            &group,
        ));
        tracing::info!(group = %group.id, name = %group.name, "group created");

        Ok(group)
    }

    pub fn get(&self, id: GroupId) -> CircleResult<Group> {
        self.store.fetch_group(id)
    }

    pub fn list(&self) -> CircleResult<Vec<Group>> {
        self.store.fetch_groups()
    }

    /// Find a group by name (case-insensitive), full id, or short id
    pub fn find(&self, identifier: &str) -> CircleResult<Option<Group>> {
        let groups = self.store.fetch_groups()?;
        let needle = identifier.trim().to_lowercase();

        if let Some(group) = groups.iter().find(|g| g.name.to_lowercase() == needle) {
            return Ok(Some(group.clone()));
        }
        if let Ok(id) = identifier.parse::<GroupId>() {
            return Ok(groups.into_iter().find(|g| g.id == id));
        }
        Ok(groups.into_iter().find(|g| g.id.short() == needle))
    }

    /// The named group, or the only group when no name is given
    pub fn resolve(&self, identifier: Option<&str>) -> CircleResult<Group> {
        if let Some(identifier) = identifier {
            return self
                .find(identifier)?
                .ok_or_else(|| CircleError::group_not_found(identifier));
        }

        let mut groups = self.store.fetch_groups()?;
        match groups.len() {
            0 => Err(CircleError::Validation(
                "No groups yet. Create one with 'circle group create <name>'".into(),
            )),
            1 => Ok(groups.remove(0)),
            _ => Err(CircleError::Validation(
                "Several groups exist; choose one with --group".into(),
            )),
        }
    }

    /// Rename a group and/or replace its description (empty clears it)
    pub fn update_details(
        &self,
        id: GroupId,
        name: Option<String>,
        description: Option<String>,
    ) -> CircleResult<Group> {
        if name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(CircleError::Validation("Group name cannot be empty".into()));
        }
        let before = self.store.fetch_group(id)?;

        let after = self.store.update_group_details(id, name, description)?;
        self.store.record_audit(AuditEntry::update(
            EntityType::Group,
            id.to_string(),
            Some(after.name.clone()),
            &before,
            &after,
        ));
        tracing::info!(group = %id, name = %after.name, "group details updated");

        Ok(after)
    }

    /// Change the threshold and/or the approval flag
    pub fn update_settings(
        &self,
        id: GroupId,
        large_payment_threshold: Option<Money>,
        require_approval: Option<bool>,
    ) -> CircleResult<Group> {
        let before = self.store.fetch_group(id)?;

        let threshold = large_payment_threshold.unwrap_or(before.large_payment_threshold);
        if threshold.is_negative() {
            return Err(CircleError::Validation(
                "Large payment threshold cannot be negative".into(),
            ));
        }
        let require = require_approval.unwrap_or(before.require_approval_above_threshold);

        let after = self.store.update_group_settings(id, threshold, require)?;
        self.store.record_audit(AuditEntry::update(
            EntityType::Group,
            id.to_string(),
            Some(after.name.clone()),
            &before,
            &after,
        ));
        tracing::info!(
            group = %id,
            threshold = %after.large_payment_threshold,
            require_approval = after.require_approval_above_threshold,
            "group approval settings updated"
        );

        Ok(after)
    }
}
