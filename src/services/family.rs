//! Family and member management

use crate::audit::{AuditEntry, EntityType};
use crate::error::{CircleError, CircleResult};
use crate::models::{Family, FamilyId, GroupId, Member, MemberId, MemberType, ShareRatio};
use crate::storage::WalletStore;

/// A family with its members, for listings
#[derive(Debug, Clone)]
pub struct FamilyRoster {
    pub family: Family,
    pub members: Vec<Member>,
}

/// Input for [`FamilyService::add_member`]
#[derive(Debug, Clone)]
pub struct NewMember {
    pub name: String,
    pub member_type: MemberType,
    pub age: Option<u8>,
    /// Overrides the type's default ratio; must be in (0, 1]
    pub share_ratio: Option<f64>,
}

pub struct FamilyService<'a, S: WalletStore> {
    store: &'a S,
}

impl<'a, S: WalletStore> FamilyService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn add_family(&self, group_id: GroupId, name: &str) -> CircleResult<Family> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CircleError::Validation("Family name cannot be empty".into()));
        }

        let family = self.store.insert_family(Family::new(group_id, name))?;
        self.store.record_audit(AuditEntry::create(
            EntityType::Family,
            family.id.to_string(),
            Some(family.name.clone()),
            &family,
        ));
        tracing::info!(group = %group_id, family = %family.id, name = %family.name, "family added");

        Ok(family)
    }

    pub fn add_member(&self, family_id: FamilyId, new: NewMember) -> CircleResult<Member> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(CircleError::Validation("Member name cannot be empty".into()));
        }

        let mut member = match new.share_ratio {
            Some(ratio) => {
                let ratio = ShareRatio::new(ratio)
                    .map_err(|e| CircleError::Validation(format!("Invalid share ratio: {}", e)))?;
                Member::with_ratio(family_id, name, new.member_type, ratio)
            }
            None => Member::new(family_id, name, new.member_type),
        };
        member.age = new.age;

        let member = self.store.insert_member(member)?;
        self.store.record_audit(AuditEntry::create(
            EntityType::Member,
            member.id.to_string(),
            Some(member.name.clone()),
            &member,
        ));
        tracing::info!(
            family = %family_id,
            member = %member.id,
            share_ratio = %member.share_ratio,
            "member added"
        );

        Ok(member)
    }

    pub fn list(&self, group_id: GroupId) -> CircleResult<Vec<Family>> {
        self.store.fetch_families(group_id)
    }

    /// Every family of the group with its members
    pub fn rosters(&self, group_id: GroupId) -> CircleResult<Vec<FamilyRoster>> {
        let families = self.store.fetch_families(group_id)?;
        let ids: Vec<FamilyId> = families.iter().map(|f| f.id).collect();
        let mut members = self.store.fetch_members(&ids)?;

        Ok(families
            .into_iter()
            .map(|family| {
                let (mine, rest): (Vec<_>, Vec<_>) =
                    members.drain(..).partition(|m| m.family_id == family.id);
                members = rest;
                FamilyRoster {
                    family,
                    members: mine,
                }
            })
            .collect())
    }

    /// Every member of the group, in family order
    pub fn members(&self, group_id: GroupId) -> CircleResult<Vec<Member>> {
        let ids: Vec<FamilyId> = self
            .store
            .fetch_families(group_id)?
            .iter()
            .map(|f| f.id)
            .collect();
        self.store.fetch_members(&ids)
    }

    /// Find a family of the group by name, full id or short id
    pub fn find_family(&self, group_id: GroupId, identifier: &str) -> CircleResult<Family> {
        let families = self.store.fetch_families(group_id)?;
        let needle = identifier.trim().to_lowercase();
        let parsed = identifier.parse::<FamilyId>().ok();

        families
            .into_iter()
            .find(|f| {
                f.name.to_lowercase() == needle || Some(f.id) == parsed || f.id.short() == needle
            })
            .ok_or_else(|| CircleError::family_not_found(identifier))
    }

    /// Find a member of the group by name, full id or short id
    ///
    /// A name shared by members of different families is ambiguous.
    pub fn find_member(&self, group_id: GroupId, identifier: &str) -> CircleResult<Member> {
        let members = self.members(group_id)?;
        let needle = identifier.trim().to_lowercase();

        if let Ok(id) = identifier.parse::<MemberId>() {
            if let Some(member) = members.iter().find(|m| m.id == id) {
                return Ok(member.clone());
            }
        }
        if let Some(member) = members.iter().find(|m| m.id.short() == needle) {
            return Ok(member.clone());
        }

        let mut by_name = members.into_iter().filter(|m| m.name.to_lowercase() == needle);
        match (by_name.next(), by_name.next()) {
            (Some(member), None) => Ok(member),
            (Some(_), Some(_)) => Err(CircleError::Validation(format!(
                "More than one member is called '{}'; use the member id",
                identifier
            ))),
            (None, _) => Err(CircleError::member_not_found(identifier)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::CirclePaths;
    use crate::models::{Group, Money};
    use crate::storage::Storage;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Storage, Group) {
        let temp_dir = TempDir::new().unwrap();
        let paths = CirclePaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        let group = storage
            .insert_group(Group::new("Goa Trip", "INR", Money::from_major(50_000), true))
            .unwrap();
        (temp_dir, storage, group)
    }

    fn new_member(name: &str, member_type: MemberType) -> NewMember {
        NewMember {
            name: name.into(),
            member_type,
            age: None,
            share_ratio: None,
        }
    }

    #[test]
    fn test_member_gets_type_default_ratio() {
        let (_temp, storage, group) = setup();
        let service = FamilyService::new(&storage);
        let sharma = service.add_family(group.id, "Sharma").unwrap();

        let rohan = service
            .add_member(sharma.id, new_member("Rohan", MemberType::Teenager))
            .unwrap();
        assert_eq!(rohan.share_ratio, ShareRatio::TEENAGER);

        let mia = service
            .add_member(
                sharma.id,
                NewMember {
                    share_ratio: Some(0.3),
                    age: Some(6),
                    ..new_member("Mia", MemberType::Child)
                },
            )
            .unwrap();
        assert_eq!(mia.share_ratio.basis_points(), 3000);
        assert_eq!(mia.age, Some(6));
    }

    #[test]
    fn test_invalid_ratio_rejected() {
        let (_temp, storage, group) = setup();
        let service = FamilyService::new(&storage);
        let sharma = service.add_family(group.id, "Sharma").unwrap();

        for ratio in [0.0, 1.5, -0.2] {
            let result = service.add_member(
                sharma.id,
                NewMember {
                    share_ratio: Some(ratio),
                    ..new_member("Asha", MemberType::Adult)
                },
            );
            assert!(result.unwrap_err().is_validation(), "ratio {}", ratio);
        }
    }

    #[test]
    fn test_rosters_group_members_by_family() {
        let (_temp, storage, group) = setup();
        let service = FamilyService::new(&storage);
        let sharma = service.add_family(group.id, "Sharma").unwrap();
        let iyer = service.add_family(group.id, "Iyer").unwrap();

        service.add_member(sharma.id, new_member("Asha", MemberType::Adult)).unwrap();
        service.add_member(iyer.id, new_member("Dev", MemberType::Adult)).unwrap();
        service.add_member(sharma.id, new_member("Mia", MemberType::Child)).unwrap();

        let rosters = service.rosters(group.id).unwrap();
        assert_eq!(rosters.len(), 2);
        assert_eq!(rosters[0].family.id, sharma.id);
        assert_eq!(rosters[0].members.len(), 2);
        assert_eq!(rosters[1].members.len(), 1);
    }

    #[test]
    fn test_find_family_and_member() {
        let (_temp, storage, group) = setup();
        let service = FamilyService::new(&storage);
        let sharma = service.add_family(group.id, "Sharma").unwrap();
        let iyer = service.add_family(group.id, "Iyer").unwrap();

        assert_eq!(service.find_family(group.id, "sharma").unwrap().id, sharma.id);
        assert_eq!(service.find_family(group.id, &iyer.id.short()).unwrap().id, iyer.id);
        assert!(service.find_family(group.id, "Kapoor").unwrap_err().is_not_found());

        let asha = service.add_member(sharma.id, new_member("Asha", MemberType::Adult)).unwrap();
        assert_eq!(service.find_member(group.id, "asha").unwrap().id, asha.id);

        service.add_member(iyer.id, new_member("Asha", MemberType::Adult)).unwrap();
        assert!(service.find_member(group.id, "Asha").unwrap_err().is_validation());
        assert_eq!(service.find_member(group.id, &asha.id.to_string()).unwrap().id, asha.id);
    }

    #[test]
    fn test_family_requires_existing_group() {
        let (_temp, storage, _group) = setup();
        let service = FamilyService::new(&storage);
        assert!(service.add_family(GroupId::new(), "Ghost").unwrap_err().is_not_found());
    }
}
