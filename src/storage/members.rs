//! Member repository (members.json)

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{CircleError, CircleResult};
use crate::models::{FamilyId, Member, MemberId};

use super::file_io::{read_json, read_lock, write_json_atomic, write_lock};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct MemberData {
    members: Vec<Member>,
}

pub struct MemberRepository {
    path: PathBuf,
    data: RwLock<HashMap<MemberId, Member>>,
}

impl MemberRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> CircleResult<()> {
        let file_data: MemberData = read_json(&self.path)?;
        let mut data = write_lock(&self.data)?;

        data.clear();
        for member in file_data.members {
            data.insert(member.id, member);
        }
        Ok(())
    }

    pub fn get(&self, id: MemberId) -> CircleResult<Option<Member>> {
        Ok(read_lock(&self.data)?.get(&id).cloned())
    }

    /// Members of the listed families, grouped in the order the families are given
    pub fn get_by_families(&self, family_ids: &[FamilyId]) -> CircleResult<Vec<Member>> {
        let data = read_lock(&self.data)?;

        let mut members = Vec::new();
        for family_id in family_ids {
            let mut family: Vec<_> = data
                .values()
                .filter(|m| m.family_id == *family_id)
                .cloned()
                .collect();
            family.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
            members.extend(family);
        }
        Ok(members)
    }

    /// Member names are unique within a family
    pub fn insert(&self, member: Member) -> CircleResult<Member> {
        let mut data = write_lock(&self.data)?;

        let needle = member.name.to_lowercase();
        if data
            .values()
            .any(|m| m.family_id == member.family_id && m.name.to_lowercase() == needle)
        {
            return Err(CircleError::Duplicate {
                entity_type: "Member",
                identifier: member.name,
            });
        }

        data.insert(member.id, member.clone());

        let mut members: Vec<_> = data.values().cloned().collect();
        members.sort_by_key(|m| m.created_at);
        write_json_atomic(&self.path, &MemberData { members })?;

        Ok(member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MemberType;
    use tempfile::TempDir;

    #[test]
    fn test_members_follow_family_order() {
        let temp_dir = TempDir::new().unwrap();
        let repo = MemberRepository::new(temp_dir.path().join("members.json"));
        let sharma = FamilyId::new();
        let iyer = FamilyId::new();

        let dev = repo.insert(Member::new(iyer, "Dev", MemberType::Adult)).unwrap();
        let asha = repo.insert(Member::new(sharma, "Asha", MemberType::Adult)).unwrap();
        repo.insert(Member::new(FamilyId::new(), "Zed", MemberType::Adult))
            .unwrap();

        let members = repo.get_by_families(&[sharma, iyer]).unwrap();
        let ids: Vec<_> = members.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![asha.id, dev.id]);
    }

    #[test]
    fn test_duplicate_name_in_family_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let repo = MemberRepository::new(temp_dir.path().join("members.json"));
        let family = FamilyId::new();

        repo.insert(Member::new(family, "Mia", MemberType::Child)).unwrap();
        let result = repo.insert(Member::new(family, "MIA", MemberType::Child));
        assert!(matches!(result, Err(CircleError::Duplicate { .. })));
    }

    #[test]
    fn test_persisted_share_ratio_survives_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("members.json");
        let repo = MemberRepository::new(path.clone());
        let rohan = repo
            .insert(Member::new(FamilyId::new(), "Rohan", MemberType::Teenager))
            .unwrap();

        let reopened = MemberRepository::new(path);
        reopened.load().unwrap();
        let stored = reopened.get(rohan.id).unwrap().unwrap();
        assert_eq!(stored.share_ratio, rohan.share_ratio);
        assert_eq!(stored.member_type, MemberType::Teenager);
    }
}
