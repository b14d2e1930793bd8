//! Participant selection for a split policy

use std::collections::{BTreeSet, HashSet};

use crate::models::{Member, MemberId, SplitPolicy};

/// Resolve which members share a payment
///
/// `members` is every member across the group's families, in display order;
/// the result keeps that order and never contains the same member twice.
/// `custom_selection` is only read for [`SplitPolicy::Custom`], where ids that
/// match no known member are dropped.
///
/// An empty result is not an error here. [`super::allocate`] is where an
/// empty or weightless participant set is rejected.
pub fn select_participants(
    policy: SplitPolicy,
    members: &[Member],
    custom_selection: &BTreeSet<MemberId>,
) -> Vec<Member> {
    let mut seen = HashSet::new();
    members
        .iter()
        .filter(|m| match policy {
            SplitPolicy::Everyone => true,
            SplitPolicy::AdultsOnly => m.member_type.is_adult(),
            SplitPolicy::KidsOnly => !m.member_type.is_adult(),
            SplitPolicy::Custom => custom_selection.contains(&m.id),
        })
        .filter(|m| seen.insert(m.id))
        .cloned()
        .collect()
}
