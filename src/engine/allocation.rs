//! Weighted proportional allocation of an amount across participants
//!
//! Each participant gets `amount * ratio / total_ratio`, computed in minor
//! units and basis points with integer arithmetic. Shares are floored, and
//! the leftover minor units all go to the weighted participant with the
//! lowest member id, so the shares always add back up to `amount`.

use std::collections::BTreeMap;

use crate::error::{CircleError, CircleResult};
use crate::models::{FamilyId, Member, MemberId, Money, TransactionSplit};

/// One participant's slice of an allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberShare {
    pub member_id: MemberId,
    pub family_id: FamilyId,
    pub amount: Money,
}

/// Result of [`allocate`]: shares keyed in canonical member-id order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    shares: Vec<MemberShare>,
}

impl Allocation {
    pub fn shares(&self) -> &[MemberShare] {
        &self.shares
    }

    pub fn share_of(&self, member_id: MemberId) -> Option<Money> {
        self.shares
            .iter()
            .find(|s| s.member_id == member_id)
            .map(|s| s.amount)
    }

    /// Always equal to the allocated amount
    pub fn total(&self) -> Money {
        self.shares.iter().map(|s| s.amount).sum()
    }

    /// Member shares summed per family
    pub fn per_family(&self) -> BTreeMap<FamilyId, Money> {
        let mut totals = BTreeMap::new();
        for share in &self.shares {
            *totals.entry(share.family_id).or_insert_with(Money::zero) += share.amount;
        }
        totals
    }

    pub fn as_map(&self) -> BTreeMap<MemberId, Money> {
        self.shares.iter().map(|s| (s.member_id, s.amount)).collect()
    }

    /// Rows for the transaction's stored splits
    pub fn to_splits(&self) -> Vec<TransactionSplit> {
        self.shares
            .iter()
            .map(|s| TransactionSplit {
                member_id: s.member_id,
                family_id: s.family_id,
                amount: s.amount,
            })
            .collect()
    }
}

/// Split `amount` across `participants` in proportion to their share ratios
///
/// Participants with a zero ratio stay in the result with a zero share but
/// do not count toward the total weight.
///
/// # Errors
///
/// * [`CircleError::InvalidAmount`] if `amount` is not positive
/// * [`CircleError::NoParticipants`] if nobody carries a positive ratio
pub fn allocate(amount: Money, participants: &[Member]) -> CircleResult<Allocation> {
    if !amount.is_positive() {
        return Err(CircleError::InvalidAmount(amount));
    }

    let mut ordered: Vec<&Member> = participants.iter().collect();
    ordered.sort_by_key(|m| m.id);
    ordered.dedup_by_key(|m| m.id);

    let total_ratio: i128 = ordered
        .iter()
        .map(|m| i128::from(m.share_ratio.basis_points()))
        .sum();
    if total_ratio == 0 {
        return Err(CircleError::NoParticipants);
    }

    let cents = i128::from(amount.cents());
    let mut shares: Vec<MemberShare> = ordered
        .iter()
        .map(|m| {
            let raw = cents * i128::from(m.share_ratio.basis_points()) / total_ratio;
            MemberShare {
                member_id: m.id,
                family_id: m.family_id,
                // raw <= cents, which came from an i64
                amount: Money::from_cents(raw as i64),
            }
        })
        .collect();

    let allocated: Money = shares.iter().map(|s| s.amount).sum();
    let residue = amount - allocated;
    if !residue.is_zero() {
        let first_weighted = ordered
            .iter()
            .position(|m| m.carries_weight())
            .ok_or(CircleError::NoParticipants)?;
        shares[first_weighted].amount += residue;
    }

    tracing::debug!(
        amount = %amount,
        participants = shares.len(),
        residue = %residue,
        "allocated split"
    );

    Ok(Allocation { shares })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MemberType, ShareRatio};
    use uuid::Uuid;

    fn member(n: u128, member_type: MemberType, ratio: f64, family: FamilyId) -> Member {
        let mut m = Member::with_ratio(
            family,
            format!("m{}", n),
            member_type,
            ShareRatio::from_fraction(ratio).unwrap(),
        );
        m.id = MemberId::from_uuid(Uuid::from_u128(n));
        m
    }

    #[test]
    fn test_even_adult_split() {
        let family = FamilyId::new();
        let a = member(1, MemberType::Adult, 1.0, family);
        let d = member(4, MemberType::Adult, 1.0, family);

        let allocation = allocate(Money::from_major(900), &[a.clone(), d.clone()]).unwrap();
        assert_eq!(allocation.share_of(a.id), Some(Money::from_major(450)));
        assert_eq!(allocation.share_of(d.id), Some(Money::from_major(450)));
    }

    #[test]
    fn test_weighted_split_reconciles_exactly() {
        let family = FamilyId::new();
        let a = member(1, MemberType::Adult, 1.0, family);
        let b = member(2, MemberType::Teenager, 0.8, family);
        let c = member(3, MemberType::Child, 0.5, family);

        let amount = Money::from_major(1000);
        let allocation = allocate(amount, &[a.clone(), b.clone(), c.clone()]).unwrap();

        assert_eq!(allocation.total(), amount);
        // raw shares 434.78.., 347.82.., 217.39..; the spare paisa lands on A
        assert_eq!(allocation.share_of(a.id), Some(Money::from_cents(43_479)));
        assert_eq!(allocation.share_of(b.id), Some(Money::from_cents(34_782)));
        assert_eq!(allocation.share_of(c.id), Some(Money::from_cents(21_739)));
    }

    #[test]
    fn test_shares_always_sum_to_amount() {
        let family = FamilyId::new();
        let ratios = [1.0, 0.8, 0.5, 0.33, 0.07, 1.0, 0.5];
        let participants: Vec<Member> = ratios
            .iter()
            .enumerate()
            .map(|(i, r)| member(i as u128 + 1, MemberType::Adult, *r, family))
            .collect();

        for cents in [1, 2, 3, 7, 99, 100, 101, 12_345, 99_999_99, 1_000_000_01] {
            for n in 1..=participants.len() {
                let amount = Money::from_cents(cents);
                let allocation = allocate(amount, &participants[..n]).unwrap();
                assert_eq!(allocation.total(), amount, "cents={} n={}", cents, n);
                assert!(allocation.shares().iter().all(|s| !s.amount.is_negative()));
            }
        }
    }

    #[test]
    fn test_residue_goes_to_lowest_id_regardless_of_input_order() {
        let family = FamilyId::new();
        let low = member(1, MemberType::Adult, 1.0, family);
        let mid = member(2, MemberType::Adult, 1.0, family);
        let high = member(3, MemberType::Adult, 1.0, family);

        let forward =
            allocate(Money::from_cents(100), &[low.clone(), mid.clone(), high.clone()]).unwrap();
        let backward = allocate(Money::from_cents(100), &[high, mid, low.clone()]).unwrap();

        assert_eq!(forward, backward);
        assert_eq!(forward.share_of(low.id), Some(Money::from_cents(34)));
    }

    #[test]
    fn test_empty_participants_rejected() {
        let result = allocate(Money::from_major(100), &[]);
        assert!(matches!(result, Err(CircleError::NoParticipants)));
    }

    #[test]
    fn test_all_zero_ratios_rejected() {
        let family = FamilyId::new();
        let ghost = member(1, MemberType::Adult, 0.0, family);
        let result = allocate(Money::from_major(100), &[ghost]);
        assert!(matches!(result, Err(CircleError::NoParticipants)));
    }

    #[test]
    fn test_zero_ratio_member_gets_nothing() {
        let family = FamilyId::new();
        let ghost = member(1, MemberType::Adult, 0.0, family);
        let payer = member(2, MemberType::Adult, 1.0, family);

        let allocation =
            allocate(Money::from_cents(1001), &[ghost.clone(), payer.clone()]).unwrap();
        assert_eq!(allocation.share_of(ghost.id), Some(Money::zero()));
        assert_eq!(allocation.share_of(payer.id), Some(Money::from_cents(1001)));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let family = FamilyId::new();
        let a = member(1, MemberType::Adult, 1.0, family);
        assert!(matches!(
            allocate(Money::zero(), &[a.clone()]),
            Err(CircleError::InvalidAmount(_))
        ));
        assert!(matches!(
            allocate(Money::from_cents(-5), &[a]),
            Err(CircleError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_per_family_totals() {
        let sharma = FamilyId::new();
        let iyer = FamilyId::new();
        let a = member(1, MemberType::Adult, 1.0, sharma);
        let b = member(2, MemberType::Child, 0.5, sharma);
        let c = member(3, MemberType::Adult, 1.0, iyer);

        let amount = Money::from_major(2500);
        let allocation = allocate(amount, &[a, b, c]).unwrap();
        let per_family = allocation.per_family();

        assert_eq!(per_family[&sharma], Money::from_major(1500));
        assert_eq!(per_family[&iyer], Money::from_major(1000));
        assert_eq!(per_family.values().copied().sum::<Money>(), amount);
    }
}
