//! Group report
//!
//! Totals, category and member breakdowns of confirmed payments, family
//! balances, and a check that the stored wallet balance matches the ledger.

use std::collections::HashMap;

use crate::engine::ledger_balance;
use crate::error::CircleResult;
use crate::models::{Category, Family, Group, GroupId, Member, MemberId, Money, Transaction};
use crate::storage::{TransactionOrder, WalletStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: Category,
    pub amount: Money,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct MemberSpend {
    pub member: Member,
    pub family_name: String,
    pub amount: Money,
}

#[derive(Debug, Clone)]
pub struct FamilyLine {
    pub family: Family,
    pub member_count: usize,
    /// Sum of this family's splits over confirmed payments
    pub spent: Money,
}

/// Stored wallet balance against confirmed deposits minus confirmed payments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub stored: Money,
    pub ledger: Money,
}

impl Reconciliation {
    pub fn difference(&self) -> Money {
        self.stored - self.ledger
    }

    pub fn is_balanced(&self) -> bool {
        self.difference().is_zero()
    }
}

#[derive(Debug, Clone)]
pub struct GroupReport {
    pub group: Group,
    pub total_deposits: Money,
    pub total_payments: Money,
    pub pending_count: usize,
    pub pending_amount: Money,
    /// Largest first
    pub categories: Vec<CategoryTotal>,
    /// Largest first
    pub members: Vec<MemberSpend>,
    pub families: Vec<FamilyLine>,
    pub reconciliation: Reconciliation,
}

pub struct ReportService<'a, S: WalletStore> {
    store: &'a S,
}

impl<'a, S: WalletStore> ReportService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn generate(&self, group_id: GroupId) -> CircleResult<GroupReport> {
        let group = self.store.fetch_group(group_id)?;
        let families = self.store.fetch_families(group_id)?;
        let family_ids: Vec<_> = families.iter().map(|f| f.id).collect();
        let members = self.store.fetch_members(&family_ids)?;
        let transactions = self
            .store
            .fetch_transactions(group_id, None, TransactionOrder::OldestFirst)?;

        let confirmed = || transactions.iter().filter(|t| t.is_confirmed());
        let total_deposits: Money = confirmed().filter(|t| t.is_deposit()).map(|t| t.amount).sum();
        let total_payments: Money = confirmed().filter(|t| t.is_payment()).map(|t| t.amount).sum();
        let pending: Vec<&Transaction> = transactions.iter().filter(|t| t.is_pending()).collect();

        let payments: Vec<&Transaction> = confirmed().filter(|t| t.is_payment()).collect();

        let report = GroupReport {
            pending_count: pending.len(),
            pending_amount: pending.iter().map(|t| t.amount).sum(),
            categories: category_breakdown(&payments),
            members: member_breakdown(&payments, &members, &families),
            families: family_lines(&payments, &members, families),
            reconciliation: Reconciliation {
                stored: group.shared_wallet_balance,
                ledger: ledger_balance(&transactions),
            },
            total_deposits,
            total_payments,
            group,
        };

        if !report.reconciliation.is_balanced() {
            tracing::warn!(
                group = %group_id,
                stored = %report.reconciliation.stored,
                ledger = %report.reconciliation.ledger,
                "wallet balance does not match the ledger"
            );
        }

        Ok(report)
    }
}

fn category_breakdown(payments: &[&Transaction]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<Category, (Money, usize)> = HashMap::new();
    for txn in payments {
        let entry = totals
            .entry(txn.category.unwrap_or_default())
            .or_insert((Money::zero(), 0));
        entry.0 += txn.amount;
        entry.1 += 1;
    }

    let mut lines: Vec<_> = totals
        .into_iter()
        .map(|(category, (amount, count))| CategoryTotal {
            category,
            amount,
            count,
        })
        .collect();
    lines.sort_by(|a, b| b.amount.cmp(&a.amount).then(a.category.cmp(&b.category)));
    lines
}

fn member_breakdown(
    payments: &[&Transaction],
    members: &[Member],
    families: &[Family],
) -> Vec<MemberSpend> {
    let mut spent: HashMap<MemberId, Money> = HashMap::new();
    for split in payments.iter().flat_map(|t| &t.splits) {
        *spent.entry(split.member_id).or_insert_with(Money::zero) += split.amount;
    }

    let mut lines: Vec<_> = members
        .iter()
        .filter_map(|member| {
            let amount = spent.get(&member.id).copied()?;
            let family_name = families
                .iter()
                .find(|f| f.id == member.family_id)
                .map(|f| f.name.clone())
                .unwrap_or_default();
            Some(MemberSpend {
                member: member.clone(),
                family_name,
                amount,
            })
        })
        .collect();
    lines.sort_by(|a, b| b.amount.cmp(&a.amount).then(a.member.name.cmp(&b.member.name)));
    lines
}

fn family_lines(
    payments: &[&Transaction],
    members: &[Member],
    families: Vec<Family>,
) -> Vec<FamilyLine> {
    families
        .into_iter()
        .map(|family| {
            let spent: Money = payments
                .iter()
                .flat_map(|t| &t.splits)
                .filter(|s| s.family_id == family.id)
                .map(|s| s.amount)
                .sum();
            FamilyLine {
                member_count: members.iter().filter(|m| m.family_id == family.id).count(),
                spent,
                family,
            }
        })
        .collect()
}
