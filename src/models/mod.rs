//! Core data models for Circle Wallet
//!
//! Plain records for the wallet domain: groups, families, members and the
//! transactions against a group's shared wallet.

pub mod family;
pub mod group;
pub mod ids;
pub mod member;
pub mod money;
pub mod share_ratio;
pub mod transaction;

pub use family::Family;
pub use group::Group;
pub use ids::{FamilyId, GroupId, MemberId, TransactionId};
pub use member::{Member, MemberType};
pub use money::{Money, MoneyParseError};
pub use share_ratio::{ShareRatio, ShareRatioError};
pub use transaction::{
    Category, SplitPolicy, Transaction, TransactionKind, TransactionSplit, TransactionStatus,
};
