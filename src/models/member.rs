//! Family member model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{FamilyId, MemberId};
use super::share_ratio::ShareRatio;

/// Age bracket of a member; drives the default share ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemberType {
    #[default]
    Adult,
    Teenager,
    Child,
}

impl MemberType {
    /// Full share for adults, 80% for teenagers, 50% for children
    pub fn default_share_ratio(&self) -> ShareRatio {
        match self {
            Self::Adult => ShareRatio::FULL,
            Self::Teenager => ShareRatio::TEENAGER,
            Self::Child => ShareRatio::CHILD,
        }
    }

    pub fn is_adult(&self) -> bool {
        matches!(self, Self::Adult)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "adult" => Some(Self::Adult),
            "teenager" | "teen" => Some(Self::Teenager),
            "child" | "kid" => Some(Self::Child),
            _ => None,
        }
    }
}

impl fmt::Display for MemberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adult => write!(f, "Adult"),
            Self::Teenager => write!(f, "Teenager"),
            Self::Child => write!(f, "Child"),
        }
    }
}

/// A person who takes part in splits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,

    pub family_id: FamilyId,

    pub name: String,

    #[serde(rename = "type")]
    pub member_type: MemberType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,

    /// Missing in stored data means zero, i.e. never weighted into a split
    #[serde(default)]
    pub share_ratio: ShareRatio,

    pub created_at: DateTime<Utc>,
}

impl Member {
    /// Create a member with the default ratio for their type
    pub fn new(family_id: FamilyId, name: impl Into<String>, member_type: MemberType) -> Self {
        Self::with_ratio(family_id, name, member_type, member_type.default_share_ratio())
    }

    pub fn with_ratio(
        family_id: FamilyId,
        name: impl Into<String>,
        member_type: MemberType,
        share_ratio: ShareRatio,
    ) -> Self {
        Self {
            id: MemberId::new(),
            family_id,
            name: name.into(),
            member_type,
            age: None,
            share_ratio,
            created_at: Utc::now(),
        }
    }

    /// Members with a zero ratio are skipped when weights are totalled
    pub fn carries_weight(&self) -> bool {
        !self.share_ratio.is_zero()
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.member_type, self.share_ratio)
    }
}
