//! Share ratio: the weight a member carries when an expense is split
//!
//! Stored in basis points (1.0 == 10_000) so the allocator can work in exact
//! integer arithmetic. Serialized as a plain decimal (`0.8`).

use serde::{Deserialize, Serialize};
use std::fmt;

const FULL_SHARE_BP: u32 = 10_000;

/// A member's weight in a proportional split, in the range [0, 1]
///
/// Zero is representable because stored rows may carry no ratio at all; the
/// allocator treats such members as excluded rather than dividing by zero.
/// Ratios entered by a user go through [`ShareRatio::new`], which requires a
/// strictly positive value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ShareRatio(u32);

impl ShareRatio {
    pub const FULL: Self = Self(FULL_SHARE_BP);
    pub const TEENAGER: Self = Self(8_000);
    pub const CHILD: Self = Self(5_000);
    pub const ZERO: Self = Self(0);

    /// Create a ratio for a member expected to take part in splits: (0, 1]
    pub fn new(ratio: f64) -> Result<Self, ShareRatioError> {
        let parsed = Self::from_fraction(ratio)?;
        if parsed.is_zero() {
            return Err(ShareRatioError::NotPositive(ratio));
        }
        Ok(parsed)
    }

    /// Accept any fraction in [0, 1], rounding to the nearest basis point
    pub fn from_fraction(ratio: f64) -> Result<Self, ShareRatioError> {
        if !ratio.is_finite() || !(0.0..=1.0).contains(&ratio) {
            return Err(ShareRatioError::OutOfRange(ratio));
        }
        Ok(Self((ratio * FULL_SHARE_BP as f64).round() as u32))
    }

    pub const fn from_basis_points(bp: u32) -> Option<Self> {
        if bp > FULL_SHARE_BP {
            None
        } else {
            Some(Self(bp))
        }
    }

    pub const fn basis_points(&self) -> u32 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / FULL_SHARE_BP as f64
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Whole percentage for display, e.g. 80 for a teenager
    pub fn percent(&self) -> u32 {
        (self.0 + 50) / 100
    }
}

impl Default for ShareRatio {
    /// A missing ratio counts as zero, which keeps the member out of splits
    fn default() -> Self {
        Self::ZERO
    }
}

impl TryFrom<f64> for ShareRatio {
    type Error = ShareRatioError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::from_fraction(value)
    }
}

impl From<ShareRatio> for f64 {
    fn from(ratio: ShareRatio) -> Self {
        ratio.as_f64()
    }
}

impl fmt::Display for ShareRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShareRatioError {
    OutOfRange(f64),
    NotPositive(f64),
}

impl fmt::Display for ShareRatioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange(r) => write!(f, "share ratio {} is outside 0.0..=1.0", r),
            Self::NotPositive(r) => write!(f, "share ratio must be greater than zero, got {}", r),
        }
    }
}

impl std::error::Error for ShareRatioError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_positive() {
        assert_eq!(ShareRatio::new(0.8).unwrap(), ShareRatio::TEENAGER);
        assert_eq!(ShareRatio::new(0.0), Err(ShareRatioError::NotPositive(0.0)));
        assert!(matches!(
            ShareRatio::new(1.5),
            Err(ShareRatioError::OutOfRange(_))
        ));
        assert!(ShareRatio::new(f64::NAN).is_err());
    }

    #[test]
    fn test_from_fraction_allows_zero() {
        assert!(ShareRatio::from_fraction(0.0).unwrap().is_zero());
        assert_eq!(ShareRatio::from_fraction(0.33333).unwrap().basis_points(), 3333);
    }

    #[test]
    fn test_serde_as_decimal() {
        let json = serde_json::to_string(&ShareRatio::CHILD).unwrap();
        assert_eq!(json, "0.5");
        let back: ShareRatio = serde_json::from_str("0.8").unwrap();
        assert_eq!(back, ShareRatio::TEENAGER);
        assert!(serde_json::from_str::<ShareRatio>("-0.1").is_err());
    }

    #[test]
    fn test_display_percent() {
        assert_eq!(ShareRatio::TEENAGER.to_string(), "80%");
        assert_eq!(ShareRatio::FULL.to_string(), "100%");
    }
}
