//! Tier Table
//!
//! Tiers are static configuration: each maps to a base-asset price, a
//! display name (which also becomes the token name) and an image reference.

use serde::{Deserialize, Serialize};
use std::fmt;

use lib_types::{Amount, PolicyId, Unit};

use crate::datum::Cip68Datum;
use crate::errors::{Cip68Error, Cip68Result};
use crate::labels::{labeled_unit, REFERENCE_TOKEN_LABEL, RFT_LABEL};

/// Highest tier index
pub const MAX_TIER: u8 = 3;

/// Tier index (1..=3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tier(u8);

impl Tier {
    pub fn new(index: u8) -> Cip68Result<Self> {
        if index == 0 || index > MAX_TIER {
            return Err(Cip68Error::InvalidTier(index));
        }
        Ok(Self(index))
    }

    pub fn index(&self) -> u8 {
        self.0
    }

    /// All tiers in ascending order
    pub fn all() -> impl Iterator<Item = Tier> {
        (1..=MAX_TIER).map(Tier)
    }
}

impl TryFrom<u8> for Tier {
    type Error = Cip68Error;

    fn try_from(value: u8) -> Cip68Result<Self> {
        Tier::new(value)
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> u8 {
        tier.0
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One configured tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSpec {
    pub tier: Tier,
    /// Display name, also the token name under both labels
    pub name: String,
    pub image: String,
    /// Price in base-asset units
    pub price: Amount,
}

impl TierSpec {
    /// Reference token unit (label 100)
    pub fn reference_unit(&self, policy_id: PolicyId) -> Cip68Result<Unit> {
        labeled_unit(policy_id, REFERENCE_TOKEN_LABEL, self.name.as_bytes())
    }

    /// User token unit (label 444)
    pub fn user_unit(&self, policy_id: PolicyId) -> Cip68Result<Unit> {
        labeled_unit(policy_id, RFT_LABEL, self.name.as_bytes())
    }

    /// Metadata datum locked with the reference token
    pub fn datum(&self, description: &str, version: i64) -> Cip68Datum {
        Cip68Datum::new(version)
            .with_metadata("name", &self.name)
            .with_metadata("description", description)
            .with_metadata("image", &self.image)
            .with_extra(crate::datum::TIER_KEY, &self.tier.to_string())
    }
}

/// Ordered set of configured tiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TierSpec>", into = "Vec<TierSpec>")]
pub struct TierTable {
    tiers: Vec<TierSpec>,
}

impl TierTable {
    /// Build a table; tiers must be exactly 1..=n in order with unique names
    pub fn new(tiers: Vec<TierSpec>) -> Cip68Result<Self> {
        if tiers.is_empty() {
            return Err(Cip68Error::InvalidTierTable("no tiers configured".into()));
        }
        for (position, spec) in tiers.iter().enumerate() {
            let expected = position as u8 + 1;
            if spec.tier.index() != expected {
                return Err(Cip68Error::InvalidTierTable(format!(
                    "tier at position {} is {}, expected {}",
                    position, spec.tier, expected
                )));
            }
            if spec.name.is_empty() {
                return Err(Cip68Error::InvalidTierTable(format!(
                    "tier {} has an empty name",
                    spec.tier
                )));
            }
        }
        for (i, a) in tiers.iter().enumerate() {
            if tiers[i + 1..].iter().any(|b| b.name == a.name) {
                return Err(Cip68Error::InvalidTierTable(format!(
                    "duplicate tier name '{}'",
                    a.name
                )));
            }
        }
        Ok(Self { tiers })
    }

    pub fn get(&self, tier: Tier) -> Cip68Result<&TierSpec> {
        self.tiers
            .iter()
            .find(|spec| spec.tier == tier)
            .ok_or(Cip68Error::UnknownTier(tier.index()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TierSpec> {
        self.tiers.iter()
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Prices in tier order, as used to parameterize the validator
    pub fn prices(&self) -> Vec<Amount> {
        self.tiers.iter().map(|spec| spec.price).collect()
    }
}

impl TryFrom<Vec<TierSpec>> for TierTable {
    type Error = Cip68Error;

    fn try_from(tiers: Vec<TierSpec>) -> Cip68Result<Self> {
        TierTable::new(tiers)
    }
}

impl From<TierTable> for Vec<TierSpec> {
    fn from(table: TierTable) -> Self {
        table.tiers
    }
}
