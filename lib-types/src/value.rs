//! Multi-Asset Value
//!
//! Lovelace plus a bag of native assets. Zero quantities are never stored,
//! so two values are equal iff they hold the same non-zero quantities.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::asset::Unit;
use crate::errors::{TypesError, TypesResult};
use crate::primitives::{Amount, PolicyId};

/// Lovelace plus native assets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    pub lovelace: Amount,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    assets: BTreeMap<Unit, Amount>,
}

impl Value {
    /// Empty value
    pub fn zero() -> Self {
        Self::default()
    }

    /// Pure-ada value
    pub fn from_lovelace(lovelace: Amount) -> Self {
        Self {
            lovelace,
            assets: BTreeMap::new(),
        }
    }

    /// Value holding only the given asset
    pub fn from_asset(unit: Unit, quantity: Amount) -> Self {
        let mut value = Self::zero();
        if quantity > 0 {
            value.assets.insert(unit, quantity);
        }
        value
    }

    /// Builder-style asset insertion (replaces any existing quantity)
    pub fn with_asset(mut self, unit: Unit, quantity: Amount) -> Self {
        if quantity == 0 {
            self.assets.remove(&unit);
        } else {
            self.assets.insert(unit, quantity);
        }
        self
    }

    /// Add a quantity of an asset
    pub fn add_asset(&mut self, unit: Unit, quantity: Amount) -> TypesResult<()> {
        if quantity == 0 {
            return Ok(());
        }
        let entry = self.assets.entry(unit).or_insert(0);
        *entry = entry.checked_add(quantity).ok_or(TypesError::Overflow)?;
        Ok(())
    }

    /// Quantity of one asset (0 if absent)
    pub fn quantity_of(&self, unit: &Unit) -> Amount {
        self.assets.get(unit).copied().unwrap_or(0)
    }

    /// Iterate over native assets
    pub fn assets(&self) -> impl Iterator<Item = (&Unit, &Amount)> {
        self.assets.iter()
    }

    /// Native assets under one policy
    pub fn assets_of_policy<'a>(
        &'a self,
        policy_id: &'a PolicyId,
    ) -> impl Iterator<Item = (&'a Unit, &'a Amount)> + 'a {
        self.assets.iter().filter(move |(unit, _)| &unit.policy_id == policy_id)
    }

    /// Number of distinct native assets
    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    pub fn has_assets(&self) -> bool {
        !self.assets.is_empty()
    }

    pub fn is_zero(&self) -> bool {
        self.lovelace == 0 && self.assets.is_empty()
    }

    /// Component-wise sum
    pub fn checked_add(&self, other: &Value) -> TypesResult<Value> {
        let mut out = self.clone();
        out.lovelace = out
            .lovelace
            .checked_add(other.lovelace)
            .ok_or(TypesError::Overflow)?;
        for (unit, quantity) in &other.assets {
            out.add_asset(unit.clone(), *quantity)?;
        }
        Ok(out)
    }

    /// Component-wise difference; `None` if any component would go negative
    pub fn checked_sub(&self, other: &Value) -> Option<Value> {
        let mut out = self.clone();
        out.lovelace = out.lovelace.checked_sub(other.lovelace)?;
        for (unit, quantity) in &other.assets {
            let have = out.quantity_of(unit);
            let left = have.checked_sub(*quantity)?;
            if left == 0 {
                out.assets.remove(unit);
            } else {
                out.assets.insert(unit.clone(), left);
            }
        }
        Some(out)
    }

    /// Difference clamped at zero per component
    pub fn saturating_sub(&self, other: &Value) -> Value {
        let mut out = Value::from_lovelace(self.lovelace.saturating_sub(other.lovelace));
        for (unit, quantity) in &self.assets {
            let left = quantity.saturating_sub(other.quantity_of(unit));
            if left > 0 {
                out.assets.insert(unit.clone(), left);
            }
        }
        out
    }

    /// True if every component of `other` is covered by `self`
    pub fn contains(&self, other: &Value) -> bool {
        self.lovelace >= other.lovelace
            && other
                .assets
                .iter()
                .all(|(unit, quantity)| self.quantity_of(unit) >= *quantity)
    }

    /// Same assets with the lovelace component dropped
    pub fn without_lovelace(&self) -> Value {
        Value {
            lovelace: 0,
            assets: self.assets.clone(),
        }
    }
}
