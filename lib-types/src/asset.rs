//! Asset Identifiers
//!
//! A native asset is identified by its minting policy id and an asset name
//! of at most 32 bytes. The concatenated hex form (`policy ++ name`) is the
//! "unit" string used by indexers and in JSON output.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::{TypesError, TypesResult};
use crate::primitives::PolicyId;

/// Maximum asset name length in bytes
pub const MAX_ASSET_NAME_LEN: usize = 32;

/// Unit string used for ada in indexer responses
pub const LOVELACE_UNIT: &str = "lovelace";

/// Asset name (0..=32 raw bytes)
#[derive(Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Default)]
pub struct AssetName(Vec<u8>);

impl AssetName {
    /// Create from raw bytes
    pub fn new(bytes: Vec<u8>) -> TypesResult<Self> {
        if bytes.len() > MAX_ASSET_NAME_LEN {
            return Err(TypesError::AssetNameTooLong(bytes.len()));
        }
        Ok(Self(bytes))
    }

    /// Create from UTF-8 text
    pub fn from_text(text: &str) -> TypesResult<Self> {
        Self::new(text.as_bytes().to_vec())
    }

    /// Parse from hex
    pub fn from_hex(s: &str) -> TypesResult<Self> {
        let bytes = hex::decode(s).map_err(|e| TypesError::InvalidHex(format!("{}: {}", s, e)))?;
        Self::new(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Lossy UTF-8 rendering for display
    pub fn to_text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl fmt::Debug for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetName({})", self.to_hex())
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Fully-qualified native asset (policy id + asset name)
#[derive(Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Unit {
    pub policy_id: PolicyId,
    pub asset_name: AssetName,
}

impl Unit {
    pub fn new(policy_id: PolicyId, asset_name: AssetName) -> Self {
        Self { policy_id, asset_name }
    }

    /// Parse `hex(policy) ++ hex(name)`
    pub fn from_hex(s: &str) -> TypesResult<Self> {
        let split = PolicyId::LEN * 2;
        if s.len() < split || !s.is_char_boundary(split) {
            return Err(TypesError::InvalidUnit(s.to_string()));
        }
        let (policy, name) = s.split_at(split);
        Ok(Self {
            policy_id: PolicyId::from_hex(policy)?,
            asset_name: AssetName::from_hex(name)?,
        })
    }

    pub fn to_hex(&self) -> String {
        format!("{}{}", self.policy_id.to_hex(), self.asset_name.to_hex())
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unit({})", self.to_hex())
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Unit {
    type Err = TypesError;

    fn from_str(s: &str) -> TypesResult<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for Unit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Unit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for AssetName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AssetName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
