//! CIP-68 Errors

use lib_types::TypesError;
use thiserror::Error;

/// Error while encoding, decoding or interpreting on-chain data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Cip68Error {
    #[error("CBOR error: {0}")]
    Cbor(String),

    #[error("Unsupported CBOR item in Plutus data: {0}")]
    UnsupportedItem(String),

    #[error("Integer out of range: {0}")]
    IntegerOutOfRange(i128),

    #[error("Invalid datum shape: {0}")]
    InvalidDatum(String),

    #[error("Invalid tier {0}: tiers are numbered 1..={}", crate::tier::MAX_TIER)]
    InvalidTier(u8),

    #[error("Tier {0} is not configured")]
    UnknownTier(u8),

    #[error("Invalid tier table: {0}")]
    InvalidTierTable(String),

    #[error("Asset name error: {0}")]
    AssetName(#[from] TypesError),
}

/// Result type for CIP-68 operations
pub type Cip68Result<T> = Result<T, Cip68Error>;
