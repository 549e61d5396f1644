//! Canonical Primitive Types
//!
//! Fixed-size hashes and scalar aliases shared by every crate in the
//! workspace. Hashes are compared and stored as raw bytes and rendered as
//! lowercase hex everywhere they leave the process (JSON, config, logs).

use blake2::digest::consts::{U28, U32};
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::{TypesError, TypesResult};

// ============================================================================
// TYPE ALIASES
// ============================================================================

/// Token quantities and lovelace amounts
pub type Amount = u64;

/// Ledger slot number
pub type Slot = u64;

// ============================================================================
// HASHING
// ============================================================================

type Blake2b224 = Blake2b<U28>;
type Blake2b256 = Blake2b<U32>;

/// blake2b-224, used for key hashes and script hashes
pub fn blake2b_224(data: &[u8]) -> [u8; 28] {
    let mut hasher = Blake2b224::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; 28];
    out.copy_from_slice(&digest);
    out
}

/// blake2b-256, used for transaction ids and key derivation
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

// ============================================================================
// HASH TYPES
// ============================================================================

macro_rules! fixed_hash {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Length in bytes
            pub const LEN: usize = $len;

            /// Create from raw bytes
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Get the underlying bytes
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Build from a slice, checking the length
            pub fn from_slice(bytes: &[u8]) -> TypesResult<Self> {
                if bytes.len() != $len {
                    return Err(TypesError::InvalidLength {
                        expected: $len,
                        got: bytes.len(),
                    });
                }
                let mut out = [0u8; $len];
                out.copy_from_slice(bytes);
                Ok(Self(out))
            }

            /// Parse from a hex string
            pub fn from_hex(s: &str) -> TypesResult<Self> {
                let bytes = hex::decode(s.trim())
                    .map_err(|e| TypesError::InvalidHex(format!("{}: {}", s, e)))?;
                Self::from_slice(&bytes)
            }

            /// Lowercase hex encoding
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(&self.0[..8]))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = TypesError;

            fn from_str(s: &str) -> TypesResult<Self> {
                Self::from_hex(s)
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_hash!(
    /// 32-byte transaction id (blake2b-256 of the encoded body)
    TxHash,
    32
);

fixed_hash!(
    /// 28-byte verification key hash
    KeyHash,
    28
);

fixed_hash!(
    /// 28-byte script hash
    ScriptHash,
    28
);

fixed_hash!(
    /// 32-byte hash over witness data (script data hash)
    DataHash,
    32
);

/// Minting policy ids are script hashes
pub type PolicyId = ScriptHash;

impl DataHash {
    pub fn digest(data: &[u8]) -> Self {
        Self(blake2b_256(data))
    }
}

impl TxHash {
    /// Hash arbitrary bytes into a transaction id
    pub fn digest(data: &[u8]) -> Self {
        Self(blake2b_256(data))
    }
}

impl KeyHash {
    /// Hash a verification key
    pub fn of_key(verifying_key: &[u8]) -> Self {
        Self(blake2b_224(verifying_key))
    }
}

impl ScriptHash {
    /// Hash a script with its language tag prefix
    pub fn of_script(language_tag: u8, script_bytes: &[u8]) -> Self {
        let mut buf = Vec::with_capacity(script_bytes.len() + 1);
        buf.push(language_tag);
        buf.extend_from_slice(script_bytes);
        Self(blake2b_224(&buf))
    }
}

// ============================================================================
// TESTS
// ============================================================================
