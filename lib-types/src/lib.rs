//! Ledger primitives.
//! Stable, protocol-neutral, behavior-light.
//!
//! Every identifier is a fixed-size byte type; hex and bech32 only appear at
//! the edges (JSON, config files, logs).

pub mod address;
pub mod asset;
pub mod errors;
pub mod primitives;
pub mod value;

pub use address::{Address, Credential, Network};
pub use asset::{AssetName, Unit, LOVELACE_UNIT, MAX_ASSET_NAME_LEN};
pub use errors::{TypesError, TypesResult};
pub use primitives::{
    blake2b_224, blake2b_256, Amount, DataHash, KeyHash, PolicyId, ScriptHash, Slot, TxHash,
};
pub use value::Value;
