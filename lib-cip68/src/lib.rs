//! CIP-68 Tiered Token Data
//!
//! On-chain data shapes for a tiered reference/user token family:
//!
//! - [`PlutusData`]: untyped validator data and its CBOR encoding
//! - [`labels`]: CIP-67 asset name labels (100 reference, 444 user)
//! - [`Cip68Datum`]: the metadata datum locked with each reference token
//! - [`MintRedeemer`] / [`SpendRedeemer`]: the validator's redeemer shapes
//! - [`TierTable`]: static tier configuration (price, name, image)

pub mod datum;
pub mod errors;
pub mod labels;
pub mod plutus_data;
pub mod redeemer;
pub mod tier;

pub use datum::{Cip68Datum, CIP68_VERSION, TIER_KEY};
pub use errors::{Cip68Error, Cip68Result};
pub use labels::{
    from_label, labeled_asset_name, labeled_unit, split_label, to_label, REFERENCE_TOKEN_LABEL,
    RFT_LABEL,
};
pub use plutus_data::PlutusData;
pub use redeemer::{MintRedeemer, SpendRedeemer};
pub use tier::{Tier, TierSpec, TierTable, MAX_TIER};
