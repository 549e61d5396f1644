//! Transaction Building
//!
//! Everything needed off-chain to turn issuance intents into signed
//! transactions:
//!
//! - [`Wallet`]: BIP39 mnemonic and Ed25519 payment/stake keys
//! - [`NativeScript`] / [`PlutusScript`]: script handles and their hashes
//! - [`PolicyConfig`] / [`Deployment`]: the parameterized tiered validator
//! - [`TxBuilder`]: fluent builder with coin selection, min-ada and fees
//! - [`Transaction`]: ledger CBOR encoding, id and signing

pub mod builder;
pub mod cbor;
pub mod errors;
pub mod params;
pub mod policy;
pub mod script;
pub mod transaction;
pub mod wallet;

pub use builder::TxBuilder;
pub use cbor::{min_ada_for, output_size};
pub use errors::{TxError, TxResult};
pub use params::ProtocolParams;
pub use policy::{Deployment, PolicyConfig, ValidatorCode};
pub use script::{NativeScript, PlutusScript, Script, NATIVE_SCRIPT_TAG, PLUTUS_V2_TAG};
pub use transaction::{ExUnits, Redeemer, RedeemerPurpose, Transaction, TxBody, WitnessSet};
pub use wallet::{VKeyWitness, Wallet};
