//! Multi-Asset UTXO Execution
//!
//! This crate provides the canonical UTXO application logic shared by the
//! simulated ledger and the transaction builder.
//!
//! # Key Rules
//!
//! 1. **Inputs must exist**: All referenced UTXOs must be present in state
//! 2. **No double spend**: Each UTXO can only be spent once
//! 3. **Conservation**: inputs + mint == outputs + fee, per asset
//! 4. **Atomicity**: a rejected transaction leaves the store untouched
//!
//! # Usage
//!
//! ```ignore
//! use lib_utxo::{apply_transaction, MemoryUtxoStore};
//!
//! let outcome = apply_transaction(&store, &tx, tx_hash, slot)?;
//! ```

pub mod apply;
pub mod errors;
pub mod memory;
pub mod types;

pub use apply::apply_transaction;
pub use errors::{UtxoError, UtxoResult};
pub use memory::MemoryUtxoStore;
pub use types::*;
