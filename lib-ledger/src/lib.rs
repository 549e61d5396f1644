//! Ledger Backends
//!
//! [`LedgerClient`] is the capability the issuance actions run against.
//! Two backends implement it:
//!
//! - [`Emulator`]: in-memory ledger with full transaction validation and a
//!   pluggable [`ScriptEvaluator`] for Plutus scripts
//! - [`BlockfrostClient`]: live network access through a Blockfrost indexer

pub mod blockfrost;
pub mod client;
pub mod emulator;
pub mod errors;
pub mod evaluator;

pub use blockfrost::{BlockfrostClient, MAINNET_URL};
pub use client::{new_tx, LedgerClient};
pub use emulator::{Emulator, DEFAULT_GENESIS_LOVELACE};
pub use errors::{LedgerError, LedgerResult, Rejection};
pub use evaluator::{AcceptAll, ExchangeRules, ScriptContext, ScriptEvaluator, ScriptFailure};
