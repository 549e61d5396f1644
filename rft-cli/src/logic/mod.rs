//! Pure functional business logic
//!
//! This module contains pure functions that implement business logic
//! without side effects. These functions can be tested independently
//! and composed together to build imperative shell functions.
//!
//! The key principle: All functions here are pure - they take inputs,
//! return outputs, and have no side effects (no I/O, no printing, no ledger access).

pub mod config;
pub mod render;
pub mod tokens;

// Re-export commonly used functions
pub use config::{
    blockfrost_url, build_tier_table, decode_validator_code, owner_policy, parse_network,
    policy_config, resolve_network, validate_output_format, EMULATOR_VALIDATOR_CODE,
};
pub use render::{policy_summary, token_kind, utxo_set_to_json, utxo_table, utxo_to_json};
pub use tokens::{find_reference_utxo, parse_tiers, reference_locks, total_quantity};
