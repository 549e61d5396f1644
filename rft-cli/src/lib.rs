//! RFT CLI Library
//!
//! Issues a tiered family of CIP-68 tokens: a base asset used for payment,
//! one reference token per tier locked at the exchange contract, and user
//! tokens bought by paying a tier's price into the contract.
//!
//! ## Architecture
//!
//! This crate follows the **Functional Core, Imperative Shell** (FCIS) architecture pattern:
//!
//! - **Functional Core** (`logic/` module): Pure functions for business logic
//! - **Imperative Shell** (`commands/` module): Ledger access, signing and output
//! - **Error Handling** (`error/` module): Structured, domain-specific error types
//! - **Output Abstraction** (`output/` module): Testable printing interface

pub mod argument_parsing;
pub mod cli_config;
pub mod commands;

pub mod error;
pub mod logic;
pub mod output;

pub use argument_parsing::{format_output, run_cli, RftCli, RftCommand};
pub use commands::Context;
pub use error::{CliError, CliResult};
pub use output::Output;

/// RFT CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
