//! Structured error types for the RFT CLI
//!
//! Wraps the library errors of each layer and adds the failures only the
//! command layer can detect (configuration, lookups before submission).

use lib_cip68::Cip68Error;
use lib_ledger::{LedgerError, Rejection};
use lib_tx::TxError;
use lib_types::{Network, PolicyId, TypesError};
use thiserror::Error;

/// RFT CLI error types with proper context
#[derive(Error, Debug)]
pub enum CliError {
    // Configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to load config from {path}: {reason}")]
    ConfigLoadFailed { path: String, reason: String },

    #[error("Invalid tier selection: {0}")]
    InvalidTier(String),

    // Issuance
    #[error("No contract UTXO holds the tier {tier} reference token")]
    ReferenceTokenNotFound { tier: u8 },

    #[error("Base policy {configured} is not controlled by this wallet (its policy is {owned})")]
    BasePolicyNotOwned { configured: PolicyId, owned: PolicyId },

    #[error("The demo only runs against the emulator, not {0}")]
    DemoRequiresEmulator(Network),

    // Lower layers
    #[error("Transaction build failed: {0}")]
    Tx(#[from] TxError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Token data error: {0}")]
    Data(#[from] Cip68Error),

    #[error("Invalid value: {0}")]
    Types(#[from] TypesError),

    // I/O operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // Serialization
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

impl CliError {
    /// The ledger's reason for rejecting a submitted transaction
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            CliError::Ledger(e) => e.rejection(),
            _ => None,
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
