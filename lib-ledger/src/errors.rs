//! Ledger Errors

use lib_tx::TxError;
use lib_types::{Amount, DataHash, KeyHash, ScriptHash, TxHash};
use lib_utxo::{OutPoint, UtxoError};
use thiserror::Error;

use crate::evaluator::ScriptFailure;

/// Why a ledger refused a transaction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("{0}")]
    Utxo(#[from] UtxoError),

    #[error("Fee {fee} below minimum {required}")]
    FeeTooLow { fee: Amount, required: Amount },

    #[error("Output {index} holds {lovelace} lovelace, minimum is {required}")]
    OutputBelowMinAda { index: usize, lovelace: Amount, required: Amount },

    #[error("Malformed transaction: {0}")]
    Malformed(String),

    #[error("Transaction size {size} exceeds {max}")]
    TooLarge { size: usize, max: usize },

    #[error("Redeemers present but the body carries no script data hash")]
    MissingScriptDataHash,

    #[error("Script data hash {found} does not match {expected}")]
    ScriptDataHashMismatch { found: DataHash, expected: DataHash },

    #[error("Invalid signature from {0}")]
    InvalidSignature(KeyHash),

    #[error("Missing signature from {0}")]
    MissingSignature(KeyHash),

    #[error("Native script {0} not satisfied")]
    NativeScriptUnsatisfied(ScriptHash),

    #[error("Script {0} not provided")]
    MissingScript(ScriptHash),

    #[error("No redeemer for {0}")]
    MissingRedeemer(String),

    #[error("Invalid collateral: {0}")]
    Collateral(String),

    #[error("Collateral input {0} not found")]
    CollateralNotFound(OutPoint),

    #[error("Script {script} failed: {failure}")]
    Script { script: ScriptHash, failure: ScriptFailure },
}

/// Error from a ledger backend
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Transaction {tx_hash} rejected: {reason}")]
    Rejected { tx_hash: TxHash, reason: Rejection },

    #[error("Unknown transaction: {0}")]
    UnknownTransaction(TxHash),

    #[error("Timed out after {waited_secs}s waiting for {tx_hash}")]
    Timeout { tx_hash: TxHash, waited_secs: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Transaction error: {0}")]
    Tx(#[from] TxError),

    #[error("Storage error: {0}")]
    Storage(#[from] UtxoError),
}

impl LedgerError {
    /// The rejection reason, if the ledger refused the transaction
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            LedgerError::Rejected { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
