//! Transaction Building Errors

use lib_cip68::Cip68Error;
use lib_types::{Amount, PolicyId, TypesError, Value};
use lib_utxo::{OutPoint, UtxoError};
use thiserror::Error;

/// Error while deriving scripts, building or signing a transaction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxError {
    #[error("Insufficient funds: missing {missing:?}")]
    InsufficientFunds { missing: Value },

    #[error("No collateral: wallet holds no pure-lovelace UTXO of at least {required}")]
    NoCollateral { required: Amount },

    #[error("No script attached for policy {0}")]
    MissingPolicyScript(PolicyId),

    #[error("No spending validator attached for input {0}")]
    MissingSpendingValidator(OutPoint),

    #[error("No redeemer supplied for {0}")]
    MissingRedeemer(String),

    #[error("Fee did not converge after {0} rounds")]
    FeeDidNotConverge(usize),

    #[error("Transaction too large: {size} bytes exceeds {max}")]
    TooLarge { size: usize, max: usize },

    #[error("Invalid policy configuration: {0}")]
    InvalidPolicy(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Data error: {0}")]
    Data(#[from] Cip68Error),

    #[error("UTXO error: {0}")]
    Utxo(#[from] UtxoError),
}

impl From<TypesError> for TxError {
    fn from(err: TypesError) -> Self {
        match err {
            TypesError::Overflow => TxError::Overflow,
            other => TxError::Encoding(other.to_string()),
        }
    }
}

impl From<ciborium::ser::Error<std::io::Error>> for TxError {
    fn from(err: ciborium::ser::Error<std::io::Error>) -> Self {
        TxError::Encoding(err.to_string())
    }
}

/// Result type for transaction operations
pub type TxResult<T> = Result<T, TxError>;
