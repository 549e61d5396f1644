//! UTXO Errors

use thiserror::Error;
use lib_types::Value;

use crate::types::OutPoint;

/// Error during UTXO operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UtxoError {
    #[error("UTXO not found: {0}")]
    NotFound(OutPoint),

    #[error("UTXO already spent: {0}")]
    AlreadySpent(OutPoint),

    #[error("Duplicate input: {0}")]
    DuplicateInput(OutPoint),

    #[error("Insufficient input value: have {have:?}, need {need:?}")]
    InsufficientInput { have: Value, need: Value },

    #[error("Value mismatch: consumed {consumed:?}, produced {produced:?}")]
    ValueMismatch { consumed: Value, produced: Value },

    #[error("Empty inputs")]
    EmptyInputs,

    #[error("Empty outputs")]
    EmptyOutputs,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<lib_types::TypesError> for UtxoError {
    fn from(err: lib_types::TypesError) -> Self {
        match err {
            lib_types::TypesError::Overflow => UtxoError::Overflow,
            other => UtxoError::InvalidAmount(other.to_string()),
        }
    }
}

/// Result type for UTXO operations
pub type UtxoResult<T> = Result<T, UtxoError>;
