//! Primitive Type Errors

use thiserror::Error;

/// Error while parsing or combining primitive values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Asset name too long: {0} bytes (max 32)")]
    AssetNameTooLong(usize),

    #[error("Invalid unit: {0}")]
    InvalidUnit(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Arithmetic overflow")]
    Overflow,
}

/// Result type for primitive operations
pub type TypesResult<T> = Result<T, TypesError>;
