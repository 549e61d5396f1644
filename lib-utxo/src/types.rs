//! UTXO Types
//!
//! Core types for multi-asset UTXO transactions.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use lib_cip68::PlutusData;
use lib_types::{Address, Slot, TxHash, TypesError, Unit, Value};

use crate::errors::UtxoResult;

/// OutPoint - Reference to a specific output in a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OutPoint {
    /// Transaction hash containing the output
    pub tx_hash: TxHash,
    /// Index of the output in the transaction
    pub output_index: u32,
}

impl OutPoint {
    /// Create a new OutPoint
    pub const fn new(tx_hash: TxHash, output_index: u32) -> Self {
        Self { tx_hash, output_index }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_hash, self.output_index)
    }
}

impl FromStr for OutPoint {
    type Err = TypesError;

    /// Parse `txhash#index`
    fn from_str(s: &str) -> Result<Self, TypesError> {
        let (hash, index) = s
            .split_once('#')
            .ok_or_else(|| TypesError::InvalidHex(format!("expected txhash#index: {}", s)))?;
        let output_index = index
            .parse()
            .map_err(|_| TypesError::InvalidHex(format!("bad output index: {}", index)))?;
        Ok(Self::new(TxHash::from_hex(hash)?, output_index))
    }
}

/// Unspent Transaction Output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Utxo {
    /// Owner address
    pub address: Address,
    /// Lovelace and native assets held
    pub value: Value,
    /// Inline datum
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datum: Option<PlutusData>,
    /// Slot at which the output was created
    pub created_at: Slot,
}

impl Utxo {
    /// Create a new UTXO
    pub fn new(address: Address, value: Value, created_at: Slot) -> Self {
        Self {
            address,
            value,
            datum: None,
            created_at,
        }
    }

    /// Create a UTXO carrying an inline datum
    pub fn with_datum(address: Address, value: Value, datum: PlutusData, created_at: Slot) -> Self {
        Self {
            address,
            value,
            datum: Some(datum),
            created_at,
        }
    }

    /// True if the UTXO holds at least one of `unit`
    pub fn holds(&self, unit: &Unit) -> bool {
        self.value.quantity_of(unit) > 0
    }
}

/// UTXO paired with its location, as returned by queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UtxoEntry {
    pub outpoint: OutPoint,
    #[serde(flatten)]
    pub utxo: Utxo,
}

impl UtxoEntry {
    pub fn new(outpoint: OutPoint, utxo: Utxo) -> Self {
        Self { outpoint, utxo }
    }
}

/// Transaction input (reference to UTXO being spent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TxInput {
    /// Reference to the UTXO being spent
    pub outpoint: OutPoint,
}

impl TxInput {
    pub const fn new(outpoint: OutPoint) -> Self {
        Self { outpoint }
    }
}

/// Transaction output (new UTXO being created)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxOutput {
    /// Recipient address
    pub address: Address,
    /// Value to lock
    pub value: Value,
    /// Optional inline datum
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datum: Option<PlutusData>,
}

impl TxOutput {
    pub fn new(address: Address, value: Value) -> Self {
        Self {
            address,
            value,
            datum: None,
        }
    }

    pub fn with_datum(address: Address, value: Value, datum: PlutusData) -> Self {
        Self {
            address,
            value,
            datum: Some(datum),
        }
    }
}

/// Ledger-level view of a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTx<'a> {
    pub inputs: &'a [TxInput],
    pub outputs: &'a [TxOutput],
    /// Newly minted assets (lovelace component must be zero)
    pub mint: &'a Value,
    pub fee: lib_types::Amount,
}

/// Result of a successfully applied transaction
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    /// Number of inputs spent
    pub inputs_spent: usize,
    /// Number of outputs created
    pub outputs_created: usize,
    /// Total input value
    pub total_input: Value,
    /// Total output value
    pub total_output: Value,
    /// Assets minted
    pub minted: Value,
    /// Fee paid
    pub fee: lib_types::Amount,
}

/// Trait for UTXO storage operations
///
/// Implementations must provide atomic UTXO operations.
pub trait UtxoStore {
    /// Get a live UTXO by outpoint
    fn get_utxo(&self, outpoint: &OutPoint) -> UtxoResult<Option<Utxo>>;

    /// Check if a UTXO exists
    fn utxo_exists(&self, outpoint: &OutPoint) -> UtxoResult<bool> {
        Ok(self.get_utxo(outpoint)?.is_some())
    }

    /// Check if a UTXO has already been consumed
    fn is_spent(&self, outpoint: &OutPoint) -> UtxoResult<bool>;

    /// Spend a UTXO (mark as consumed)
    ///
    /// Returns the UTXO that was spent, or error if not found.
    fn spend_utxo(&self, outpoint: &OutPoint) -> UtxoResult<Utxo>;

    /// Create a new UTXO
    fn create_utxo(&self, outpoint: &OutPoint, utxo: &Utxo) -> UtxoResult<()>;

    /// All live UTXOs at an address, ordered by outpoint
    fn utxos_at(&self, address: &Address) -> UtxoResult<Vec<UtxoEntry>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::{AssetName, Credential, KeyHash, Network, ScriptHash};

    #[test]
    fn test_outpoint_display_parse() {
        let outpoint = OutPoint::new(TxHash::new([0xab; 32]), 3);
        let rendered = outpoint.to_string();
        assert!(rendered.ends_with("#3"));
        assert_eq!(rendered.parse::<OutPoint>().unwrap(), outpoint);
    }

    #[test]
    fn test_outpoint_parse_rejects_missing_index() {
        assert!("abcd".parse::<OutPoint>().is_err());
    }

    #[test]
    fn test_utxo_holds() {
        let address = Address::enterprise(Network::Emulator, Credential::Key(KeyHash::new([1; 28])));
        let unit = Unit::new(ScriptHash::new([2; 28]), AssetName::from_text("ref").unwrap());
        let utxo = Utxo::new(address, Value::from_lovelace(2_000_000).with_asset(unit.clone(), 1), 0);
        assert!(utxo.holds(&unit));
        assert!(utxo.datum.is_none());
    }
}
