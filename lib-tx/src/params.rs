use lib_types::Amount;
use serde::{Deserialize, Serialize};

use crate::errors::{TxError, TxResult};

/// Ledger protocol parameters used for fee and min-ada calculation.
///
/// Formula:
/// fee = min_fee_a * tx_size + min_fee_b + sum(script execution price)
/// min_ada(output) = coins_per_utxo_byte * (160 + encoded_output_size)
///
/// Every value may be overridden from configuration, so the arithmetic is
/// checked and reports [`TxError::Overflow`] instead of wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    /// Fee per transaction byte (lovelace)
    pub min_fee_a: Amount,
    /// Fixed fee per transaction (lovelace)
    pub min_fee_b: Amount,
    /// Lovelace per byte of stored output
    pub coins_per_utxo_byte: Amount,
    /// Maximum serialized transaction size
    pub max_tx_size: usize,
    /// Collateral required, as a percentage of the fee
    pub collateral_percentage: u64,
    /// Memory units budgeted per redeemer
    pub redeemer_mem: u64,
    /// CPU steps budgeted per redeemer
    pub redeemer_steps: u64,
    /// Price per memory unit, in 1/10_000 lovelace
    pub price_mem_per_10k: u64,
    /// Price per CPU step, in 1/10_000_000 lovelace
    pub price_step_per_10m: u64,
    /// Plutus V2 cost model in ledger order; part of the script data hash
    pub plutus_v2_cost_model: Vec<i64>,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            min_fee_a: 44,
            min_fee_b: 155_381,
            coins_per_utxo_byte: 4_310,
            max_tx_size: 16_384,
            collateral_percentage: 150,
            redeemer_mem: 1_000_000,
            redeemer_steps: 500_000_000,
            price_mem_per_10k: 577,
            price_step_per_10m: 721,
            plutus_v2_cost_model: Vec::new(),
        }
    }
}

fn mul(a: u64, b: u64) -> TxResult<u64> {
    a.checked_mul(b).ok_or(TxError::Overflow)
}

fn add(a: u64, b: u64) -> TxResult<u64> {
    a.checked_add(b).ok_or(TxError::Overflow)
}

impl ProtocolParams {
    /// Execution price of one redeemer at the budgeted units
    pub fn redeemer_price(&self) -> TxResult<Amount> {
        let mem = mul(self.redeemer_mem, self.price_mem_per_10k)?.div_ceil(10_000);
        let steps = mul(self.redeemer_steps, self.price_step_per_10m)?.div_ceil(10_000_000);
        add(mem, steps)
    }

    /// Minimum fee for a transaction of `tx_size` bytes running `redeemers` scripts
    pub fn min_fee(&self, tx_size: usize, redeemers: usize) -> TxResult<Amount> {
        let size_fee = mul(self.min_fee_a, tx_size as Amount)?;
        let script_fee = match redeemers {
            0 => 0,
            n => mul(self.redeemer_price()?, n as Amount)?,
        };
        add(add(size_fee, self.min_fee_b)?, script_fee)
    }

    /// Lovelace the collateral input must hold for a given fee
    pub fn required_collateral(&self, fee: Amount) -> TxResult<Amount> {
        Ok(mul(fee, self.collateral_percentage)?.div_ceil(100))
    }
}
