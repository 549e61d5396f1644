//! UTXO Application Logic
//!
//! The `apply_transaction` function is the canonical way to execute a
//! multi-asset UTXO transaction against a store.

use std::collections::HashSet;

use lib_types::{Slot, TxHash, Value};

use crate::errors::{UtxoError, UtxoResult};
use crate::types::{ApplyOutcome, LedgerTx, OutPoint, Utxo, UtxoStore};

/// Apply a transaction
///
/// # Rules
///
/// 1. **Inputs must exist**: All referenced UTXOs must be present in state
/// 2. **No double spend**: Each input can only appear once, UTXOs can't be spent twice
/// 3. **Conservation**: sum(inputs) + mint == sum(outputs) + fee, for lovelace and every asset
/// 4. **Atomicity**: every check runs before the first write
///
/// # Arguments
///
/// * `store` - UTXO storage backend
/// * `tx` - Inputs, outputs, mint and fee
/// * `tx_hash` - Hash of the transaction (for creating new outpoints)
/// * `slot` - Current slot
///
/// # Returns
///
/// * `Ok(ApplyOutcome)` - Transaction details on success
/// * `Err(UtxoError)` - Error describing failure
pub fn apply_transaction(
    store: &dyn UtxoStore,
    tx: &LedgerTx<'_>,
    tx_hash: TxHash,
    slot: Slot,
) -> UtxoResult<ApplyOutcome> {
    // =========================================================================
    // Validation: Non-empty inputs and outputs
    // =========================================================================
    if tx.inputs.is_empty() {
        return Err(UtxoError::EmptyInputs);
    }
    if tx.outputs.is_empty() {
        return Err(UtxoError::EmptyOutputs);
    }
    if tx.mint.lovelace != 0 {
        return Err(UtxoError::InvalidAmount("Lovelace cannot be minted".to_string()));
    }

    // =========================================================================
    // Rule 2: No duplicate inputs (double spend within tx)
    // =========================================================================
    let mut seen_inputs: HashSet<OutPoint> = HashSet::with_capacity(tx.inputs.len());
    for input in tx.inputs {
        if !seen_inputs.insert(input.outpoint) {
            return Err(UtxoError::DuplicateInput(input.outpoint));
        }
    }

    // =========================================================================
    // Rule 1: Inputs must exist - read all inputs and sum their values
    // =========================================================================
    let mut total_input = Value::zero();
    for input in tx.inputs {
        let utxo = match store.get_utxo(&input.outpoint)? {
            Some(utxo) => utxo,
            None if store.is_spent(&input.outpoint)? => {
                return Err(UtxoError::AlreadySpent(input.outpoint))
            }
            None => return Err(UtxoError::NotFound(input.outpoint)),
        };
        total_input = total_input.checked_add(&utxo.value)?;
    }

    // =========================================================================
    // Rule 3: Conservation
    // =========================================================================
    let mut total_output = Value::zero();
    for output in tx.outputs {
        if output.value.lovelace == 0 {
            return Err(UtxoError::InvalidAmount(
                "Output must carry lovelace".to_string(),
            ));
        }
        total_output = total_output.checked_add(&output.value)?;
    }

    let consumed = total_input.checked_add(tx.mint)?;
    let produced = total_output.checked_add(&Value::from_lovelace(tx.fee))?;

    if !consumed.contains(&produced) {
        return Err(UtxoError::InsufficientInput {
            have: consumed,
            need: produced,
        });
    }

    // Strict conservation: nothing may be left unaccounted for
    if consumed != produced {
        return Err(UtxoError::ValueMismatch { consumed, produced });
    }

    // =========================================================================
    // Rule 4: Commit - spend inputs, then create outputs
    // =========================================================================
    for input in tx.inputs {
        store.spend_utxo(&input.outpoint)?;
    }

    for (index, output) in tx.outputs.iter().enumerate() {
        let outpoint = OutPoint::new(tx_hash, index as u32);
        let utxo = match &output.datum {
            Some(datum) => Utxo::with_datum(output.address, output.value.clone(), datum.clone(), slot),
            None => Utxo::new(output.address, output.value.clone(), slot),
        };
        store.create_utxo(&outpoint, &utxo)?;
    }

    Ok(ApplyOutcome {
        inputs_spent: tx.inputs.len(),
        outputs_created: tx.outputs.len(),
        total_input,
        total_output,
        minted: tx.mint.clone(),
        fee: tx.fee,
    })
}
