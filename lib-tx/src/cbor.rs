//! Ledger CBOR shapes for inputs, outputs and values

use std::collections::BTreeMap;

use ciborium::value::{Integer, Value as Cbor};
use ciborium_ll::{Encoder, Header};
use lib_types::{Amount, PolicyId, Value};
use lib_utxo::{OutPoint, TxOutput};

use crate::errors::{TxError, TxResult};

/// Tag 24: embedded CBOR item
const EMBEDDED_CBOR_TAG: u64 = 24;
/// Post-Alonzo output datum option: inline datum
const INLINE_DATUM: u64 = 1;

pub(crate) fn uint(value: u64) -> Cbor {
    Cbor::Integer(Integer::from(value))
}

pub(crate) fn to_bytes(value: &Cbor) -> TxResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)?;
    Ok(buf)
}

/// Append a bare header; the caller writes the items it announces
pub(crate) fn push_header(out: &mut Vec<u8>, header: Header) -> TxResult<()> {
    Encoder::from(&mut *out)
        .push(header)
        .map_err(|e| TxError::Encoding(format!("{:?}", e)))
}

/// Append one complete item
pub(crate) fn push_item(out: &mut Vec<u8>, value: &Cbor) -> TxResult<()> {
    ciborium::into_writer(value, &mut *out)?;
    Ok(())
}

pub(crate) fn encode_input(outpoint: &OutPoint) -> Cbor {
    Cbor::Array(vec![
        Cbor::Bytes(outpoint.tx_hash.as_bytes().to_vec()),
        uint(outpoint.output_index as u64),
    ])
}

/// Group assets by policy: `{ policy => { name => quantity } }`
pub(crate) fn encode_multiasset(value: &Value) -> Cbor {
    let mut grouped: BTreeMap<PolicyId, Vec<(Cbor, Cbor)>> = BTreeMap::new();
    for (unit, quantity) in value.assets() {
        grouped
            .entry(unit.policy_id)
            .or_default()
            .push((Cbor::Bytes(unit.asset_name.as_bytes().to_vec()), uint(*quantity)));
    }
    Cbor::Map(
        grouped
            .into_iter()
            .map(|(policy, names)| (Cbor::Bytes(policy.as_bytes().to_vec()), Cbor::Map(names)))
            .collect(),
    )
}

/// Coin alone, or `[coin, multiasset]` when assets are present
pub(crate) fn encode_value(value: &Value) -> Cbor {
    if value.has_assets() {
        Cbor::Array(vec![uint(value.lovelace), encode_multiasset(value)])
    } else {
        uint(value.lovelace)
    }
}

pub(crate) fn encode_output(output: &TxOutput) -> TxResult<Cbor> {
    let mut entries = vec![
        (uint(0), Cbor::Bytes(output.address.to_bytes())),
        (uint(1), encode_value(&output.value)),
    ];
    if let Some(datum) = &output.datum {
        entries.push((
            uint(2),
            Cbor::Array(vec![
                uint(INLINE_DATUM),
                Cbor::Tag(EMBEDDED_CBOR_TAG, Box::new(Cbor::Bytes(datum.to_cbor()?))),
            ]),
        ));
    }
    Ok(Cbor::Map(entries))
}

/// Serialized size of an output
pub fn output_size(output: &TxOutput) -> TxResult<usize> {
    Ok(to_bytes(&encode_output(output)?)?.len())
}

/// Smallest lovelace amount the output must carry.
///
/// Raising the lovelace can lengthen its encoding, so iterate until the
/// requirement is stable.
pub fn min_ada_for(output: &TxOutput, coins_per_utxo_byte: Amount) -> TxResult<Amount> {
    let mut candidate = output.clone();
    loop {
        let required = coins_per_utxo_byte
            .checked_mul(160 + output_size(&candidate)? as Amount)
            .ok_or(TxError::Overflow)?;
        if candidate.value.lovelace >= required {
            return Ok(required);
        }
        candidate.value.lovelace = required;
    }
}
