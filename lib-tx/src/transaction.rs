//! Transaction
//!
//! Body, witness set and their ledger CBOR encoding. The transaction id is
//! `blake2b_256` of the encoded body, and every vkey witness signs that id.
//!
//! A body that runs Plutus scripts commits to its redeemers and the cost
//! model they are evaluated under through the script data hash:
//!
//! ```text
//! script_data_hash = blake2b_256(redeemers ++ datums ++ language_views)
//! ```
//!
//! Datums are always inline here, so the witness datum segment is empty.

use std::collections::BTreeSet;

use ciborium::value::{Integer, Value as Cbor};
use ciborium_ll::Header;
use lib_cip68::PlutusData;
use lib_types::{blake2b_256, Amount, DataHash, KeyHash, PolicyId, TxHash, Value};
use lib_utxo::{LedgerTx, OutPoint, TxInput, TxOutput};
use serde::Serialize;

use crate::cbor::{
    encode_input, encode_multiasset, encode_output, push_header, push_item, to_bytes, uint,
};
use crate::errors::{TxError, TxResult};
use crate::script::{NativeScript, PlutusScript};
use crate::wallet::{VKeyWitness, Wallet};

/// Language id of Plutus V2 in the language views map
const PLUTUS_V2_LANGUAGE: u64 = 1;

/// What a redeemer unlocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "purpose", content = "target", rename_all = "lowercase")]
pub enum RedeemerPurpose {
    Spend(OutPoint),
    Mint(PolicyId),
}

/// Execution budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExUnits {
    pub mem: u64,
    pub steps: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redeemer {
    pub purpose: RedeemerPurpose,
    pub data: PlutusData,
    pub ex_units: ExUnits,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TxBody {
    /// Inputs, kept sorted by outpoint
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub fee: Amount,
    /// Minted assets (lovelace always zero)
    pub mint: Value,
    pub required_signers: Vec<KeyHash>,
    pub collateral: Vec<TxInput>,
    /// Set whenever the witness set carries redeemers
    pub script_data_hash: Option<DataHash>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct WitnessSet {
    pub vkeys: Vec<VKeyWitness>,
    pub native_scripts: Vec<NativeScript>,
    #[serde(skip)]
    pub plutus_scripts: Vec<PlutusScript>,
    pub redeemers: Vec<Redeemer>,
}

/// A built (and possibly signed) transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub body: TxBody,
    pub witnesses: WitnessSet,
}

impl TxBody {
    /// Position of an input in the sorted input list
    pub fn input_index(&self, outpoint: &OutPoint) -> Option<usize> {
        self.inputs.iter().position(|i| &i.outpoint == outpoint)
    }

    /// Minting policies in sorted order
    pub fn mint_policies(&self) -> Vec<PolicyId> {
        self.mint
            .assets()
            .map(|(unit, _)| unit.policy_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn to_cbor_value(&self) -> TxResult<Cbor> {
        let mut entries = vec![
            (
                uint(0),
                Cbor::Array(self.inputs.iter().map(|i| encode_input(&i.outpoint)).collect()),
            ),
            (
                uint(1),
                Cbor::Array(
                    self.outputs
                        .iter()
                        .map(encode_output)
                        .collect::<TxResult<Vec<_>>>()?,
                ),
            ),
            (uint(2), uint(self.fee)),
        ];
        if self.mint.has_assets() {
            entries.push((uint(9), encode_multiasset(&self.mint)));
        }
        if let Some(hash) = &self.script_data_hash {
            entries.push((uint(11), Cbor::Bytes(hash.as_bytes().to_vec())));
        }
        if !self.collateral.is_empty() {
            entries.push((
                uint(13),
                Cbor::Array(self.collateral.iter().map(|i| encode_input(&i.outpoint)).collect()),
            ));
        }
        if !self.required_signers.is_empty() {
            entries.push((
                uint(14),
                Cbor::Array(
                    self.required_signers
                        .iter()
                        .map(|k| Cbor::Bytes(k.as_bytes().to_vec()))
                        .collect(),
                ),
            ));
        }
        Ok(Cbor::Map(entries))
    }

    pub fn to_cbor(&self) -> TxResult<Vec<u8>> {
        to_bytes(&self.to_cbor_value()?)
    }

    /// Transaction id
    pub fn hash(&self) -> TxResult<TxHash> {
        Ok(TxHash::new(blake2b_256(&self.to_cbor()?)))
    }
}

impl WitnessSet {
    /// Redeemers as `[tag, index, data, ex_units]`, indexed against `body`
    ///
    /// Written as raw bytes so the data keeps its own encoding.
    fn redeemers_cbor(&self, body: &TxBody) -> TxResult<Vec<u8>> {
        let policies = body.mint_policies();
        let mut out = Vec::new();
        push_header(&mut out, Header::Array(Some(self.redeemers.len())))?;
        for redeemer in &self.redeemers {
            let (tag, index) = match &redeemer.purpose {
                RedeemerPurpose::Spend(outpoint) => (0, body.input_index(outpoint)),
                RedeemerPurpose::Mint(policy) => (1, policies.iter().position(|p| p == policy)),
            };
            let index = index.ok_or_else(|| {
                TxError::Encoding(format!("redeemer target {:?} not in body", redeemer.purpose))
            })?;
            push_header(&mut out, Header::Array(Some(4)))?;
            push_item(&mut out, &uint(tag))?;
            push_item(&mut out, &uint(index as u64))?;
            redeemer.data.encode(&mut out)?;
            push_item(
                &mut out,
                &Cbor::Array(vec![uint(redeemer.ex_units.mem), uint(redeemer.ex_units.steps)]),
            )?;
        }
        Ok(out)
    }

    /// Hash binding the redeemers to `body` and the V2 cost model, or `None`
    /// when no script runs
    pub fn script_data_hash(&self, body: &TxBody, cost_model: &[i64]) -> TxResult<Option<DataHash>> {
        if self.redeemers.is_empty() {
            return Ok(None);
        }
        let costs = cost_model.iter().map(|c| Cbor::Integer(Integer::from(*c))).collect();
        let language_views = Cbor::Map(vec![(uint(PLUTUS_V2_LANGUAGE), Cbor::Array(costs))]);

        let mut preimage = self.redeemers_cbor(body)?;
        preimage.extend(to_bytes(&language_views)?);
        Ok(Some(DataHash::digest(&preimage)))
    }

    fn encode(&self, body: &TxBody, out: &mut Vec<u8>) -> TxResult<()> {
        let mut entries = Vec::new();
        if !self.vkeys.is_empty() {
            entries.push((
                0,
                Cbor::Array(
                    self.vkeys
                        .iter()
                        .map(|w| {
                            Cbor::Array(vec![
                                Cbor::Bytes(w.vkey.to_vec()),
                                Cbor::Bytes(w.signature.to_vec()),
                            ])
                        })
                        .collect(),
                ),
            ));
        }
        if !self.native_scripts.is_empty() {
            entries.push((
                1,
                Cbor::Array(self.native_scripts.iter().map(NativeScript::to_cbor_value).collect()),
            ));
        }
        let redeemers = if self.redeemers.is_empty() {
            None
        } else {
            Some(self.redeemers_cbor(body)?)
        };
        let plutus_scripts = (!self.plutus_scripts.is_empty()).then(|| {
            Cbor::Array(
                self.plutus_scripts
                    .iter()
                    .map(|s| Cbor::Bytes(s.code().to_vec()))
                    .collect(),
            )
        });

        let len = entries.len() + redeemers.is_some() as usize + plutus_scripts.is_some() as usize;
        push_header(out, Header::Map(Some(len)))?;
        for (key, value) in &entries {
            push_item(out, &uint(*key))?;
            push_item(out, value)?;
        }
        if let Some(redeemers) = redeemers {
            push_item(out, &uint(5))?;
            out.extend_from_slice(&redeemers);
        }
        if let Some(scripts) = plutus_scripts {
            push_item(out, &uint(6))?;
            push_item(out, &scripts)?;
        }
        Ok(())
    }

    /// Keys that provided a valid signature over `body_hash`
    pub fn verified_signers(&self, body_hash: &TxHash) -> BTreeSet<KeyHash> {
        self.vkeys
            .iter()
            .filter(|w| w.verify(body_hash.as_bytes()))
            .map(VKeyWitness::key_hash)
            .collect()
    }
}

impl Transaction {
    pub fn id(&self) -> TxResult<TxHash> {
        self.body.hash()
    }

    /// Full transaction: `[body, witnesses, is_valid, auxiliary_data]`
    pub fn to_cbor(&self) -> TxResult<Vec<u8>> {
        let mut out = Vec::new();
        push_header(&mut out, Header::Array(Some(4)))?;
        push_item(&mut out, &self.body.to_cbor_value()?)?;
        self.witnesses.encode(&self.body, &mut out)?;
        push_item(&mut out, &Cbor::Bool(true))?;
        push_item(&mut out, &Cbor::Null)?;
        Ok(out)
    }

    pub fn to_cbor_hex(&self) -> TxResult<String> {
        Ok(hex::encode(self.to_cbor()?))
    }

    pub fn size(&self) -> TxResult<usize> {
        Ok(self.to_cbor()?.len())
    }

    /// Add a vkey witness from `wallet` over the body hash
    pub fn sign(mut self, wallet: &Wallet) -> TxResult<Self> {
        let id = self.id()?;
        let witness = wallet.sign(id.as_bytes());
        if !self.witnesses.vkeys.iter().any(|w| w.vkey == witness.vkey) {
            self.witnesses.vkeys.push(witness);
        }
        Ok(self)
    }

    /// Ledger view used to apply the transaction to a UTXO set
    pub fn ledger_view(&self) -> LedgerTx<'_> {
        LedgerTx {
            inputs: &self.body.inputs,
            outputs: &self.body.outputs,
            mint: &self.body.mint,
            fee: self.body.fee,
        }
    }
}
