//! Transaction Builder
//!
//! Collects intents (mints, payments, script inputs, signers) and turns
//! them into a balanced transaction:
//!
//! 1. every output is lifted to its minimum lovelace
//! 2. wallet UTXOs are selected (assets first, then largest lovelace first)
//! 3. leftover value returns to the wallet, assets and lovelace in separate change outputs
//! 4. the fee is recomputed from the encoded size until it stops growing
//! 5. a pure-lovelace wallet UTXO is set aside as collateral when scripts run
//!    and the body commits to the redeemers through its script data hash

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use lib_cip68::PlutusData;
use lib_types::{Address, Amount, KeyHash, PolicyId, Value};
use lib_utxo::{OutPoint, TxInput, TxOutput, UtxoEntry};
use tracing::debug;

use crate::cbor::min_ada_for;
use crate::errors::{TxError, TxResult};
use crate::params::ProtocolParams;
use crate::script::{NativeScript, PlutusScript, Script};
use crate::transaction::{ExUnits, Redeemer, RedeemerPurpose, Transaction, TxBody, WitnessSet};
use crate::wallet::VKeyWitness;

/// Upper bound on fee and change refinement rounds
const MAX_BALANCE_ROUNDS: usize = 8;

/// Fluent transaction builder
#[derive(Debug, Clone)]
pub struct TxBuilder {
    params: ProtocolParams,
    change_address: Address,
    wallet_utxos: Vec<UtxoEntry>,
    collected: Vec<(UtxoEntry, Option<PlutusData>)>,
    outputs: Vec<TxOutput>,
    mint: Value,
    mint_redeemers: BTreeMap<PolicyId, PlutusData>,
    policies: Vec<Script>,
    validators: Vec<PlutusScript>,
    signers: BTreeSet<KeyHash>,
    error: Option<TxError>,
}

impl TxBuilder {
    /// Start a transaction funded by `wallet_utxos`, returning change to `change_address`
    pub fn new(params: ProtocolParams, change_address: Address, wallet_utxos: Vec<UtxoEntry>) -> Self {
        Self {
            params,
            change_address,
            wallet_utxos,
            collected: Vec::new(),
            outputs: Vec::new(),
            mint: Value::zero(),
            mint_redeemers: BTreeMap::new(),
            policies: Vec::new(),
            validators: Vec::new(),
            signers: BTreeSet::new(),
            error: None,
        }
    }

    fn fail(&mut self, err: TxError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    pub fn attach_minting_policy(mut self, script: impl Into<Script>) -> Self {
        self.policies.push(script.into());
        self
    }

    pub fn attach_spending_validator(mut self, script: PlutusScript) -> Self {
        self.validators.push(script);
        self
    }

    /// Mint `assets` (lovelace ignored); the redeemer applies to every policy involved
    pub fn mint_assets(mut self, assets: Value, redeemer: Option<PlutusData>) -> Self {
        for (unit, quantity) in assets.assets() {
            if let Some(redeemer) = &redeemer {
                self.mint_redeemers.insert(unit.policy_id, redeemer.clone());
            }
            if let Err(err) = self.mint.add_asset(unit.clone(), *quantity) {
                self.fail(err.into());
            }
        }
        self
    }

    pub fn pay_to_address(mut self, address: Address, value: Value) -> Self {
        self.outputs.push(TxOutput::new(address, value));
        self
    }

    /// Pay to a script address with an inline datum
    pub fn pay_to_contract(mut self, address: Address, datum: PlutusData, value: Value) -> Self {
        self.outputs.push(TxOutput::with_datum(address, value, datum));
        self
    }

    /// Spend specific UTXOs; script-locked ones need a redeemer
    pub fn collect_from(mut self, utxos: Vec<UtxoEntry>, redeemer: Option<PlutusData>) -> Self {
        for entry in utxos {
            if self.collected.iter().any(|(c, _)| c.outpoint == entry.outpoint) {
                continue;
            }
            self.collected.push((entry, redeemer.clone()));
        }
        self
    }

    /// Require a signature from `key`
    pub fn add_signer(mut self, key: KeyHash) -> Self {
        self.signers.insert(key);
        self
    }

    /// Balance, fee and assemble the transaction
    pub fn complete(self) -> TxResult<Transaction> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let (native_scripts, plutus_scripts, redeemers) = self.resolve_scripts()?;

        // =====================================================================
        // Outputs: lift to minimum lovelace
        // =====================================================================
        let mut outputs = self.outputs.clone();
        for output in &mut outputs {
            let min = min_ada_for(output, self.params.coins_per_utxo_byte)?;
            if output.value.lovelace < min {
                output.value.lovelace = min;
            }
        }

        let mut produced = Value::zero();
        for output in &outputs {
            produced = produced.checked_add(&output.value)?;
        }
        let mut have = self.mint.clone();
        for (entry, _) in &self.collected {
            have = have.checked_add(&entry.utxo.value)?;
        }

        let explicit: HashSet<OutPoint> = self.collected.iter().map(|(e, _)| e.outpoint).collect();
        let candidates: Vec<UtxoEntry> = self
            .wallet_utxos
            .iter()
            .filter(|e| !explicit.contains(&e.outpoint))
            .cloned()
            .collect();

        let witness_estimate = self.witness_estimate(&native_scripts);

        // =====================================================================
        // Fee fixed point
        // =====================================================================
        let mut fee = self.params.min_fee(0, redeemers.len())?;
        for round in 0..MAX_BALANCE_ROUNDS {
            let (selected, change) = self.balance(&candidates, &have, &produced, fee)?;

            let mut inputs: Vec<TxInput> = self
                .collected
                .iter()
                .map(|(e, _)| TxInput::new(e.outpoint))
                .chain(selected.iter().map(|e| TxInput::new(e.outpoint)))
                .collect();
            inputs.sort_by_key(|i| i.outpoint);

            let mut body_outputs = outputs.clone();
            body_outputs.extend(change);

            let collateral = if redeemers.is_empty() {
                Vec::new()
            } else {
                vec![TxInput::new(self.pick_collateral(fee)?)]
            };

            let mut tx = Transaction {
                body: TxBody {
                    inputs,
                    outputs: body_outputs,
                    fee,
                    mint: self.mint.clone(),
                    required_signers: self.signers.iter().copied().collect(),
                    collateral,
                    script_data_hash: None,
                },
                witnesses: WitnessSet {
                    vkeys: Vec::new(),
                    native_scripts: native_scripts.clone(),
                    plutus_scripts: plutus_scripts.clone(),
                    redeemers: redeemers.clone(),
                },
            };
            tx.body.script_data_hash = tx
                .witnesses
                .script_data_hash(&tx.body, &self.params.plutus_v2_cost_model)?;

            let mut sized = tx.clone();
            sized.witnesses.vkeys = witness_estimate.clone();
            let size = sized.size()?;
            if size > self.params.max_tx_size {
                return Err(TxError::TooLarge {
                    size,
                    max: self.params.max_tx_size,
                });
            }

            let required = self.params.min_fee(size, redeemers.len())?;
            debug!(round, size, fee, required, "Balancing transaction");
            if required <= fee {
                return Ok(tx);
            }
            fee = required;
        }

        Err(TxError::FeeDidNotConverge(MAX_BALANCE_ROUNDS))
    }

    /// Check every mint and script input has its script, and collect redeemers
    fn resolve_scripts(&self) -> TxResult<(Vec<NativeScript>, Vec<PlutusScript>, Vec<Redeemer>)> {
        let ex_units = ExUnits {
            mem: self.params.redeemer_mem,
            steps: self.params.redeemer_steps,
        };
        let mut native_scripts = Vec::new();
        let mut plutus_scripts: Vec<PlutusScript> = Vec::new();
        let mut redeemers = Vec::new();

        let policies: BTreeSet<PolicyId> = self.mint.assets().map(|(u, _)| u.policy_id).collect();
        for policy in policies {
            let mut script = None;
            for candidate in &self.policies {
                if candidate.hash()? == policy {
                    script = Some(candidate);
                    break;
                }
            }
            match script.ok_or(TxError::MissingPolicyScript(policy))? {
                Script::Native(native) => native_scripts.push(native.clone()),
                Script::PlutusV2(plutus) => {
                    let data = self
                        .mint_redeemers
                        .get(&policy)
                        .ok_or_else(|| TxError::MissingRedeemer(format!("mint under {}", policy)))?;
                    if !plutus_scripts.contains(plutus) {
                        plutus_scripts.push(plutus.clone());
                    }
                    redeemers.push(Redeemer {
                        purpose: RedeemerPurpose::Mint(policy),
                        data: data.clone(),
                        ex_units,
                    });
                }
            }
        }

        for (entry, redeemer) in &self.collected {
            let Some(script_hash) = entry.utxo.address.payment_script_hash() else {
                continue;
            };
            let validator = self
                .validators
                .iter()
                .chain(self.policies.iter().filter_map(|s| match s {
                    Script::PlutusV2(p) => Some(p),
                    Script::Native(_) => None,
                }))
                .find(|v| v.hash() == script_hash)
                .ok_or(TxError::MissingSpendingValidator(entry.outpoint))?;
            let data = redeemer
                .clone()
                .ok_or_else(|| TxError::MissingRedeemer(format!("input {}", entry.outpoint)))?;
            if !plutus_scripts.contains(validator) {
                plutus_scripts.push(validator.clone());
            }
            redeemers.push(Redeemer {
                purpose: RedeemerPurpose::Spend(entry.outpoint),
                data,
                ex_units,
            });
        }

        Ok((native_scripts, plutus_scripts, redeemers))
    }

    /// Placeholder witnesses for every key expected to sign
    fn witness_estimate(&self, native_scripts: &[NativeScript]) -> Vec<VKeyWitness> {
        let mut keys: BTreeSet<KeyHash> = self.signers.clone();
        keys.extend(self.change_address.payment_key_hash());
        keys.extend(native_scripts.iter().flat_map(NativeScript::key_hashes));
        keys.iter()
            .map(|_| VKeyWitness {
                vkey: [0u8; 32],
                signature: [0u8; 64],
            })
            .collect()
    }

    /// Select wallet inputs covering `produced + fee` plus change outputs of at least min-ada
    fn balance(
        &self,
        candidates: &[UtxoEntry],
        have: &Value,
        produced: &Value,
        fee: Amount,
    ) -> TxResult<(Vec<UtxoEntry>, Vec<TxOutput>)> {
        let target = produced.checked_add(&Value::from_lovelace(fee))?;
        let mut need = target.clone();
        for _ in 0..MAX_BALANCE_ROUNDS {
            let selected = select_inputs(candidates, have, &need)?;
            let mut consumed = have.clone();
            for entry in &selected {
                consumed = consumed.checked_add(&entry.utxo.value)?;
            }
            let leftover = consumed.checked_sub(&target).ok_or_else(|| TxError::InsufficientFunds {
                missing: target.saturating_sub(&consumed),
            })?;
            if leftover.is_zero() {
                return Ok((selected, Vec::new()));
            }

            match self.split_change(&leftover)? {
                Ok(change) => return Ok((selected, change)),
                Err(min) => need = target.checked_add(&Value::from_lovelace(min))?,
            }
        }
        Err(TxError::FeeDidNotConverge(MAX_BALANCE_ROUNDS))
    }

    /// Change outputs for `leftover`, or the lovelace a single change output would need.
    ///
    /// Assets are returned in their own output at min-ada so the remaining
    /// lovelace lands in a pure-lovelace UTXO usable as collateral later.
    fn split_change(&self, leftover: &Value) -> TxResult<Result<Vec<TxOutput>, Amount>> {
        let coins = self.params.coins_per_utxo_byte;
        if leftover.has_assets() {
            let mut tokens = TxOutput::new(self.change_address, leftover.without_lovelace());
            tokens.value.lovelace = min_ada_for(&tokens, coins)?;
            if let Some(rest) = leftover.lovelace.checked_sub(tokens.value.lovelace) {
                let pure = TxOutput::new(self.change_address, Value::from_lovelace(rest));
                if rest >= min_ada_for(&pure, coins)? {
                    return Ok(Ok(vec![tokens, pure]));
                }
            }
        }
        let single = TxOutput::new(self.change_address, leftover.clone());
        let min = min_ada_for(&single, coins)?;
        if single.value.lovelace >= min {
            Ok(Ok(vec![single]))
        } else {
            Ok(Err(min))
        }
    }

    /// Largest pure-lovelace wallet UTXO able to back the fee
    fn pick_collateral(&self, fee: Amount) -> TxResult<OutPoint> {
        let required = self.params.required_collateral(fee)?;
        self.wallet_utxos
            .iter()
            .filter(|e| !e.utxo.value.has_assets() && e.utxo.value.lovelace >= required)
            .max_by_key(|e| (e.utxo.value.lovelace, Reverse(e.outpoint)))
            .map(|e| e.outpoint)
            .ok_or(TxError::NoCollateral { required })
    }
}

/// Pick candidates until `have + picked` covers `need`.
///
/// Assets are covered first, preferring the UTXO holding the most of the
/// missing asset; lovelace is then covered largest-first. Ties break on
/// outpoint so the selection is deterministic.
fn select_inputs(candidates: &[UtxoEntry], have: &Value, need: &Value) -> TxResult<Vec<UtxoEntry>> {
    let mut remaining: Vec<&UtxoEntry> = candidates.iter().collect();
    let mut selected = Vec::new();
    let mut total = have.clone();

    for (unit, wanted) in need.assets() {
        while total.quantity_of(unit) < *wanted {
            let best = remaining
                .iter()
                .enumerate()
                .filter(|(_, e)| e.utxo.holds(unit))
                .max_by_key(|(_, e)| (e.utxo.value.quantity_of(unit), Reverse(e.outpoint)))
                .map(|(i, _)| i);
            let Some(index) = best else {
                break;
            };
            let entry = remaining.remove(index);
            total = total.checked_add(&entry.utxo.value)?;
            selected.push(entry.clone());
        }
    }

    remaining.sort_by_key(|e| (Reverse(e.utxo.value.lovelace), e.outpoint));
    for entry in remaining {
        if total.lovelace >= need.lovelace {
            break;
        }
        total = total.checked_add(&entry.utxo.value)?;
        selected.push(entry.clone());
    }

    if !total.contains(need) {
        return Err(TxError::InsufficientFunds {
            missing: need.saturating_sub(&total),
        });
    }
    Ok(selected)
}
