//! Emulator
//!
//! In-memory ledger standing in for a live network. Submitted transactions
//! are validated and applied atomically under one write lock; each accepted
//! transaction advances the ledger by one slot and is confirmed at once.
//!
//! # Validation order
//!
//! 1. Size and fee against the protocol parameters, and the script data
//!    hash whenever redeemers are present
//! 2. Every output carries its minimum lovelace
//! 3. Inputs resolve to live UTXOs
//! 4. Witness signatures verify and cover key inputs and required signers
//! 5. Minting policies: native scripts are satisfied, Plutus ones evaluated
//! 6. Script inputs: validator attached, redeemer present and accepted
//! 7. Collateral backs the fee when scripts run
//! 8. Multi-asset conservation, via [`apply_transaction`]

use std::collections::{BTreeMap, BTreeSet, HashSet};

use async_trait::async_trait;
use lib_tx::{min_ada_for, ProtocolParams, RedeemerPurpose, Transaction};
use lib_types::{Address, Amount, Credential, Network, PolicyId, ScriptHash, Slot, TxHash, Unit, Value};
use lib_utxo::{
    apply_transaction, MemoryUtxoStore, OutPoint, Utxo, UtxoEntry, UtxoError, UtxoStore,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::client::LedgerClient;
use crate::errors::{LedgerError, LedgerResult, Rejection};
use crate::evaluator::{AcceptAll, ScriptContext, ScriptEvaluator};

/// Lovelace given to each genesis address by default (20,000 ADA)
pub const DEFAULT_GENESIS_LOVELACE: Amount = 20_000_000_000;

struct EmulatorState {
    store: MemoryUtxoStore,
    slot: Slot,
    confirmed: Vec<TxHash>,
    mint_history: BTreeMap<Unit, Amount>,
}

/// Simulated ledger
pub struct Emulator {
    params: ProtocolParams,
    evaluator: Box<dyn ScriptEvaluator>,
    state: RwLock<EmulatorState>,
}

impl Emulator {
    /// Seed the ledger with one UTXO per genesis entry
    pub fn new(genesis: Vec<(Address, Value)>, params: ProtocolParams) -> LedgerResult<Self> {
        let store = MemoryUtxoStore::new();
        for (index, (address, value)) in genesis.into_iter().enumerate() {
            store.add_utxo(
                OutPoint::new(TxHash::default(), index as u32),
                Utxo::new(address, value, 0),
            )?;
        }
        Ok(Self {
            params,
            evaluator: Box::new(AcceptAll),
            state: RwLock::new(EmulatorState {
                store,
                slot: 0,
                confirmed: Vec::new(),
                mint_history: BTreeMap::new(),
            }),
        })
    }

    /// Replace the Plutus script evaluator
    pub fn with_evaluator(mut self, evaluator: Box<dyn ScriptEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Current slot
    pub async fn slot(&self) -> Slot {
        self.state.read().await.slot
    }

    /// Number of accepted transactions
    pub async fn tx_count(&self) -> usize {
        self.state.read().await.confirmed.len()
    }

    fn validate(
        &self,
        state: &EmulatorState,
        tx: &Transaction,
        tx_hash: TxHash,
    ) -> Result<(), Rejection> {
        let body = &tx.body;

        // =====================================================================
        // Size and fee
        // =====================================================================
        let size = tx.size().map_err(|e| Rejection::Malformed(e.to_string()))?;
        if size > self.params.max_tx_size {
            return Err(Rejection::TooLarge {
                size,
                max: self.params.max_tx_size,
            });
        }
        let required = self
            .params
            .min_fee(size, tx.witnesses.redeemers.len())
            .map_err(|e| Rejection::Malformed(e.to_string()))?;
        if body.fee < required {
            return Err(Rejection::FeeTooLow {
                fee: body.fee,
                required,
            });
        }

        let expected = tx
            .witnesses
            .script_data_hash(body, &self.params.plutus_v2_cost_model)
            .map_err(|e| Rejection::Malformed(e.to_string()))?;
        match (expected, body.script_data_hash) {
            (Some(_), None) => return Err(Rejection::MissingScriptDataHash),
            (Some(expected), Some(found)) if expected != found => {
                return Err(Rejection::ScriptDataHashMismatch { found, expected })
            }
            (None, Some(_)) => {
                return Err(Rejection::Malformed("script data hash without redeemers".into()))
            }
            _ => {}
        }

        for (index, output) in body.outputs.iter().enumerate() {
            let required = min_ada_for(output, self.params.coins_per_utxo_byte)
                .map_err(|e| Rejection::Malformed(e.to_string()))?;
            if output.value.lovelace < required {
                return Err(Rejection::OutputBelowMinAda {
                    index,
                    lovelace: output.value.lovelace,
                    required,
                });
            }
        }

        // =====================================================================
        // Resolve inputs
        // =====================================================================
        let mut resolved = Vec::with_capacity(body.inputs.len());
        for input in &body.inputs {
            let utxo = match state.store.get_utxo(&input.outpoint)? {
                Some(utxo) => utxo,
                None if state.store.is_spent(&input.outpoint)? => {
                    return Err(UtxoError::AlreadySpent(input.outpoint).into())
                }
                None => return Err(UtxoError::NotFound(input.outpoint).into()),
            };
            resolved.push(UtxoEntry::new(input.outpoint, utxo));
        }

        // =====================================================================
        // Signatures
        // =====================================================================
        for witness in &tx.witnesses.vkeys {
            if !witness.verify(tx_hash.as_bytes()) {
                return Err(Rejection::InvalidSignature(witness.key_hash()));
            }
        }
        let signers = tx.witnesses.verified_signers(&tx_hash);
        for key in &body.required_signers {
            if !signers.contains(key) {
                return Err(Rejection::MissingSignature(*key));
            }
        }
        for entry in &resolved {
            if let Credential::Key(key) = entry.utxo.address.payment {
                if !signers.contains(&key) {
                    return Err(Rejection::MissingSignature(key));
                }
            }
        }

        let ctx = ScriptContext {
            tx,
            tx_hash,
            signers: &signers,
            resolved_inputs: &resolved,
            mint_history: &state.mint_history,
        };

        // =====================================================================
        // Minting policies
        // =====================================================================
        let policies: BTreeSet<PolicyId> = body.mint.assets().map(|(u, _)| u.policy_id).collect();
        let signer_set: HashSet<_> = signers.iter().copied().collect();
        for policy in policies {
            let mut native = None;
            for script in &tx.witnesses.native_scripts {
                if script.hash().ok() == Some(policy) {
                    native = Some(script);
                    break;
                }
            }
            if let Some(script) = native {
                if !script.is_satisfied_by(&signer_set) {
                    return Err(Rejection::NativeScriptUnsatisfied(policy));
                }
                continue;
            }
            self.run_plutus(policy, &RedeemerPurpose::Mint(policy), &ctx)?;
        }

        // =====================================================================
        // Script inputs
        // =====================================================================
        for entry in &resolved {
            if let Credential::Script(script) = entry.utxo.address.payment {
                self.run_plutus(script, &RedeemerPurpose::Spend(entry.outpoint), &ctx)?;
            }
        }

        // =====================================================================
        // Collateral
        // =====================================================================
        if !tx.witnesses.redeemers.is_empty() {
            if body.collateral.is_empty() {
                return Err(Rejection::Collateral("no collateral inputs".into()));
            }
            let mut total = 0u64;
            for input in &body.collateral {
                let utxo = state
                    .store
                    .get_utxo(&input.outpoint)?
                    .ok_or(Rejection::CollateralNotFound(input.outpoint))?;
                if utxo.value.has_assets() || utxo.address.payment_key_hash().is_none() {
                    return Err(Rejection::Collateral(format!(
                        "{} must be a pure-lovelace key output",
                        input.outpoint
                    )));
                }
                total = total.saturating_add(utxo.value.lovelace);
            }
            let needed = self
                .params
                .required_collateral(body.fee)
                .map_err(|e| Rejection::Malformed(e.to_string()))?;
            if total < needed {
                return Err(Rejection::Collateral(format!(
                    "{} lovelace below required {}",
                    total, needed
                )));
            }
        }

        Ok(())
    }

    fn run_plutus(
        &self,
        script: ScriptHash,
        purpose: &RedeemerPurpose,
        ctx: &ScriptContext<'_>,
    ) -> Result<(), Rejection> {
        if !ctx.tx.witnesses.plutus_scripts.iter().any(|s| s.hash() == script) {
            return Err(Rejection::MissingScript(script));
        }
        let redeemer = ctx
            .tx
            .witnesses
            .redeemers
            .iter()
            .find(|r| &r.purpose == purpose)
            .ok_or_else(|| Rejection::MissingRedeemer(format!("{:?}", purpose)))?;
        self.evaluator
            .evaluate(script, purpose, &redeemer.data, ctx)
            .map_err(|failure| Rejection::Script { script, failure })
    }
}

#[async_trait]
impl LedgerClient for Emulator {
    fn network(&self) -> Network {
        Network::Emulator
    }

    async fn protocol_params(&self) -> LedgerResult<ProtocolParams> {
        Ok(self.params.clone())
    }

    async fn utxos_at(&self, address: &Address) -> LedgerResult<Vec<UtxoEntry>> {
        Ok(self.state.read().await.store.utxos_at(address)?)
    }

    async fn submit(&self, tx: &Transaction) -> LedgerResult<TxHash> {
        let tx_hash = tx.id()?;
        let mut state = self.state.write().await;

        if let Err(reason) = self.validate(&state, tx, tx_hash) {
            warn!(%tx_hash, %reason, "Emulator rejected transaction");
            return Err(LedgerError::Rejected { tx_hash, reason });
        }

        let slot = state.slot + 1;
        let outcome = apply_transaction(&state.store, &tx.ledger_view(), tx_hash, slot).map_err(
            |err| LedgerError::Rejected {
                tx_hash,
                reason: Rejection::Utxo(err),
            },
        )?;

        for (unit, quantity) in outcome.minted.assets() {
            *state.mint_history.entry(unit.clone()).or_insert(0) += quantity;
        }
        state.slot = slot;
        state.confirmed.push(tx_hash);

        info!(
            %tx_hash,
            slot,
            inputs = outcome.inputs_spent,
            outputs = outcome.outputs_created,
            fee = outcome.fee,
            "Emulator accepted transaction"
        );
        Ok(tx_hash)
    }

    async fn await_tx(&self, tx_hash: &TxHash) -> LedgerResult<()> {
        if self.state.read().await.confirmed.contains(tx_hash) {
            debug!(%tx_hash, "Transaction confirmed");
            Ok(())
        } else {
            Err(LedgerError::UnknownTransaction(*tx_hash))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_cip68::PlutusData;
    use lib_tx::{NativeScript, PlutusScript, TxBuilder, Wallet};
    use lib_types::{AssetName, DataHash};

    fn emulator_for(wallet: &Wallet) -> Emulator {
        Emulator::new(
            vec![(wallet.address(), Value::from_lovelace(DEFAULT_GENESIS_LOVELACE))],
            ProtocolParams::default(),
        )
        .unwrap()
    }

    async fn builder(emulator: &Emulator, wallet: &Wallet) -> TxBuilder {
        crate::client::new_tx(emulator, wallet.address()).await.unwrap()
    }

    #[tokio::test]
    async fn test_genesis_funds_wallet() {
        let wallet = Wallet::generate(Network::Emulator).unwrap();
        let emulator = emulator_for(&wallet);
        let utxos = emulator.utxos_at(&wallet.address()).await.unwrap();
        assert_eq!(utxos.len(), 1);
        assert_eq!(utxos[0].utxo.value.lovelace, DEFAULT_GENESIS_LOVELACE);
        assert_eq!(emulator.slot().await, 0);
    }

    #[tokio::test]
    async fn test_signed_payment_accepted() {
        let wallet = Wallet::generate(Network::Emulator).unwrap();
        let emulator = emulator_for(&wallet);
        let other = Wallet::generate(Network::Emulator).unwrap();

        let tx = builder(&emulator, &wallet)
            .await
            .pay_to_address(other.address(), Value::from_lovelace(7_000_000))
            .complete()
            .unwrap()
            .sign(&wallet)
            .unwrap();
        let tx_hash = emulator.submit(&tx).await.unwrap();
        emulator.await_tx(&tx_hash).await.unwrap();

        assert_eq!(emulator.slot().await, 1);
        let received = emulator.utxos_at(&other.address()).await.unwrap();
        assert_eq!(received[0].utxo.value.lovelace, 7_000_000);
    }

    #[tokio::test]
    async fn test_unsigned_spend_rejected() {
        let wallet = Wallet::generate(Network::Emulator).unwrap();
        let emulator = emulator_for(&wallet);

        let tx = builder(&emulator, &wallet)
            .await
            .pay_to_address(wallet.address(), Value::from_lovelace(2_000_000))
            .complete()
            .unwrap();
        let err = emulator.submit(&tx).await.unwrap_err();
        assert_eq!(
            err.rejection(),
            Some(&Rejection::MissingSignature(wallet.key_hash()))
        );
        assert_eq!(emulator.tx_count().await, 0);
    }

    #[tokio::test]
    async fn test_replay_rejected() {
        let wallet = Wallet::generate(Network::Emulator).unwrap();
        let emulator = emulator_for(&wallet);

        let tx = builder(&emulator, &wallet)
            .await
            .pay_to_address(wallet.address(), Value::from_lovelace(2_000_000))
            .complete()
            .unwrap()
            .sign(&wallet)
            .unwrap();
        emulator.submit(&tx).await.unwrap();
        let err = emulator.submit(&tx).await.unwrap_err();
        assert!(matches!(
            err.rejection(),
            Some(Rejection::Utxo(UtxoError::AlreadySpent(_)))
        ));
    }

    #[tokio::test]
    async fn test_native_mint_requires_owner() {
        let owner = Wallet::generate(Network::Emulator).unwrap();
        let stranger = Wallet::generate(Network::Emulator).unwrap();
        let emulator = Emulator::new(
            vec![
                (owner.address(), Value::from_lovelace(DEFAULT_GENESIS_LOVELACE)),
                (stranger.address(), Value::from_lovelace(DEFAULT_GENESIS_LOVELACE)),
            ],
            ProtocolParams::default(),
        )
        .unwrap();

        // Stranger tries to mint under the owner's policy
        let policy = NativeScript::single_owner(owner.key_hash());
        let unit = Unit::new(policy.hash().unwrap(), AssetName::from_text("bushwifplanes").unwrap());
        let tx = builder(&emulator, &stranger)
            .await
            .attach_minting_policy(policy)
            .mint_assets(Value::from_asset(unit, 1), None)
            .complete()
            .unwrap()
            .sign(&stranger)
            .unwrap();
        let err = emulator.submit(&tx).await.unwrap_err();
        assert!(matches!(
            err.rejection(),
            Some(Rejection::NativeScriptUnsatisfied(_))
        ));
    }

    #[tokio::test]
    async fn test_low_fee_rejected() {
        let wallet = Wallet::generate(Network::Emulator).unwrap();
        let emulator = emulator_for(&wallet);

        let mut tx = builder(&emulator, &wallet)
            .await
            .pay_to_address(wallet.address(), Value::from_lovelace(2_000_000))
            .complete()
            .unwrap();
        // Move the fee into the change output; still balanced, but underpaid
        let fee = tx.body.fee;
        tx.body.fee = 1;
        tx.body.outputs.last_mut().unwrap().value.lovelace += fee - 1;
        let tx = tx.sign(&wallet).unwrap();

        let err = emulator.submit(&tx).await.unwrap_err();
        assert!(matches!(err.rejection(), Some(Rejection::FeeTooLow { .. })));
    }

    async fn plutus_mint(emulator: &Emulator, wallet: &Wallet) -> Transaction {
        let script = PlutusScript::new(b"always-succeeds".to_vec());
        let unit = Unit::new(script.hash(), AssetName::from_text("ticket").unwrap());
        builder(emulator, wallet)
            .await
            .attach_minting_policy(script)
            .mint_assets(Value::from_asset(unit, 1), Some(PlutusData::unit()))
            .complete()
            .unwrap()
    }

    #[tokio::test]
    async fn test_plutus_mint_with_script_data_hash_accepted() {
        let wallet = Wallet::generate(Network::Emulator).unwrap();
        let emulator = emulator_for(&wallet);
        let tx = plutus_mint(&emulator, &wallet).await;
        assert!(tx.body.script_data_hash.is_some());

        emulator.submit(&tx.sign(&wallet).unwrap()).await.unwrap();
        assert_eq!(emulator.tx_count().await, 1);
    }

    #[tokio::test]
    async fn test_redeemers_without_script_data_hash_rejected() {
        let wallet = Wallet::generate(Network::Emulator).unwrap();
        let emulator = emulator_for(&wallet);

        let mut tx = plutus_mint(&emulator, &wallet).await;
        tx.body.script_data_hash = None;
        let err = emulator.submit(&tx.sign(&wallet).unwrap()).await.unwrap_err();
        assert_eq!(err.rejection(), Some(&Rejection::MissingScriptDataHash));

        let mut tx = plutus_mint(&emulator, &wallet).await;
        tx.body.script_data_hash = Some(DataHash::new([0; 32]));
        let err = emulator.submit(&tx.sign(&wallet).unwrap()).await.unwrap_err();
        assert!(matches!(
            err.rejection(),
            Some(Rejection::ScriptDataHashMismatch { .. })
        ));
        assert_eq!(emulator.tx_count().await, 0);
    }

    #[tokio::test]
    async fn test_await_unknown_tx() {
        let wallet = Wallet::generate(Network::Emulator).unwrap();
        let emulator = emulator_for(&wallet);
        let err = emulator.await_tx(&TxHash::new([1; 32])).await.unwrap_err();
        assert!(matches!(err, LedgerError::UnknownTransaction(_)));
    }
}
