//! Script Evaluation
//!
//! The emulator cannot run compiled Plutus code, so Plutus scripts are
//! checked by a pluggable [`ScriptEvaluator`]. [`ExchangeRules`] models the
//! tiered exchange validator: the minting policy for reference and user
//! tokens and the spending validator at the contract address.

use std::collections::{BTreeMap, BTreeSet};

use lib_cip68::{Cip68Datum, MintRedeemer, PlutusData, SpendRedeemer, Tier, TierTable};
use lib_tx::{Deployment, PolicyConfig, RedeemerPurpose, Transaction};
use lib_types::{Address, Amount, KeyHash, PolicyId, ScriptHash, TxHash, Unit};
use lib_utxo::UtxoEntry;
use thiserror::Error;

/// Why a script refused a transaction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptFailure {
    #[error("No evaluator rules for this script")]
    UnknownScript,

    #[error("Redeemer does not match the expected shape")]
    MalformedRedeemer,

    #[error("Signature from an admin key is required")]
    MissingAdminSignature,

    #[error("Tier {0} is not configured")]
    UnknownTier(u8),

    #[error("Expected exactly {expected} of {unit}, minted {minted}")]
    WrongMintQuantity { unit: Unit, expected: Amount, minted: Amount },

    #[error("Unexpected asset minted: {0}")]
    UnexpectedMint(Unit),

    #[error("Reference token {0} has already been minted")]
    DuplicateReferenceMint(Unit),

    #[error("Reference token {0} is not locked at the contract with a tier {1} datum")]
    ReferenceNotLocked(Unit, u8),

    #[error("Contract payment {paid} below tier price {price}")]
    PriceNotPaid { price: Amount, paid: Amount },

    #[error("Spent input does not hold the tier {0} reference token")]
    SpendTierMismatch(u8),

    #[error("Spent input not resolved")]
    UnresolvedInput,
}

/// Ledger facts a script may inspect
pub struct ScriptContext<'a> {
    pub tx: &'a Transaction,
    pub tx_hash: TxHash,
    /// Keys with a verified signature
    pub signers: &'a BTreeSet<KeyHash>,
    /// Inputs with the UTXOs they spend
    pub resolved_inputs: &'a [UtxoEntry],
    /// Total ever minted per unit before this transaction
    pub mint_history: &'a BTreeMap<Unit, Amount>,
}

/// Decides whether a Plutus script accepts a redeemer
pub trait ScriptEvaluator: Send + Sync {
    fn evaluate(
        &self,
        script: ScriptHash,
        purpose: &RedeemerPurpose,
        redeemer: &PlutusData,
        ctx: &ScriptContext<'_>,
    ) -> Result<(), ScriptFailure>;
}

/// Accepts every script
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl ScriptEvaluator for AcceptAll {
    fn evaluate(
        &self,
        _script: ScriptHash,
        _purpose: &RedeemerPurpose,
        _redeemer: &PlutusData,
        _ctx: &ScriptContext<'_>,
    ) -> Result<(), ScriptFailure> {
        Ok(())
    }
}

/// Rules of the tiered exchange validator
#[derive(Debug, Clone)]
pub struct ExchangeRules {
    config: PolicyConfig,
    tiers: TierTable,
    policy_id: PolicyId,
    contract_address: Address,
}

impl ExchangeRules {
    pub fn new(config: PolicyConfig, tiers: TierTable, deployment: &Deployment) -> Self {
        Self {
            config,
            tiers,
            policy_id: deployment.policy_id,
            contract_address: deployment.contract_address,
        }
    }

    fn spec_units(&self, tier: Tier) -> Result<(Unit, Unit), ScriptFailure> {
        let spec = self
            .tiers
            .get(tier)
            .map_err(|_| ScriptFailure::UnknownTier(tier.index()))?;
        let reference = spec
            .reference_unit(self.policy_id)
            .map_err(|_| ScriptFailure::UnknownTier(tier.index()))?;
        let user = spec
            .user_unit(self.policy_id)
            .map_err(|_| ScriptFailure::UnknownTier(tier.index()))?;
        Ok((reference, user))
    }

    /// Some contract output holds exactly one `unit` with a datum naming `tier`
    fn locked_with_tier(&self, tx: &Transaction, unit: &Unit, tier: Tier) -> bool {
        tx.body.outputs.iter().any(|output| {
            output.address == self.contract_address
                && output.value.quantity_of(unit) == 1
                && output
                    .datum
                    .as_ref()
                    .and_then(|d| Cip68Datum::from_plutus_data(d).ok())
                    .and_then(|d| d.tier())
                    == Some(tier.index())
        })
    }

    fn check_reference_mint(&self, tiers: &[Tier], ctx: &ScriptContext<'_>) -> Result<(), ScriptFailure> {
        if !ctx.signers.iter().any(|key| self.config.is_admin(key)) {
            return Err(ScriptFailure::MissingAdminSignature);
        }

        let mut expected = BTreeSet::new();
        for tier in tiers {
            let (reference, _) = self.spec_units(*tier)?;
            let minted = ctx.tx.body.mint.quantity_of(&reference);
            if minted != 1 {
                return Err(ScriptFailure::WrongMintQuantity {
                    unit: reference,
                    expected: 1,
                    minted,
                });
            }
            if ctx.mint_history.get(&reference).copied().unwrap_or(0) > 0 {
                return Err(ScriptFailure::DuplicateReferenceMint(reference));
            }
            if !self.locked_with_tier(ctx.tx, &reference, *tier) {
                return Err(ScriptFailure::ReferenceNotLocked(reference, tier.index()));
            }
            expected.insert(reference);
        }

        for (unit, _) in ctx.tx.body.mint.assets_of_policy(&self.policy_id) {
            if !expected.contains(unit) {
                return Err(ScriptFailure::UnexpectedMint(unit.clone()));
            }
        }
        Ok(())
    }

    fn check_user_mint(&self, tier: Tier, ctx: &ScriptContext<'_>) -> Result<(), ScriptFailure> {
        let (_, user) = self.spec_units(tier)?;
        let minted = ctx.tx.body.mint.quantity_of(&user);
        if minted != 1 {
            return Err(ScriptFailure::WrongMintQuantity {
                unit: user,
                expected: 1,
                minted,
            });
        }
        for (unit, _) in ctx.tx.body.mint.assets_of_policy(&self.policy_id) {
            if *unit != user {
                return Err(ScriptFailure::UnexpectedMint(unit.clone()));
            }
        }

        let price = self
            .tiers
            .get(tier)
            .map_err(|_| ScriptFailure::UnknownTier(tier.index()))?
            .price;
        let base = self.config.base_unit();
        let paid: Amount = ctx
            .tx
            .body
            .outputs
            .iter()
            .filter(|o| o.address == self.contract_address)
            .map(|o| o.value.quantity_of(&base))
            .sum();
        if paid < price {
            return Err(ScriptFailure::PriceNotPaid { price, paid });
        }
        Ok(())
    }

    fn check_spend(
        &self,
        tier: Tier,
        purpose: &RedeemerPurpose,
        ctx: &ScriptContext<'_>,
    ) -> Result<(), ScriptFailure> {
        let RedeemerPurpose::Spend(outpoint) = purpose else {
            return Err(ScriptFailure::MalformedRedeemer);
        };
        let spent = ctx
            .resolved_inputs
            .iter()
            .find(|e| &e.outpoint == outpoint)
            .ok_or(ScriptFailure::UnresolvedInput)?;

        let (reference, _) = self.spec_units(tier)?;
        if !spent.utxo.holds(&reference) {
            return Err(ScriptFailure::SpendTierMismatch(tier.index()));
        }
        if !self.locked_with_tier(ctx.tx, &reference, tier) {
            return Err(ScriptFailure::ReferenceNotLocked(reference, tier.index()));
        }
        Ok(())
    }
}

impl ScriptEvaluator for ExchangeRules {
    fn evaluate(
        &self,
        script: ScriptHash,
        purpose: &RedeemerPurpose,
        redeemer: &PlutusData,
        ctx: &ScriptContext<'_>,
    ) -> Result<(), ScriptFailure> {
        if script != self.policy_id {
            return Err(ScriptFailure::UnknownScript);
        }
        match purpose {
            RedeemerPurpose::Mint(_) => {
                match MintRedeemer::from_plutus_data(redeemer).ok_or(ScriptFailure::MalformedRedeemer)? {
                    MintRedeemer::MintReferenceTokens { tiers } => self.check_reference_mint(&tiers, ctx),
                    MintRedeemer::MintRft { tier } => self.check_user_mint(tier, ctx),
                }
            }
            RedeemerPurpose::Spend(_) => {
                let spend =
                    SpendRedeemer::from_plutus_data(redeemer).ok_or(ScriptFailure::MalformedRedeemer)?;
                self.check_spend(spend.tier, purpose, ctx)
            }
        }
    }
}

