//! Policy/Validator Deployment
//!
//! The tiered exchange validator is one Plutus script serving both as the
//! minting policy of the reference/user tokens and as the spending
//! validator guarding the contract address. Its parameters are fixed at
//! deployment, so the policy id and address are pure functions of them.
//!
//! Two code sources are accepted:
//!
//! - unapplied code, parameterized here by appending the encoded parameter
//!   list (the emulator's synthetic validator)
//! - code whose parameters were applied when it was built (live networks);
//!   it is attached and hashed exactly as supplied

use lib_cip68::{PlutusData, TierTable};
use lib_types::{Address, Amount, AssetName, KeyHash, Network, PolicyId, Unit};
use serde::{Deserialize, Serialize};

use crate::errors::{TxError, TxResult};
use crate::script::PlutusScript;

/// Parameters baked into the validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Policy id of the base asset paid as the tier price
    pub base_policy_id: PolicyId,
    pub base_asset_name: AssetName,
    /// Keys allowed to mint reference tokens
    pub admins: Vec<KeyHash>,
    /// Price per tier, in base-asset units, in tier order
    pub tier_prices: Vec<Amount>,
}

impl PolicyConfig {
    /// The base asset's unit
    pub fn base_unit(&self) -> Unit {
        Unit::new(self.base_policy_id, self.base_asset_name.clone())
    }

    /// `[policy, name, [admin..], [price..]]`
    pub fn to_plutus_data(&self) -> PlutusData {
        PlutusData::List(vec![
            PlutusData::bytes(self.base_policy_id.as_bytes().to_vec()),
            PlutusData::bytes(self.base_asset_name.as_bytes().to_vec()),
            PlutusData::List(
                self.admins
                    .iter()
                    .map(|admin| PlutusData::bytes(admin.as_bytes().to_vec()))
                    .collect(),
            ),
            PlutusData::List(self.tier_prices.iter().map(|p| PlutusData::int(*p)).collect()),
        ])
    }

    /// Reject parameters the validator could never work with
    pub fn validate(&self, tiers: &TierTable) -> TxResult<()> {
        if self.admins.is_empty() {
            return Err(TxError::InvalidPolicy("admin set is empty".into()));
        }
        if self.tier_prices != tiers.prices() {
            return Err(TxError::InvalidPolicy(format!(
                "tier prices {:?} do not match the tier table {:?}",
                self.tier_prices,
                tiers.prices()
            )));
        }
        Ok(())
    }

    pub fn is_admin(&self, key: &KeyHash) -> bool {
        self.admins.contains(key)
    }
}

/// Compiled validator bytes and whether parameters still need applying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorCode<'a> {
    Unapplied(&'a [u8]),
    Applied(&'a [u8]),
}

impl<'a> ValidatorCode<'a> {
    fn bytes(&self) -> &'a [u8] {
        match self {
            ValidatorCode::Unapplied(code) | ValidatorCode::Applied(code) => code,
        }
    }
}

/// Handles derived from a deployed validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deployment {
    #[serde(skip)]
    pub script: PlutusScript,
    /// Minting policy id (= validator script hash)
    pub policy_id: PolicyId,
    /// Contract address holding reference tokens and payments
    pub contract_address: Address,
}

impl Deployment {
    /// Parameterize the validator if needed and derive its handles
    pub fn derive(
        config: &PolicyConfig,
        tiers: &TierTable,
        code: ValidatorCode<'_>,
        network: Network,
    ) -> TxResult<Self> {
        config.validate(tiers)?;
        if code.bytes().is_empty() {
            return Err(TxError::InvalidPolicy("validator code is empty".into()));
        }
        let script = match code {
            ValidatorCode::Unapplied(code) => {
                PlutusScript::apply_params(code, &config.to_plutus_data())?
            }
            ValidatorCode::Applied(code) => PlutusScript::new(code.to_vec()),
        };
        Ok(Self {
            policy_id: script.hash(),
            contract_address: script.address(network),
            script,
        })
    }
}
