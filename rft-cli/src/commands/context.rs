//! Issuance context
//!
//! Everything an action needs is derived once from the configuration and
//! passed explicitly: the ledger handle, the wallet, the validator
//! parameters with their derived handles, and the tier table.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use lib_cip68::{Tier, TierTable};
use lib_ledger::{BlockfrostClient, Emulator, ExchangeRules, LedgerClient};
use lib_tx::{Deployment, PolicyConfig, ValidatorCode, Wallet};
use lib_types::{Amount, Network, Unit, Value};
use tracing::info;

use crate::cli_config::RftConfig;
use crate::error::{CliError, CliResult};
use crate::logic;

/// Shared state of one CLI invocation
pub struct Context {
    pub ledger: Arc<dyn LedgerClient>,
    pub wallet: Wallet,
    pub policy: PolicyConfig,
    pub deployment: Deployment,
    pub tiers: TierTable,
    /// CIP-68 metadata description written into every datum
    pub description: String,
    pub datum_version: i64,
    pub base_supply: Amount,
}

impl Context {
    pub fn network(&self) -> Network {
        self.ledger.network()
    }

    pub fn reference_unit(&self, tier: Tier) -> CliResult<Unit> {
        Ok(self.tiers.get(tier)?.reference_unit(self.deployment.policy_id)?)
    }

    pub fn user_unit(&self, tier: Tier) -> CliResult<Unit> {
        Ok(self.tiers.get(tier)?.user_unit(self.deployment.policy_id)?)
    }
}

/// Build the context for `network`
pub fn build_context(config: &RftConfig, network: Network) -> CliResult<Context> {
    match network {
        Network::Emulator => Ok(emulator_context(config)?.0),
        live => live_context(config, live),
    }
}

/// Context backed by a fresh emulator, funded from genesis and enforcing
/// the exchange rules. The emulator handle is returned for inspection.
pub fn emulator_context(config: &RftConfig) -> CliResult<(Context, Arc<Emulator>)> {
    let wallet = match &config.wallet.seed_file {
        Some(path) => Wallet::from_seed_file(path, Network::Emulator)?,
        None => Wallet::generate(Network::Emulator)?,
    };
    let code = match &config.policy.validator_code_file {
        Some(path) => read_validator_code(path)?,
        None => logic::EMULATOR_VALIDATOR_CODE.to_vec(),
    };
    let (policy, deployment, tiers) =
        derive_handles(config, &wallet, ValidatorCode::Unapplied(&code), Network::Emulator)?;

    let rules = ExchangeRules::new(policy.clone(), tiers.clone(), &deployment);
    let emulator = Arc::new(
        Emulator::new(
            vec![(
                wallet.address(),
                Value::from_lovelace(config.emulator.genesis_lovelace),
            )],
            config.params.clone(),
        )?
        .with_evaluator(Box::new(rules)),
    );
    info!(
        wallet = %wallet.address(),
        policy_id = %deployment.policy_id,
        "Emulator ready"
    );

    let context = Context {
        ledger: emulator.clone(),
        wallet,
        policy,
        deployment,
        tiers,
        description: config.metadata.description.clone(),
        datum_version: config.metadata.version,
        base_supply: config.policy.base_supply,
    };
    Ok((context, emulator))
}

/// Context backed by a Blockfrost indexer
pub fn live_context(config: &RftConfig, network: Network) -> CliResult<Context> {
    let seed_file = config.wallet.seed_file.as_ref().ok_or_else(|| {
        CliError::ConfigError(format!("[wallet] seed_file is required on {}", network))
    })?;
    let code_file = config.policy.validator_code_file.as_ref().ok_or_else(|| {
        CliError::ConfigError(format!("[policy] validator_code_file is required on {}", network))
    })?;

    let wallet = Wallet::from_seed_file(seed_file, network)?;
    // Live validators are built with their parameters already applied
    let code = read_validator_code(code_file)?;
    let (policy, deployment, tiers) =
        derive_handles(config, &wallet, ValidatorCode::Applied(&code), network)?;

    let url = logic::blockfrost_url(network, config.network.blockfrost_url.as_deref())?;
    let client = BlockfrostClient::from_credential_file(url, &config.network.credential_file, network)?;
    info!(%network, policy_id = %deployment.policy_id, "Connected to indexer");

    Ok(Context {
        ledger: Arc::new(client),
        wallet,
        policy,
        deployment,
        tiers,
        description: config.metadata.description.clone(),
        datum_version: config.metadata.version,
        base_supply: config.policy.base_supply,
    })
}

fn derive_handles(
    config: &RftConfig,
    wallet: &Wallet,
    code: ValidatorCode<'_>,
    network: Network,
) -> CliResult<(PolicyConfig, Deployment, TierTable)> {
    let tiers = logic::build_tier_table(config)?;
    let policy = logic::policy_config(config, &tiers, wallet.key_hash())?;
    let deployment = Deployment::derive(&policy, &tiers, code, network)?;
    Ok((policy, deployment, tiers))
}

fn read_validator_code(path: &Path) -> CliResult<Vec<u8>> {
    let text = fs::read_to_string(path).map_err(|e| {
        CliError::ConfigError(format!("Cannot read validator code {}: {}", path.display(), e))
    })?;
    logic::decode_validator_code(&text)
}
