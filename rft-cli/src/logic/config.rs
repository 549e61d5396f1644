//! Pure configuration logic
//!
//! Turns an [`RftConfig`] into the typed handles the issuance actions use.
//! All functions are pure - no I/O or side effects.

use crate::cli_config::RftConfig;
use crate::error::{CliError, CliResult};
use lib_cip68::TierTable;
use lib_ledger::MAINNET_URL;
use lib_tx::{NativeScript, PolicyConfig};
use lib_types::{AssetName, KeyHash, Network};

pub const PREPROD_URL: &str = "https://cardano-preprod.blockfrost.io/api/v0";
pub const PREVIEW_URL: &str = "https://cardano-preview.blockfrost.io/api/v0";

/// Validator bytes deployed on the emulator when no compiled code is configured
pub const EMULATOR_VALIDATOR_CODE: &[u8] = b"rft-exchange-validator/emulator";

/// Parse a `--network` value
pub fn parse_network(value: &str) -> CliResult<Network> {
    value
        .parse()
        .map_err(|_| CliError::ConfigError(format!(
            "Unknown network: '{}'. Supported: emulator, mainnet, preprod, preview",
            value
        )))
}

/// The command-line network wins over the configured one
pub fn resolve_network(config: &RftConfig, cli_network: Option<Network>) -> Network {
    cli_network.unwrap_or(config.network.kind)
}

/// Validate output format
pub fn validate_output_format(format: &str) -> CliResult<()> {
    match format.to_lowercase().as_str() {
        "json" | "table" => Ok(()),
        other => Err(CliError::ConfigError(format!(
            "Unknown output format: '{}'. Supported: json, table",
            other
        ))),
    }
}

/// Indexer endpoint for a live network
pub fn blockfrost_url(network: Network, configured: Option<&str>) -> CliResult<String> {
    if let Some(url) = configured {
        return Ok(url.to_string());
    }
    match network {
        Network::Mainnet => Ok(MAINNET_URL.to_string()),
        Network::Preprod => Ok(PREPROD_URL.to_string()),
        Network::Preview => Ok(PREVIEW_URL.to_string()),
        Network::Emulator => Err(CliError::ConfigError(
            "The emulator has no indexer endpoint".to_string(),
        )),
    }
}

pub fn build_tier_table(config: &RftConfig) -> CliResult<TierTable> {
    Ok(TierTable::new(config.tiers.clone())?)
}

pub fn base_asset_name(config: &RftConfig) -> CliResult<AssetName> {
    if config.policy.base_asset_name.is_empty() {
        return Err(CliError::ConfigError("base_asset_name is empty".to_string()));
    }
    Ok(AssetName::from_text(&config.policy.base_asset_name)?)
}

/// Native `all[sig(owner)]` policy controlled by the wallet
pub fn owner_policy(owner: KeyHash) -> NativeScript {
    NativeScript::single_owner(owner)
}

/// Validator parameters, filling unset values from the wallet key
pub fn policy_config(
    config: &RftConfig,
    tiers: &TierTable,
    wallet_key: KeyHash,
) -> CliResult<PolicyConfig> {
    let base_policy_id = match config.policy.base_policy_id {
        Some(policy_id) => policy_id,
        None => owner_policy(wallet_key).hash()?,
    };
    let admins = if config.policy.admins.is_empty() {
        vec![wallet_key]
    } else {
        config.policy.admins.clone()
    };

    let policy = PolicyConfig {
        base_policy_id,
        base_asset_name: base_asset_name(config)?,
        admins,
        tier_prices: tiers.prices(),
    };
    policy.validate(tiers)?;
    Ok(policy)
}

/// Decode a hex-encoded compiled validator
pub fn decode_validator_code(text: &str) -> CliResult<Vec<u8>> {
    let code = hex::decode(text.trim())
        .map_err(|e| CliError::ConfigError(format!("Validator code is not hex: {}", e)))?;
    if code.is_empty() {
        return Err(CliError::ConfigError("Validator code file is empty".to_string()));
    }
    Ok(code)
}
