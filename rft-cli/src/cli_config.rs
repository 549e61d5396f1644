//! CLI configuration loader and presets.
//!
//! `rft.toml` describes one deployment: which ledger to talk to, where the
//! wallet seed lives, the validator parameters and the tier table. When no
//! file exists at the default location the preset for the selected network
//! is used instead.

use crate::error::{CliError, CliResult};
use lib_cip68::{Tier, TierSpec, CIP68_VERSION};
use lib_ledger::DEFAULT_GENESIS_LOVELACE;
use lib_tx::ProtocolParams;
use lib_types::{Amount, KeyHash, Network, PolicyId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default CLI config filename under ~/.rft/
pub const DEFAULT_CONFIG_FILENAME: &str = "rft.toml";

/// Units minted by the base-asset action unless configured otherwise
pub const DEFAULT_BASE_SUPPLY: Amount = 10_000_000_000;

pub const DEFAULT_BASE_ASSET_NAME: &str = "bushwifplanes";

pub const DEFAULT_DESCRIPTION: &str = "What do we put for the description...?";

const IPFS_TIER_IMAGE: &str = "ipfs://QmNrXv6eQakz74uPCqboy4hgb5RDjUzxM78GFERN7uoWTq";
const ARWEAVE_TIER1_IMAGE: &str = "ar://l2aIRhQByhK0zPODaiwzMYMXOphVhqPZNvyFnjotSws";

const MAINNET_BASE_POLICY: &str = "5dc56fd1ce4335f8be2020f3f836cd11022dfbbf462e198a93e99126";
const MAINNET_ADMIN: &str = "ad1b43b5f71f8acbd70fe0cbdfeb39a3257cf9f0a649a3b068959832";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RftConfig {
    pub network: NetworkSection,
    pub wallet: WalletSection,
    pub policy: PolicySection,
    pub tiers: Vec<TierSpec>,
    pub metadata: MetadataSection,
    pub emulator: EmulatorSection,
    /// Protocol parameters used by the emulator
    pub params: ProtocolParams,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkSection {
    pub kind: Network,
    /// Indexer base URL; the network's public endpoint when absent
    pub blockfrost_url: Option<String>,
    /// File holding the indexer project id
    pub credential_file: PathBuf,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletSection {
    /// File holding the 24-word mnemonic. The emulator generates a fresh
    /// wallet when absent.
    pub seed_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicySection {
    /// Base asset policy; the wallet's single-owner policy when absent
    pub base_policy_id: Option<PolicyId>,
    /// Base asset name as text
    pub base_asset_name: String,
    pub base_supply: Amount,
    /// Reference-token admins; the wallet key when empty
    pub admins: Vec<KeyHash>,
    /// Hex-encoded compiled validator
    pub validator_code_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MetadataSection {
    pub description: String,
    pub version: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EmulatorSection {
    pub genesis_lovelace: Amount,
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            kind: Network::Emulator,
            blockfrost_url: None,
            credential_file: PathBuf::from("blockfrost.txt"),
        }
    }
}

impl Default for PolicySection {
    fn default() -> Self {
        Self {
            base_policy_id: None,
            base_asset_name: DEFAULT_BASE_ASSET_NAME.to_string(),
            base_supply: DEFAULT_BASE_SUPPLY,
            admins: Vec::new(),
            validator_code_file: None,
        }
    }
}

impl Default for MetadataSection {
    fn default() -> Self {
        Self {
            description: DEFAULT_DESCRIPTION.to_string(),
            version: CIP68_VERSION,
        }
    }
}

impl Default for EmulatorSection {
    fn default() -> Self {
        Self {
            genesis_lovelace: DEFAULT_GENESIS_LOVELACE,
        }
    }
}

impl Default for RftConfig {
    fn default() -> Self {
        Self::preset(Network::Emulator)
    }
}

impl RftConfig {
    /// Built-in configuration for a network
    ///
    /// The emulator preset prices tiers at 91/911/911911 and derives the base
    /// policy and admin set from the generated wallet. The mainnet preset
    /// targets the deployed base asset and admin key.
    pub fn preset(network: Network) -> Self {
        let mut config = Self {
            network: NetworkSection {
                kind: network,
                ..NetworkSection::default()
            },
            wallet: WalletSection::default(),
            policy: PolicySection::default(),
            tiers: preset_tiers(&[91, 911, 911_911], &[IPFS_TIER_IMAGE; 3]),
            metadata: MetadataSection::default(),
            emulator: EmulatorSection::default(),
            params: ProtocolParams::default(),
        };

        if network != Network::Emulator {
            config.wallet.seed_file = Some(PathBuf::from("seed.txt"));
        }
        if network == Network::Mainnet {
            config.policy.base_policy_id = PolicyId::from_hex(MAINNET_BASE_POLICY).ok();
            config.policy.admins = KeyHash::from_hex(MAINNET_ADMIN).into_iter().collect();
            config.tiers = preset_tiers(
                &[2, 3, 4],
                &[ARWEAVE_TIER1_IMAGE, IPFS_TIER_IMAGE, IPFS_TIER_IMAGE],
            );
        }
        config
    }
}

fn preset_tiers(prices: &[Amount; 3], images: &[&str; 3]) -> Vec<TierSpec> {
    Tier::all()
        .zip(prices.iter().zip(images.iter()))
        .map(|(tier, (price, image))| TierSpec {
            tier,
            name: format!("BushWifPlanesTier{}", tier),
            image: image.to_string(),
            price: *price,
        })
        .collect()
}

pub fn default_config_path() -> PathBuf {
    if let Some(home) = dirs::home_dir() {
        home.join(".rft").join(DEFAULT_CONFIG_FILENAME)
    } else {
        PathBuf::from("./rft.toml")
    }
}

/// Load the config named on the command line, or the default one
///
/// `network` picks the preset used when the default file does not exist.
pub fn load_config(path: Option<&str>, network: Option<Network>) -> CliResult<RftConfig> {
    match path {
        Some(path) => load_config_at(Path::new(path), true, network),
        None => load_config_at(&default_config_path(), false, network),
    }
}

/// Load `path`; a missing file is an error only when `explicit`
pub fn load_config_at(
    path: &Path,
    explicit: bool,
    network: Option<Network>,
) -> CliResult<RftConfig> {
    if !path.exists() {
        if explicit {
            return Err(CliError::ConfigError(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        tracing::debug!("No config at {}, using built-in preset", path.display());
        return Ok(RftConfig::preset(network.unwrap_or(Network::Emulator)));
    }

    let raw = fs::read_to_string(path).map_err(|e| CliError::ConfigLoadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    toml::from_str(&raw).map_err(|e| CliError::ConfigLoadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_emulator_preset() {
        let config = RftConfig::default();
        assert_eq!(config.network.kind, Network::Emulator);
        assert!(config.wallet.seed_file.is_none());
        assert!(config.policy.admins.is_empty());
        assert_eq!(
            config.tiers.iter().map(|t| t.price).collect::<Vec<_>>(),
            vec![91, 911, 911_911]
        );
        assert_eq!(config.tiers[0].name, "BushWifPlanesTier1");
        assert_eq!(config.emulator.genesis_lovelace, 20_000_000_000);
    }

    #[test]
    fn test_mainnet_preset() {
        let config = RftConfig::preset(Network::Mainnet);
        assert_eq!(
            config.policy.base_policy_id.unwrap().to_hex(),
            MAINNET_BASE_POLICY
        );
        assert_eq!(config.policy.admins.len(), 1);
        assert_eq!(config.policy.admins[0].to_hex(), MAINNET_ADMIN);
        assert_eq!(config.tiers[0].image, ARWEAVE_TIER1_IMAGE);
        assert_eq!(config.tiers[2].price, 4);
        assert_eq!(config.wallet.seed_file, Some(PathBuf::from("seed.txt")));
    }

    #[test]
    fn test_missing_default_config_uses_preset() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            load_config_at(&dir.path().join("rft.toml"), false, Some(Network::Mainnet)).unwrap();
        assert_eq!(config, RftConfig::preset(Network::Mainnet));
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_at(&dir.path().join("missing.toml"), true, None).unwrap_err();
        assert!(matches!(err, CliError::ConfigError(_)));
    }

    #[test]
    fn test_parse_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[network]
kind = "preprod"
blockfrost_url = "https://cardano-preprod.blockfrost.io/api/v0"
credential_file = "keys/blockfrost.txt"

[wallet]
seed_file = "keys/seed.txt"

[policy]
base_policy_id = "{policy}"
base_asset_name = "bushwifplanes"
base_supply = 500
admins = ["{admin}"]
validator_code_file = "plutus.hex"

[[tiers]]
tier = 1
name = "Bronze"
image = "ipfs://bronze"
price = 5

[[tiers]]
tier = 2
name = "Silver"
image = "ipfs://silver"
price = 50

[metadata]
description = "Tiered access"
version = 2

[emulator]
genesis_lovelace = 1000000000

[params]
min_fee_a = 50
"#,
            policy = MAINNET_BASE_POLICY,
            admin = MAINNET_ADMIN
        )
        .unwrap();

        let config = load_config_at(file.path(), true, None).unwrap();
        assert_eq!(config.network.kind, Network::Preprod);
        assert_eq!(config.network.credential_file, PathBuf::from("keys/blockfrost.txt"));
        assert_eq!(config.policy.base_supply, 500);
        assert_eq!(config.policy.admins[0].to_hex(), MAINNET_ADMIN);
        assert_eq!(config.tiers.len(), 2);
        assert_eq!(config.tiers[1].name, "Silver");
        assert_eq!(config.metadata.description, "Tiered access");
        assert_eq!(config.emulator.genesis_lovelace, 1_000_000_000);
        assert_eq!(config.params.min_fee_a, 50);
        // Unset parameters keep their defaults
        assert_eq!(config.params.min_fee_b, ProtocolParams::default().min_fee_b);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[metadata]\ndescription = \"short\"\n").unwrap();

        let config = load_config_at(file.path(), true, None).unwrap();
        assert_eq!(config.metadata.description, "short");
        assert_eq!(config.metadata.version, CIP68_VERSION);
        assert_eq!(config.network.kind, Network::Emulator);
        assert_eq!(config.tiers.len(), 3);
    }

    #[test]
    fn test_invalid_tier_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[[tiers]]\ntier = 7\nname = \"x\"\nimage = \"y\"\nprice = 1\n"
        )
        .unwrap();

        let err = load_config_at(file.path(), true, None).unwrap_err();
        assert!(matches!(err, CliError::ConfigLoadFailed { .. }));
    }
}
