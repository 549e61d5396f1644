//! RFT CLI
//!
//! Command-line surface of the issuance tool: global flags, one subcommand
//! per issuance action, and the entry point that wires logging, config and
//! the ledger together.

use crate::commands;
use crate::error::CliResult;
use crate::output::ConsoleOutput;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use lib_cip68::MAX_TIER;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

/// Tiered CIP-68 token issuance
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(name = "rft")]
pub struct RftCli {
    /// Configuration file path (default: ~/.rft/rft.toml)
    #[arg(short, long, env = "RFT_CONFIG")]
    pub config: Option<String>,

    /// Ledger to run against (overrides the config file)
    #[arg(short, long, value_parser = ["emulator", "mainnet", "preprod", "preview"], env = "RFT_NETWORK")]
    pub network: Option<String>,

    /// Output format (json, table)
    #[arg(short, long, default_value = "json", env = "RFT_FORMAT")]
    pub format: String,

    /// Enable verbose output
    #[arg(short, long, env = "RFT_VERBOSE")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: RftCommand,
}

/// Issuance commands
#[derive(Subcommand, Debug, Clone)]
pub enum RftCommand {
    /// Show the policy id, contract address and tier units
    Policy,

    /// Mint the fixed supply of the base asset
    MintBase,

    /// Mint reference tokens and lock them at the contract
    MintReference(MintReferenceArgs),

    /// Buy a user token by paying the tier price into the contract
    MintUser(TierArgs),

    /// Spend a locked reference token and re-lock it with a fresh datum
    Respend(TierArgs),

    /// List UTXOs at the wallet and contract addresses
    Utxos(UtxosArgs),

    /// Run the full issuance sequence on the emulator
    Demo,
}

#[derive(Args, Debug, Clone)]
pub struct MintReferenceArgs {
    /// Tiers to mint (all configured tiers when omitted)
    #[arg(short, long = "tier", num_args = 1.., value_parser = clap::value_parser!(u8).range(1..=MAX_TIER as i64))]
    pub tiers: Vec<u8>,
}

#[derive(Args, Debug, Clone)]
pub struct TierArgs {
    /// Tier index
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=MAX_TIER as i64))]
    pub tier: u8,
}

#[derive(Args, Debug, Clone)]
pub struct UtxosArgs {
    /// Only the wallet address
    #[arg(long, conflicts_with = "contract")]
    pub wallet: bool,

    /// Only the contract address
    #[arg(long)]
    pub contract: bool,
}

/// Main CLI runner
pub async fn run_cli() -> Result<()> {
    let cli = RftCli::parse();
    init_tracing(cli.verbose);

    let output = ConsoleOutput;
    commands::dispatch(&cli, &output).await?;
    Ok(())
}

/// Install the log subscriber; `--verbose` forces debug level
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // Logs go to stderr so JSON on stdout stays machine-readable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Format output based on the specified format
pub fn format_output(data: &Value, format: &str) -> CliResult<String> {
    match format {
        "table" => {
            if let Some(obj) = data.as_object() {
                let mut result = String::new();
                for (key, value) in obj {
                    result.push_str(&format!("{:<20} {}\n", key, value));
                }
                Ok(result)
            } else if let Some(array) = data.as_array() {
                let mut result = String::new();
                for (i, item) in array.iter().enumerate() {
                    result.push_str(&format!("[{}] {}\n", i, item));
                }
                Ok(result)
            } else {
                Ok(data.to_string())
            }
        }
        _ => Ok(serde_json::to_string_pretty(data)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        RftCli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = RftCli::try_parse_from([
            "rft", "--network", "mainnet", "--format", "table", "-v", "policy",
        ])
        .unwrap();
        assert_eq!(cli.network.as_deref(), Some("mainnet"));
        assert_eq!(cli.format, "table");
        assert!(cli.verbose);
        assert!(matches!(cli.command, RftCommand::Policy));
    }

    #[test]
    fn test_parse_reference_tiers() {
        let cli = RftCli::try_parse_from(["rft", "mint-reference", "--tier", "1", "3"]).unwrap();
        match cli.command {
            RftCommand::MintReference(args) => assert_eq!(args.tiers, vec![1, 3]),
            other => panic!("unexpected command {:?}", other),
        }

        let cli = RftCli::try_parse_from(["rft", "mint-reference"]).unwrap();
        match cli.command {
            RftCommand::MintReference(args) => assert!(args.tiers.is_empty()),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_tier_out_of_range_rejected() {
        assert!(RftCli::try_parse_from(["rft", "mint-user", "--tier", "4"]).is_err());
        assert!(RftCli::try_parse_from(["rft", "respend", "--tier", "0"]).is_err());
        assert!(RftCli::try_parse_from(["rft", "respend"]).is_err());
    }

    #[test]
    fn test_unknown_network_rejected() {
        assert!(RftCli::try_parse_from(["rft", "--network", "testnet", "policy"]).is_err());
    }

    #[test]
    fn test_utxo_scope_flags_conflict() {
        assert!(RftCli::try_parse_from(["rft", "utxos", "--wallet", "--contract"]).is_err());
        let cli = RftCli::try_parse_from(["rft", "utxos", "--contract"]).unwrap();
        match cli.command {
            RftCommand::Utxos(args) => assert!(args.contract && !args.wallet),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_format_output_table() {
        let data = serde_json::json!({"policy_id": "abcd"});
        let table = format_output(&data, "table").unwrap();
        assert!(table.starts_with("policy_id"));
        assert!(table.contains("\"abcd\""));

        let json = format_output(&data, "json").unwrap();
        assert!(json.contains("\"policy_id\": \"abcd\""));
    }
}
