//! Command handlers (imperative shell)
//!
//! Each handler takes the shared [`Context`] and an [`Output`], talks to the
//! ledger, and returns what it produced so callers and tests can inspect it.

pub mod common;
pub mod context;
pub mod demo;
pub mod mint_base;
pub mod mint_reference;
pub mod mint_user;
pub mod policy;
pub mod respend;
pub mod utxos;

pub use context::{build_context, emulator_context, live_context, Context};

use lib_cip68::Tier;

use crate::argument_parsing::{RftCli, RftCommand};
use crate::cli_config::load_config;
use crate::error::CliResult;
use crate::logic;
use crate::output::Output;

/// Load configuration, build the context and run the selected command
pub async fn dispatch(cli: &RftCli, output: &dyn Output) -> CliResult<()> {
    logic::validate_output_format(&cli.format)?;
    let cli_network = cli
        .network
        .as_deref()
        .map(logic::parse_network)
        .transpose()?;
    let config = load_config(cli.config.as_deref(), cli_network)?;
    let network = logic::resolve_network(&config, cli_network);
    let ctx = build_context(&config, network)?;

    match &cli.command {
        RftCommand::Policy => policy::handle_policy(&ctx, &cli.format, output),
        RftCommand::MintBase => mint_base::handle_mint_base(&ctx, output).await.map(|_| ()),
        RftCommand::MintReference(args) => {
            let tiers = if args.tiers.is_empty() {
                ctx.tiers.iter().map(|spec| spec.tier).collect::<Vec<Tier>>()
            } else {
                logic::parse_tiers(&args.tiers)?
            };
            mint_reference::handle_mint_reference(&ctx, &tiers, output)
                .await
                .map(|_| ())
        }
        RftCommand::MintUser(args) => {
            mint_user::handle_mint_user(&ctx, Tier::new(args.tier)?, output)
                .await
                .map(|_| ())
        }
        RftCommand::Respend(args) => {
            respend::handle_respend(&ctx, Tier::new(args.tier)?, output)
                .await
                .map(|_| ())
        }
        RftCommand::Utxos(args) => {
            let scope = utxos::UtxoScope::from_flags(args.wallet, args.contract);
            utxos::handle_utxos(&ctx, scope, &cli.format, output).await
        }
        RftCommand::Demo => {
            let report = demo::handle_demo(&ctx, &cli.format, output).await?;
            output.json(&serde_json::to_value(&report)?)
        }
    }
}
