//! End-to-end emulator run
//!
//! Base mint, reference mint for every tier, one user mint and one
//! respend of the first tier, then the resulting UTXO sets.

use lib_cip68::Tier;
use lib_types::{Network, TxHash};
use serde::Serialize;

use super::utxos::{handle_utxos, UtxoScope};
use super::{mint_base, mint_reference, mint_user, respend, Context};
use crate::error::{CliError, CliResult};
use crate::output::Output;

/// Transaction ids of each demo stage
#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    pub base_mint: TxHash,
    pub reference_mint: TxHash,
    pub user_mint: TxHash,
    pub respend: TxHash,
}

pub async fn handle_demo(ctx: &Context, format: &str, output: &dyn Output) -> CliResult<DemoReport> {
    let network = ctx.network();
    if network != Network::Emulator {
        return Err(CliError::DemoRequiresEmulator(network));
    }

    let all: Vec<Tier> = ctx.tiers.iter().map(|spec| spec.tier).collect();
    let first = *all
        .first()
        .ok_or_else(|| CliError::InvalidTier("no tiers configured".to_string()))?;

    let report = DemoReport {
        base_mint: mint_base::handle_mint_base(ctx, output).await?,
        reference_mint: mint_reference::handle_mint_reference(ctx, &all, output).await?,
        user_mint: mint_user::handle_mint_user(ctx, first, output).await?,
        respend: respend::handle_respend(ctx, first, output).await?,
    };

    handle_utxos(ctx, UtxoScope::Both, format, output).await?;
    Ok(report)
}
