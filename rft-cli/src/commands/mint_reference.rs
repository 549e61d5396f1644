//! Reference-token minting

use lib_cip68::{MintRedeemer, Tier};
use lib_types::{TxHash, Value};
use tracing::info;

use super::common::{sign_submit_await, start_tx};
use super::Context;
use crate::error::CliResult;
use crate::logic;
use crate::output::Output;

/// Mint one reference token per tier in a single transaction, each locked
/// at the contract with its metadata datum
pub async fn handle_mint_reference(
    ctx: &Context,
    tiers: &[Tier],
    output: &dyn Output,
) -> CliResult<TxHash> {
    let locks = logic::reference_locks(
        &ctx.tiers,
        tiers,
        ctx.deployment.policy_id,
        &ctx.description,
        ctx.datum_version,
    )?;

    let mut mint = Value::zero();
    for (unit, _) in &locks {
        mint.add_asset(unit.clone(), 1)?;
    }
    let redeemer = MintRedeemer::MintReferenceTokens {
        tiers: tiers.to_vec(),
    };

    output.action("Mint reference tokens")?;
    let mut builder = start_tx(ctx)
        .await?
        .attach_minting_policy(ctx.deployment.script.clone())
        .mint_assets(mint, Some(redeemer.to_plutus_data()));
    for (unit, datum) in locks {
        builder = builder.pay_to_contract(
            ctx.deployment.contract_address,
            datum,
            Value::from_asset(unit, 1),
        );
    }
    let tx = builder.add_signer(ctx.wallet.key_hash()).complete()?;
    let tx_hash = sign_submit_await(ctx, tx, output, "Reference mint").await?;

    let locked = ctx.ledger.utxos_at(&ctx.deployment.contract_address).await?;
    info!(count = locked.len(), "Contract UTXOs after reference mint");
    Ok(tx_hash)
}
