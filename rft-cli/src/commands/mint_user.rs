//! User-token minting

use lib_cip68::{MintRedeemer, PlutusData, Tier};
use lib_types::{TxHash, Value};

use super::common::{sign_submit_await, start_tx};
use super::Context;
use crate::error::CliResult;
use crate::output::Output;

/// Mint one user token of `tier`, paying its price into the contract
pub async fn handle_mint_user(ctx: &Context, tier: Tier, output: &dyn Output) -> CliResult<TxHash> {
    let price = ctx.tiers.get(tier)?.price;
    let user_unit = ctx.user_unit(tier)?;

    output.action("Mint user token")?;
    output.detail(&format!(
        "Tier {} costs {} {}",
        tier,
        price,
        ctx.policy.base_asset_name.to_text_lossy()
    ))?;

    let tx = start_tx(ctx)
        .await?
        .attach_minting_policy(ctx.deployment.script.clone())
        .mint_assets(
            Value::from_asset(user_unit, 1),
            Some(MintRedeemer::MintRft { tier }.to_plutus_data()),
        )
        .pay_to_contract(
            ctx.deployment.contract_address,
            PlutusData::unit(),
            Value::from_asset(ctx.policy.base_unit(), price),
        )
        .complete()?;
    sign_submit_await(ctx, tx, output, "User mint").await
}
