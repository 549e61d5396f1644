//! Base-asset minting

use lib_types::{TxHash, Value};

use super::common::{sign_submit_await, start_tx};
use super::Context;
use crate::error::{CliError, CliResult};
use crate::logic;
use crate::output::Output;

/// Mint the configured supply of the base asset to the wallet
///
/// The base policy must be the wallet's own single-owner native script.
pub async fn handle_mint_base(ctx: &Context, output: &dyn Output) -> CliResult<TxHash> {
    let owner_policy = logic::owner_policy(ctx.wallet.key_hash());
    let owned = owner_policy.hash()?;
    if owned != ctx.policy.base_policy_id {
        return Err(CliError::BasePolicyNotOwned {
            configured: ctx.policy.base_policy_id,
            owned,
        });
    }
    if ctx.base_supply == 0 {
        return Err(CliError::ConfigError("base_supply must be positive".to_string()));
    }

    let base_unit = ctx.policy.base_unit();
    output.action("Mint base asset")?;
    output.detail(&format!("Minting {} of {}", ctx.base_supply, base_unit))?;

    let tx = start_tx(ctx)
        .await?
        .attach_minting_policy(owner_policy)
        .mint_assets(Value::from_asset(base_unit, ctx.base_supply), None)
        .complete()?;
    sign_submit_await(ctx, tx, output, "Base mint").await
}
