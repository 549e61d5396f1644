//! Reference-token respend

use lib_cip68::{SpendRedeemer, Tier};
use lib_types::{TxHash, Value};
use tracing::debug;

use super::common::{sign_submit_await, start_tx};
use super::Context;
use crate::error::{CliError, CliResult};
use crate::logic;
use crate::output::Output;

/// Consume the contract UTXO holding the tier's reference token and
/// re-lock the token with a refreshed datum in the same transaction
///
/// Fails with [`CliError::ReferenceTokenNotFound`] before anything is built
/// when no contract UTXO holds the token.
pub async fn handle_respend(ctx: &Context, tier: Tier, output: &dyn Output) -> CliResult<TxHash> {
    let spec = ctx.tiers.get(tier)?;
    let unit = ctx.reference_unit(tier)?;
    let contract = ctx.deployment.contract_address;

    let locked = ctx.ledger.utxos_with_unit(&contract, &unit).await?;
    let entry = logic::find_reference_utxo(&locked, &unit).ok_or(CliError::ReferenceTokenNotFound {
        tier: tier.index(),
    })?;
    debug!(outpoint = %entry.outpoint, "Respending reference token");

    output.action("Respend reference token")?;
    let datum = spec
        .datum(&ctx.description, ctx.datum_version)
        .to_plutus_data();
    let tx = start_tx(ctx)
        .await?
        .collect_from(vec![entry], Some(SpendRedeemer::new(tier).to_plutus_data()))
        .attach_spending_validator(ctx.deployment.script.clone())
        .pay_to_contract(contract, datum, Value::from_asset(unit, 1))
        .add_signer(ctx.wallet.key_hash())
        .complete()?;
    sign_submit_await(ctx, tx, output, "Respend").await
}
