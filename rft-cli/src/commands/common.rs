//! Shared submission helpers

use lib_ledger::new_tx;
use lib_tx::{Transaction, TxBuilder};
use lib_types::TxHash;
use tracing::info;

use super::Context;
use crate::error::CliResult;
use crate::output::Output;

/// Builder funded by the wallet's current UTXOs
pub async fn start_tx(ctx: &Context) -> CliResult<TxBuilder> {
    Ok(new_tx(ctx.ledger.as_ref(), ctx.wallet.address()).await?)
}

/// Sign with the wallet, submit, and wait for confirmation
pub async fn sign_submit_await(
    ctx: &Context,
    tx: Transaction,
    output: &dyn Output,
    action: &str,
) -> CliResult<TxHash> {
    let signed = tx.sign(&ctx.wallet)?;
    let tx_hash = ctx.ledger.submit(&signed).await?;
    info!(%tx_hash, fee = signed.body.fee, "{} submitted", action);
    output.tx_submitted(action, &tx_hash)?;

    ctx.ledger.await_tx(&tx_hash).await?;
    info!(%tx_hash, "{} confirmed", action);
    output.tx_confirmed(action, &tx_hash)?;
    Ok(tx_hash)
}
