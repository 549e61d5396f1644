//! UTXO inspection

use lib_types::Address;

use super::Context;
use crate::error::CliResult;
use crate::output::Output;

/// Which addresses to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtxoScope {
    Wallet,
    Contract,
    Both,
}

impl UtxoScope {
    pub fn from_flags(wallet: bool, contract: bool) -> Self {
        match (wallet, contract) {
            (true, false) => UtxoScope::Wallet,
            (false, true) => UtxoScope::Contract,
            _ => UtxoScope::Both,
        }
    }
}

fn targets(ctx: &Context, scope: UtxoScope) -> Vec<(&'static str, Address)> {
    let wallet = ("wallet", ctx.wallet.address());
    let contract = ("contract", ctx.deployment.contract_address);
    match scope {
        UtxoScope::Wallet => vec![wallet],
        UtxoScope::Contract => vec![contract],
        UtxoScope::Both => vec![wallet, contract],
    }
}

/// Print the UTXO sets selected by `scope`
pub async fn handle_utxos(
    ctx: &Context,
    scope: UtxoScope,
    format: &str,
    output: &dyn Output,
) -> CliResult<()> {
    for (label, address) in targets(ctx, scope) {
        let entries = ctx.ledger.utxos_at(&address).await?;
        tracing::debug!(label, count = entries.len(), "Fetched UTXOs");
        output.utxo_set(label, &address, &entries, format)?;
    }
    Ok(())
}
