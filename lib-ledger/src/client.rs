//! Ledger capability

use async_trait::async_trait;
use lib_tx::{ProtocolParams, Transaction, TxBuilder};
use lib_types::{Address, Network, TxHash, Unit};
use lib_utxo::UtxoEntry;

use crate::errors::LedgerResult;

/// Everything the issuance actions need from a ledger
#[async_trait]
pub trait LedgerClient: Send + Sync {
    fn network(&self) -> Network;

    async fn protocol_params(&self) -> LedgerResult<ProtocolParams>;

    /// Live UTXOs at `address`, ordered by outpoint
    async fn utxos_at(&self, address: &Address) -> LedgerResult<Vec<UtxoEntry>>;

    /// Live UTXOs at `address` holding at least one `unit`
    async fn utxos_with_unit(&self, address: &Address, unit: &Unit) -> LedgerResult<Vec<UtxoEntry>> {
        Ok(self
            .utxos_at(address)
            .await?
            .into_iter()
            .filter(|entry| entry.utxo.holds(unit))
            .collect())
    }

    /// Submit a signed transaction, returning its id
    async fn submit(&self, tx: &Transaction) -> LedgerResult<TxHash>;

    /// Wait until `tx_hash` is on chain
    async fn await_tx(&self, tx_hash: &TxHash) -> LedgerResult<()>;
}

/// Start a builder funded by the UTXOs at `wallet_address`
pub async fn new_tx(ledger: &dyn LedgerClient, wallet_address: Address) -> LedgerResult<TxBuilder> {
    let params = ledger.protocol_params().await?;
    let utxos = ledger.utxos_at(&wallet_address).await?;
    Ok(TxBuilder::new(params, wallet_address, utxos))
}
