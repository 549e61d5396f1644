//! Blockfrost Indexer Client
//!
//! Live ledger backend over the Blockfrost REST API. Requests carry the
//! project credential in the `project_id` header.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lib_cip68::PlutusData;
use lib_tx::{ProtocolParams, Transaction};
use lib_types::{Address, Network, TxHash, Unit, Value, LOVELACE_UNIT};
use lib_utxo::{OutPoint, Utxo, UtxoEntry};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

use crate::client::LedgerClient;
use crate::errors::{LedgerError, LedgerResult};

/// Mainnet API root
pub const MAINNET_URL: &str = "https://cardano-mainnet.blockfrost.io/api/v0";

/// Blockfrost page size limit
const PAGE_SIZE: usize = 100;

/// Default interval between confirmation polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default time to wait for a confirmation
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(600);

/// One entry of `/addresses/{address}/utxos`
#[derive(Debug, Deserialize)]
pub struct BlockfrostUtxo {
    pub address: String,
    pub tx_hash: String,
    pub output_index: u32,
    pub amount: Vec<BlockfrostAmount>,
    #[serde(default)]
    pub inline_datum: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BlockfrostAmount {
    pub unit: String,
    pub quantity: String,
}

/// Subset of `/epochs/latest/parameters`
#[derive(Debug, Deserialize)]
pub struct BlockfrostParams {
    pub min_fee_a: u64,
    pub min_fee_b: u64,
    pub max_tx_size: usize,
    pub coins_per_utxo_size: Option<String>,
    pub collateral_percent: Option<u64>,
    pub price_mem: Option<f64>,
    pub price_step: Option<f64>,
    /// Cost models as ordered integer lists, keyed by language
    #[serde(default)]
    pub cost_models_raw: Option<BTreeMap<String, Vec<i64>>>,
}

#[derive(Debug, Deserialize)]
struct BlockfrostApiError {
    #[serde(default)]
    message: String,
}

impl BlockfrostUtxo {
    /// Convert to a ledger UTXO entry
    pub fn into_entry(self) -> LedgerResult<UtxoEntry> {
        let tx_hash = TxHash::from_hex(&self.tx_hash)
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;
        let address = Address::from_bech32(&self.address)
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;

        let mut value = Value::zero();
        for amount in &self.amount {
            let quantity: u64 = amount.quantity.parse().map_err(|_| {
                LedgerError::InvalidResponse(format!("bad quantity '{}'", amount.quantity))
            })?;
            if amount.unit == LOVELACE_UNIT {
                value.lovelace = quantity;
            } else {
                let unit = Unit::from_hex(&amount.unit)
                    .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;
                value
                    .add_asset(unit, quantity)
                    .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;
            }
        }

        let mut utxo = Utxo::new(address, value, 0);
        if let Some(datum) = &self.inline_datum {
            let bytes = hex::decode(datum).map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;
            utxo.datum = Some(
                PlutusData::from_cbor(&bytes)
                    .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?,
            );
        }
        Ok(UtxoEntry::new(OutPoint::new(tx_hash, self.output_index), utxo))
    }
}

impl BlockfrostParams {
    /// Map onto builder parameters, keeping defaults for missing fields
    pub fn into_params(self) -> LedgerResult<ProtocolParams> {
        let mut params = ProtocolParams {
            min_fee_a: self.min_fee_a,
            min_fee_b: self.min_fee_b,
            max_tx_size: self.max_tx_size,
            ..ProtocolParams::default()
        };
        if let Some(coins) = self.coins_per_utxo_size {
            params.coins_per_utxo_byte = coins.parse().map_err(|_| {
                LedgerError::InvalidResponse(format!("bad coins_per_utxo_size '{}'", coins))
            })?;
        }
        if let Some(percent) = self.collateral_percent {
            params.collateral_percentage = percent;
        }
        if let Some(price) = self.price_mem {
            params.price_mem_per_10k = (price * 10_000.0).round() as u64;
        }
        if let Some(price) = self.price_step {
            params.price_step_per_10m = (price * 10_000_000.0).round() as u64;
        }
        if let Some(costs) = self.cost_models_raw.and_then(|mut m| m.remove("PlutusV2")) {
            params.plutus_v2_cost_model = costs;
        }
        Ok(params)
    }
}

/// Blockfrost-backed ledger
pub struct BlockfrostClient {
    base_url: String,
    project_id: String,
    network: Network,
    client: reqwest::Client,
    poll_interval: Duration,
    confirm_timeout: Duration,
}

impl BlockfrostClient {
    pub fn new(base_url: impl Into<String>, project_id: impl Into<String>, network: Network) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            network,
            client: reqwest::Client::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
        }
    }

    /// Read the project credential from a file
    pub fn from_credential_file(
        base_url: impl Into<String>,
        path: &Path,
        network: Network,
    ) -> LedgerResult<Self> {
        let project_id = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::Credential(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let project_id = project_id.trim();
        if project_id.is_empty() {
            return Err(LedgerError::Credential(format!("{} is empty", path.display())));
        }
        Ok(Self::new(base_url, project_id, network))
    }

    /// Override confirmation polling
    pub fn with_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = interval;
        self.confirm_timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn api_error(resp: reqwest::Response) -> LedgerError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<BlockfrostApiError>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        LedgerError::Api { status, message }
    }

    /// Every page of a UTXO listing; 404 means the address was never used
    async fn fetch_utxos(&self, path: &str) -> LedgerResult<Vec<UtxoEntry>> {
        let mut entries = Vec::new();
        for page in 1.. {
            let resp = self
                .client
                .get(self.url(path))
                .header("project_id", &self.project_id)
                .query(&[("page", page.to_string()), ("count", PAGE_SIZE.to_string())])
                .send()
                .await?;
            if resp.status() == StatusCode::NOT_FOUND {
                break;
            }
            if !resp.status().is_success() {
                return Err(Self::api_error(resp).await);
            }
            let batch: Vec<BlockfrostUtxo> = resp.json().await?;
            let last_page = batch.len() < PAGE_SIZE;
            for utxo in batch {
                entries.push(utxo.into_entry()?);
            }
            if last_page {
                break;
            }
        }
        entries.sort_by_key(|e| e.outpoint);
        Ok(entries)
    }
}

#[async_trait]
impl LedgerClient for BlockfrostClient {
    fn network(&self) -> Network {
        self.network
    }

    async fn protocol_params(&self) -> LedgerResult<ProtocolParams> {
        let resp = self
            .client
            .get(self.url("/epochs/latest/parameters"))
            .header("project_id", &self.project_id)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::api_error(resp).await);
        }
        resp.json::<BlockfrostParams>().await?.into_params()
    }

    async fn utxos_at(&self, address: &Address) -> LedgerResult<Vec<UtxoEntry>> {
        let entries = self.fetch_utxos(&format!("/addresses/{}/utxos", address)).await?;
        debug!(%address, count = entries.len(), "Fetched UTXOs");
        Ok(entries)
    }

    async fn utxos_with_unit(&self, address: &Address, unit: &Unit) -> LedgerResult<Vec<UtxoEntry>> {
        let entries = self
            .fetch_utxos(&format!("/addresses/{}/utxos/{}", address, unit))
            .await?;
        debug!(%address, %unit, count = entries.len(), "Fetched UTXOs holding unit");
        Ok(entries)
    }

    async fn submit(&self, tx: &Transaction) -> LedgerResult<TxHash> {
        let resp = self
            .client
            .post(self.url("/tx/submit"))
            .header("project_id", &self.project_id)
            .header(reqwest::header::CONTENT_TYPE, "application/cbor")
            .body(tx.to_cbor()?)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Self::api_error(resp).await);
        }
        let hash: String = resp.json().await?;
        let tx_hash =
            TxHash::from_hex(&hash).map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;
        info!(%tx_hash, "Submitted transaction");
        Ok(tx_hash)
    }

    async fn await_tx(&self, tx_hash: &TxHash) -> LedgerResult<()> {
        let started = Instant::now();
        loop {
            let resp = self
                .client
                .get(self.url(&format!("/txs/{}", tx_hash)))
                .header("project_id", &self.project_id)
                .send()
                .await?;
            match resp.status() {
                status if status.is_success() => {
                    info!(%tx_hash, waited_secs = started.elapsed().as_secs(), "Transaction confirmed");
                    return Ok(());
                }
                StatusCode::NOT_FOUND => {}
                _ => return Err(Self::api_error(resp).await),
            }
            if started.elapsed() >= self.confirm_timeout {
                return Err(LedgerError::Timeout {
                    tx_hash: *tx_hash,
                    waited_secs: started.elapsed().as_secs(),
                });
            }
            debug!(%tx_hash, "Not yet on chain");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
