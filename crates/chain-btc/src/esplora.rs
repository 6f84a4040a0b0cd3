//! Esplora REST client (blockstream.info, mempool.space and compatibles).
//!
//! Implements both [`UtxoSource`] and [`Broadcaster`] on top of
//! - `GET  {base}/address/{address}/utxo`
//! - `GET  {base}/tx/{txid}`
//! - `POST {base}/tx`

use std::time::Duration;

use bitcoin::ScriptBuf;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use crate::broadcast::{BroadcastReceipt, Broadcaster};
use crate::error::BtcError;
use crate::network::BtcNetwork;
use crate::utxo::{ListedUtxo, PrevOut, UtxoSource};

/// API base URLs per network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EsploraConfig {
    pub mainnet_base: String,
    pub testnet_base: String,
    /// Per-request timeout. `None` leaves deadlines to the caller.
    pub timeout: Option<Duration>,
}

impl Default for EsploraConfig {
    fn default() -> Self {
        Self {
            mainnet_base: BtcNetwork::Mainnet.default_api_base().to_string(),
            testnet_base: BtcNetwork::Testnet.default_api_base().to_string(),
            timeout: None,
        }
    }
}

impl EsploraConfig {
    pub fn base_url(&self, network: BtcNetwork) -> &str {
        let base = match network {
            BtcNetwork::Mainnet => &self.mainnet_base,
            BtcNetwork::Testnet => &self.testnet_base,
        };
        base.trim_end_matches('/')
    }
}

#[derive(Debug, Deserialize)]
struct TxResponse {
    vout: Vec<TxOutResponse>,
}

#[derive(Debug, Deserialize)]
struct TxOutResponse {
    scriptpubkey: String,
    value: u64,
}

#[derive(Debug, Deserialize)]
struct AddressResponse {
    chain_stats: TxoStats,
    mempool_stats: TxoStats,
}

#[derive(Debug, Deserialize)]
struct TxoStats {
    funded_txo_sum: u64,
    spent_txo_sum: u64,
}

impl AddressResponse {
    /// Confirmed plus mempool balance. A mempool spend of a confirmed output
    /// makes the mempool side negative on its own, so the sums are netted
    /// across both blocks.
    fn balance_sat(&self) -> Result<u64, BtcError> {
        let funded = self
            .chain_stats
            .funded_txo_sum
            .checked_add(self.mempool_stats.funded_txo_sum)
            .ok_or(BtcError::ValueOverflow)?;
        let spent = self
            .chain_stats
            .spent_txo_sum
            .checked_add(self.mempool_stats.spent_txo_sum)
            .ok_or(BtcError::ValueOverflow)?;
        funded.checked_sub(spent).ok_or(BtcError::ValueOverflow)
    }
}

/// HTTP client for an Esplora API.
#[derive(Debug, Clone)]
pub struct EsploraClient {
    config: EsploraConfig,
    client: reqwest::Client,
}

impl EsploraClient {
    pub fn new(config: EsploraConfig) -> Result<Self, BtcError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            BtcError::NetworkUnreachable(format!("failed to build HTTP client: {e}"))
        })?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &EsploraConfig {
        &self.config
    }

    /// Balance of `address` in satoshis, mempool included.
    pub async fn balance(&self, address: &str, network: BtcNetwork) -> Result<u64, BtcError> {
        let stats: AddressResponse = self
            .get_json(network, &format!("address/{address}"))
            .await?;
        let balance = stats.balance_sat()?;
        tracing::debug!(%network, balance_sat = balance, "fetched balance");
        Ok(balance)
    }

    /// GET `{base}/{path}` and decode JSON; any failure is `SourceUnavailable`.
    async fn get_json<T: serde::de::DeserializeOwned + Send>(
        &self,
        network: BtcNetwork,
        path: &str,
    ) -> Result<T, BtcError> {
        let url = format!("{}/{}", self.config.base_url(network), path);
        tracing::debug!(%url, "esplora GET");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BtcError::SourceUnavailable {
                status: None,
                message: format!("GET {url}: {e}"),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BtcError::SourceUnavailable {
                status: Some(status.as_u16()),
                message: format!("GET {url}: HTTP {status} {body}"),
            });
        }

        resp.json().await.map_err(|e| BtcError::SourceUnavailable {
            status: Some(status.as_u16()),
            message: format!("GET {url}: malformed response: {e}"),
        })
    }
}

impl UtxoSource for EsploraClient {
    async fn list_spendable(
        &self,
        address: &str,
        network: BtcNetwork,
    ) -> Result<Vec<ListedUtxo>, BtcError> {
        self.get_json(network, &format!("address/{address}/utxo"))
            .await
    }

    async fn resolve_prev_out(
        &self,
        txid: &str,
        vout: u32,
        network: BtcNetwork,
    ) -> Result<PrevOut, BtcError> {
        let tx: TxResponse = self.get_json(network, &format!("tx/{txid}")).await?;
        let out = tx
            .vout
            .into_iter()
            .nth(vout as usize)
            .ok_or_else(|| BtcError::InvalidPrevOutIndex {
                txid: txid.to_string(),
                vout,
            })?;

        let script_pubkey =
            ScriptBuf::from_hex(&out.scriptpubkey).map_err(|e| BtcError::SourceUnavailable {
                status: None,
                message: format!("malformed scriptpubkey for {txid}:{vout}: {e}"),
            })?;

        Ok(PrevOut {
            script_pubkey,
            value_sat: out.value,
        })
    }
}

impl Broadcaster for EsploraClient {
    async fn submit(
        &self,
        raw_tx_hex: &str,
        network: BtcNetwork,
    ) -> Result<BroadcastReceipt, BtcError> {
        let url = format!("{}/tx", self.config.base_url(network));
        tracing::debug!(%url, bytes = raw_tx_hex.len() / 2, "esplora POST");

        let resp = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "text/plain")
            .body(raw_tx_hex.to_string())
            .send()
            .await
            .map_err(|e| BtcError::NetworkUnreachable(format!("POST {url}: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| BtcError::NetworkUnreachable(format!("POST {url}: {e}")))?;

        if !status.is_success() {
            return Err(BtcError::RelayRejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(BroadcastReceipt {
            txid: body.trim().to_string(),
            status_code: status.as_u16(),
        })
    }
}
