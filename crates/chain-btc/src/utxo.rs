use std::future::Future;
use std::str::FromStr;

use bitcoin::{OutPoint, ScriptBuf, Txid};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use serde::Deserialize;

use crate::error::BtcError;
use crate::network::BtcNetwork;

/// An unspent output as reported by the listing endpoint.
///
/// The listed value is informational only; signing uses the value resolved
/// from the parent transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListedUtxo {
    /// Transaction ID as a hex string (big-endian / display order).
    pub txid: String,
    /// Output index within the transaction.
    pub vout: u32,
    /// Value in satoshis.
    pub value: u64,
}

/// The script and value of a previous output, read from its parent
/// transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrevOut {
    pub script_pubkey: ScriptBuf,
    pub value_sat: u64,
}

/// A single spendable output, fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    pub txid: Txid,
    pub vout: u32,
    /// Value in satoshis.
    pub value_sat: u64,
    /// The locking script (scriptPubKey).
    pub script_pubkey: ScriptBuf,
}

impl Utxo {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.txid, self.vout)
    }
}

/// Read-only access to the outputs an address can spend.
pub trait UtxoSource {
    /// List every spendable output of `address`, in the source's order.
    fn list_spendable(
        &self,
        address: &str,
        network: BtcNetwork,
    ) -> impl Future<Output = Result<Vec<ListedUtxo>, BtcError>> + Send;

    /// Look up output `vout` of transaction `txid`.
    ///
    /// Fails with `InvalidPrevOutIndex` if the transaction has no such output.
    fn resolve_prev_out(
        &self,
        txid: &str,
        vout: u32,
        network: BtcNetwork,
    ) -> impl Future<Output = Result<PrevOut, BtcError>> + Send;
}

/// Upper bound on parent-transaction lookups in flight at once.
pub const MAX_CONCURRENT_LOOKUPS: usize = 8;

/// List the spendable outputs of `address` and resolve each one against its
/// parent transaction.
///
/// Up to [`MAX_CONCURRENT_LOOKUPS`] lookups run at once; the result keeps
/// listing order. An empty
/// listing fails with `NoSpendableOutputs` before anything is resolved.
pub async fn collect_spendable<S: UtxoSource>(
    source: &S,
    address: &str,
    network: BtcNetwork,
) -> Result<Vec<Utxo>, BtcError> {
    let listed = source.list_spendable(address, network).await?;
    if listed.is_empty() {
        return Err(BtcError::NoSpendableOutputs(address.to_string()));
    }
    tracing::debug!(%network, count = listed.len(), "listed spendable outputs");

    let resolved: Vec<PrevOut> = stream::iter(&listed)
        .map(|utxo| source.resolve_prev_out(&utxo.txid, utxo.vout, network))
        .buffered(MAX_CONCURRENT_LOOKUPS)
        .try_collect()
        .await?;

    listed
        .into_iter()
        .zip(resolved)
        .map(|(listed, prev)| {
            let txid = Txid::from_str(&listed.txid).map_err(|e| BtcError::SourceUnavailable {
                status: None,
                message: format!("malformed txid {:?}: {e}", listed.txid),
            })?;
            if listed.value != prev.value_sat {
                tracing::warn!(
                    txid = %txid,
                    vout = listed.vout,
                    listed = listed.value,
                    resolved = prev.value_sat,
                    "listed value differs from parent transaction, using parent"
                );
            }
            Ok(Utxo {
                txid,
                vout: listed.vout,
                value_sat: prev.value_sat,
                script_pubkey: prev.script_pubkey,
            })
        })
        .collect()
}
