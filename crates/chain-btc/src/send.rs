//! The send pipeline: collect → build → sign → finalize → broadcast.

use crate::address::parse_address;
use crate::amount::required_total;
use crate::broadcast::Broadcaster;
use crate::error::BtcError;
use crate::finalize::{finalize, FinalizedTx};
use crate::network::BtcNetwork;
use crate::signer::{sign_all, SigningKey};
use crate::transaction::build_p2wpkh_transaction;
use crate::utxo::{collect_spendable, UtxoSource};

/// A validated request to pay `amount_sat` to `recipient` with a flat
/// `fee_sat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    network: BtcNetwork,
    recipient: String,
    amount_sat: u64,
    fee_sat: u64,
}

impl SendRequest {
    /// Rejects zero amounts, zero fees, overflowing totals and recipients that
    /// are not valid on `network`.
    pub fn new(
        network: BtcNetwork,
        recipient: impl Into<String>,
        amount_sat: u64,
        fee_sat: u64,
    ) -> Result<Self, BtcError> {
        let recipient = recipient.into().trim().to_string();
        if amount_sat == 0 {
            return Err(BtcError::InvalidAmount("amount must be positive".into()));
        }
        if fee_sat == 0 {
            return Err(BtcError::InvalidAmount("fee must be positive".into()));
        }
        required_total(amount_sat, fee_sat)
            .map_err(|_| BtcError::InvalidAmount("amount plus fee overflows".into()))?;
        parse_address(&recipient, network)?;

        Ok(Self {
            network,
            recipient,
            amount_sat,
            fee_sat,
        })
    }

    pub fn network(&self) -> BtcNetwork {
        self.network
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn amount_sat(&self) -> u64 {
        self.amount_sat
    }

    pub fn fee_sat(&self) -> u64 {
        self.fee_sat
    }
}

/// The wallet's address and key for one network.
#[derive(Debug)]
pub struct SigningMaterial {
    address: String,
    key: SigningKey,
}

impl SigningMaterial {
    /// Pair a stored address with its key; the address must be the key's own
    /// P2WPKH address.
    pub fn new(address: impl Into<String>, key: SigningKey) -> Result<Self, BtcError> {
        let address = address.into();
        let expected = key.address().to_string();
        if address.trim() != expected {
            return Err(BtcError::InvalidAddress(format!(
                "{address:?} does not belong to the supplied key"
            )));
        }
        Ok(Self {
            address: expected,
            key,
        })
    }

    pub fn from_key(key: SigningKey) -> Self {
        Self {
            address: key.address().to_string(),
            key,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn network(&self) -> BtcNetwork {
        self.key.network()
    }

    pub fn key(&self) -> &SigningKey {
        &self.key
    }
}

/// Outcome of a successful broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResult {
    pub txid: String,
    pub relay_status: u16,
}

/// Runs the send pipeline against a UTXO source and a relay.
#[derive(Debug, Clone)]
pub struct BtcSender<S, B> {
    source: S,
    broadcaster: B,
}

impl<S: UtxoSource, B: Broadcaster> BtcSender<S, B> {
    pub fn new(source: S, broadcaster: B) -> Self {
        Self {
            source,
            broadcaster,
        }
    }

    /// Collect, build, sign and finalize without broadcasting.
    pub async fn prepare(
        &self,
        material: &SigningMaterial,
        request: &SendRequest,
    ) -> Result<FinalizedTx, BtcError> {
        let network = request.network();
        if material.network() != network {
            return Err(BtcError::NetworkMismatch {
                expected: network.to_string(),
                actual: material.network().to_string(),
            });
        }

        let utxos = collect_spendable(&self.source, material.address(), network).await?;
        tracing::debug!(%network, inputs = utxos.len(), "collected");

        let unsigned = build_p2wpkh_transaction(
            &utxos,
            request.recipient(),
            request.amount_sat(),
            request.fee_sat(),
            material.address(),
            network,
        )?;
        tracing::debug!(outputs = unsigned.tx.output.len(), "built");

        let signed = sign_all(&unsigned, material.key())?;
        tracing::debug!("signed");

        let finalized = finalize(&signed)?;
        tracing::debug!(txid = %finalized.txid(), vsize = finalized.vsize(), "finalized");

        Ok(finalized)
    }

    /// Run the full pipeline and broadcast the result.
    pub async fn send(
        &self,
        material: &SigningMaterial,
        request: &SendRequest,
    ) -> Result<SendResult, BtcError> {
        let finalized = self.prepare(material, request).await?;

        let receipt = self
            .broadcaster
            .submit(&finalized.to_hex(), request.network())
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "broadcast failed"))?;

        let local_txid = finalized.txid().to_string();
        if receipt.txid != local_txid {
            tracing::warn!(
                relay = %receipt.txid,
                local = %local_txid,
                "relay returned a different txid"
            );
        }
        tracing::info!(
            network = %request.network(),
            txid = %receipt.txid,
            status = receipt.status_code,
            amount_sat = request.amount_sat(),
            fee_sat = request.fee_sat(),
            "transaction broadcast"
        );

        Ok(SendResult {
            txid: receipt.txid,
            relay_status: receipt.status_code,
        })
    }
}
