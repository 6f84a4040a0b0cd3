//! Witness assembly and wire-format serialization.

use bitcoin::consensus::{deserialize, serialize};
use bitcoin::{Transaction, Txid, Witness};

use crate::error::BtcError;
use crate::signer::SignedBtcTx;

/// DER signature (max 72 bytes) plus the sighash type byte.
const MAX_SIGNATURE_LEN: usize = 73;

/// Consensus limit on a script's size.
const MAX_SCRIPT_SIZE: usize = 10_000;

/// Standardness limit on transaction weight.
const MAX_STANDARD_TX_WEIGHT: u64 = 400_000;

/// A fully witnessed transaction and its consensus encoding.
#[derive(Debug, Clone)]
pub struct FinalizedTx {
    pub tx: Transaction,
    pub bytes: Vec<u8>,
}

impl FinalizedTx {
    pub fn txid(&self) -> Txid {
        self.tx.compute_txid()
    }

    /// Raw transaction as lowercase hex, ready for a relay.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    pub fn weight(&self) -> u64 {
        self.tx.weight().to_wu()
    }

    pub fn vsize(&self) -> usize {
        self.tx.vsize()
    }
}

/// Turn every attached proof into a `[signature, pubkey]` witness and
/// serialize the result.
///
/// Refuses to produce bytes while any input is unsigned.
pub fn finalize(signed: &SignedBtcTx) -> Result<FinalizedTx, BtcError> {
    if let Some(input_index) = signed.first_unsigned_input() {
        return Err(BtcError::IncompleteSignature { input_index });
    }

    let mut tx = signed.unsigned.tx.clone();
    for (input_index, input) in tx.input.iter_mut().enumerate() {
        let proof = signed
            .proof(input_index)
            .ok_or(BtcError::IncompleteSignature { input_index })?;

        let signature = proof.signature.to_vec();
        if signature.len() > MAX_SIGNATURE_LEN {
            return Err(BtcError::SerializationError(format!(
                "signature of input {input_index} is {} bytes",
                signature.len()
            )));
        }

        input.witness = Witness::p2wpkh(&proof.signature, &proof.public_key.0);
    }

    for (index, output) in tx.output.iter().enumerate() {
        if output.script_pubkey.len() > MAX_SCRIPT_SIZE {
            return Err(BtcError::SerializationError(format!(
                "script of output {index} is {} bytes",
                output.script_pubkey.len()
            )));
        }
    }

    let weight = tx.weight().to_wu();
    if weight > MAX_STANDARD_TX_WEIGHT {
        return Err(BtcError::SerializationError(format!(
            "transaction weight {weight} exceeds {MAX_STANDARD_TX_WEIGHT}"
        )));
    }

    let bytes = serialize(&tx);
    Ok(FinalizedTx { tx, bytes })
}

/// Parse a hex-encoded raw transaction. Trailing bytes are an error.
pub fn parse_raw_transaction(raw_hex: &str) -> Result<Transaction, BtcError> {
    let bytes = hex::decode(raw_hex.trim())
        .map_err(|e| BtcError::SerializationError(format!("invalid hex: {e}")))?;
    deserialize(&bytes)
        .map_err(|e| BtcError::SerializationError(format!("invalid transaction: {e}")))
}
