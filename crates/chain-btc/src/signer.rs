//! Per-input signing for P2WPKH spends.
//!
//! Each input commits (BIP-143) to its own previous value and script, so the
//! inputs are signed independently. Proofs are attached to a [`SignedBtcTx`]
//! and only turned into witnesses by [`crate::finalize`].

use bitcoin::address::Address;
use bitcoin::ecdsa;
use bitcoin::hashes::Hash;
use bitcoin::script::ScriptBuf;
use bitcoin::secp256k1::{rand, Message, PublicKey, Secp256k1, SecretKey};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{CompressedPublicKey, PrivateKey};
use zeroize::Zeroizing;

use crate::address::p2wpkh_address;
use crate::error::BtcError;
use crate::network::BtcNetwork;
use crate::transaction::UnsignedBtcTx;

/// A compressed secp256k1 private key bound to one network.
pub struct SigningKey {
    secret: SecretKey,
    public: CompressedPublicKey,
    network: BtcNetwork,
}

impl SigningKey {
    /// Parse a WIF-encoded private key. The key must be compressed and its
    /// version byte must match `network`.
    pub fn from_wif(wif: &str, network: BtcNetwork) -> Result<Self, BtcError> {
        let private_key = PrivateKey::from_wif(wif.trim())
            .map_err(|e| BtcError::InvalidPrivateKey(format!("invalid WIF: {e}")))?;
        if private_key.network != network.kind() {
            return Err(BtcError::NetworkMismatch {
                expected: network.to_string(),
                actual: format!("{:?}", private_key.network),
            });
        }
        if !private_key.compressed {
            return Err(BtcError::InvalidPrivateKey(
                "uncompressed keys cannot own P2WPKH outputs".into(),
            ));
        }
        Ok(Self::from_secret(private_key.inner, network))
    }

    /// Build from a raw 32-byte secp256k1 scalar.
    pub fn from_secret_bytes(bytes: &[u8; 32], network: BtcNetwork) -> Result<Self, BtcError> {
        let secret = SecretKey::from_slice(bytes)
            .map_err(|e| BtcError::InvalidPrivateKey(format!("invalid secret key: {e}")))?;
        Ok(Self::from_secret(secret, network))
    }

    /// Generate a fresh random key.
    pub fn generate(network: BtcNetwork) -> Self {
        let secret = SecretKey::new(&mut rand::thread_rng());
        Self::from_secret(secret, network)
    }

    fn from_secret(secret: SecretKey, network: BtcNetwork) -> Self {
        let secp = Secp256k1::new();
        let public = CompressedPublicKey(PublicKey::from_secret_key(&secp, &secret));
        Self {
            secret,
            public,
            network,
        }
    }

    pub fn network(&self) -> BtcNetwork {
        self.network
    }

    pub fn public_key(&self) -> CompressedPublicKey {
        self.public
    }

    /// The P2WPKH address this key controls.
    pub fn address(&self) -> Address {
        p2wpkh_address(&self.public, self.network)
    }

    /// The P2WPKH output script this key can spend.
    pub fn script_pubkey(&self) -> ScriptBuf {
        ScriptBuf::new_p2wpkh(&self.public.wpubkey_hash())
    }

    /// Export as WIF (compressed).
    pub fn to_wif(&self) -> Zeroizing<String> {
        Zeroizing::new(PrivateKey::new(self.secret, self.network.kind()).to_wif())
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("public", &self.public)
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}

impl Drop for SigningKey {
    fn drop(&mut self) {
        self.secret.non_secure_erase();
    }
}

/// The signature and public key that authorize spending one P2WPKH input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WitnessProof {
    pub public_key: CompressedPublicKey,
    pub signature: ecdsa::Signature,
}

/// An unsigned transaction plus one optional proof per input.
#[derive(Debug, Clone)]
pub struct SignedBtcTx {
    pub unsigned: UnsignedBtcTx,
    proofs: Vec<Option<WitnessProof>>,
}

impl SignedBtcTx {
    /// Wrap an unsigned transaction with no proofs attached.
    pub fn from_unsigned(unsigned: UnsignedBtcTx) -> Self {
        let proofs = vec![None; unsigned.tx.input.len()];
        Self { unsigned, proofs }
    }

    /// Attach (or replace) the proof for one input.
    pub fn attach_proof(
        &mut self,
        input_index: usize,
        proof: WitnessProof,
    ) -> Result<(), BtcError> {
        let slot = self.proofs.get_mut(input_index).ok_or_else(|| {
            BtcError::SigningError(format!("input {input_index} out of range"))
        })?;
        *slot = Some(proof);
        Ok(())
    }

    pub fn proof(&self, input_index: usize) -> Option<&WitnessProof> {
        self.proofs.get(input_index).and_then(Option::as_ref)
    }

    /// Index of the first input without a proof.
    pub fn first_unsigned_input(&self) -> Option<usize> {
        self.proofs.iter().position(Option::is_none)
    }

    pub fn is_complete(&self) -> bool {
        self.first_unsigned_input().is_none()
    }

    pub fn input_count(&self) -> usize {
        self.proofs.len()
    }
}

/// Sign every input of `unsigned` with `key`.
///
/// Every previous output must be the P2WPKH script of `key`; anything else
/// fails before a signature is produced.
pub fn sign_all(unsigned: &UnsignedBtcTx, key: &SigningKey) -> Result<SignedBtcTx, BtcError> {
    if unsigned.prevouts.len() != unsigned.tx.input.len() {
        return Err(BtcError::SigningError(format!(
            "{} inputs but {} previous outputs",
            unsigned.tx.input.len(),
            unsigned.prevouts.len()
        )));
    }

    let secp = Secp256k1::new();
    let own_script = key.script_pubkey();
    let mut signed = SignedBtcTx::from_unsigned(unsigned.clone());
    let mut sighash_cache = SighashCache::new(&unsigned.tx);

    for (input_index, prevout) in unsigned.prevouts.iter().enumerate() {
        check_spendable(input_index, &prevout.script_pubkey, &own_script)?;

        let sighash = sighash_cache
            .p2wpkh_signature_hash(
                input_index,
                &prevout.script_pubkey,
                prevout.value,
                EcdsaSighashType::All,
            )
            .map_err(|e| BtcError::SigningError(format!("sighash computation failed: {e}")))?;

        let msg = Message::from_digest(sighash.to_byte_array());
        let signature = secp.sign_ecdsa(&msg, &key.secret);

        signed.attach_proof(
            input_index,
            WitnessProof {
                public_key: key.public,
                signature: ecdsa::Signature::sighash_all(signature),
            },
        )?;
        tracing::trace!(input_index, "signed input");
    }

    Ok(signed)
}

/// Check the proof attached to `input_index` against the transaction as it
/// stands now.
pub fn verify_input(signed: &SignedBtcTx, input_index: usize) -> Result<(), BtcError> {
    let proof = signed
        .proof(input_index)
        .ok_or(BtcError::IncompleteSignature { input_index })?;
    let prevout = signed.unsigned.prevouts.get(input_index).ok_or_else(|| {
        BtcError::SigningError(format!("no previous output for input {input_index}"))
    })?;

    let proof_script = ScriptBuf::new_p2wpkh(&proof.public_key.wpubkey_hash());
    check_spendable(input_index, &prevout.script_pubkey, &proof_script)?;

    let sighash = SighashCache::new(&signed.unsigned.tx)
        .p2wpkh_signature_hash(
            input_index,
            &prevout.script_pubkey,
            prevout.value,
            proof.signature.sighash_type,
        )
        .map_err(|e| BtcError::SigningError(format!("sighash computation failed: {e}")))?;

    let msg = Message::from_digest(sighash.to_byte_array());
    Secp256k1::verification_only()
        .verify_ecdsa(&msg, &proof.signature.signature, &proof.public_key.0)
        .map_err(|e| BtcError::SigningError(format!("input {input_index}: {e}")))
}

fn check_spendable(
    input_index: usize,
    prev_script: &ScriptBuf,
    own_script: &ScriptBuf,
) -> Result<(), BtcError> {
    if !prev_script.is_p2wpkh() {
        return Err(BtcError::UnsupportedScript {
            input_index,
            script_hex: prev_script.to_hex_string(),
        });
    }
    if prev_script != own_script {
        return Err(BtcError::SigningKeyMismatch { input_index });
    }
    Ok(())
}
