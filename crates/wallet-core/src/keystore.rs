//! File-backed bitcoin key pairs, one file per network.

use std::fs;
use std::path::{Path, PathBuf};

use chain_btc::{BtcNetwork, SigningKey, SigningMaterial};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::WalletError;

/// On-disk layout of `bitcoin_wallet_<network>.json`.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
struct WalletFile {
    address: String,
    private_key: String,
}

#[derive(Debug, Clone)]
pub struct KeyStore {
    dir: PathBuf,
}

impl KeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, network: BtcNetwork) -> PathBuf {
        self.dir.join(format!("bitcoin_wallet_{}.json", network.as_str()))
    }

    /// The stored address for `network`, generating and saving a new key pair
    /// when none exists yet.
    pub fn load_or_create(&self, network: BtcNetwork) -> Result<String, WalletError> {
        let path = self.path(network);
        if path.exists() {
            let file = read_wallet_file(&path)?;
            return Ok(file.address.clone());
        }

        let key = SigningKey::generate(network);
        let wif = key.to_wif();
        let file = WalletFile {
            address: key.address().to_string(),
            private_key: wif.as_str().to_string(),
        };
        fs::create_dir_all(&self.dir)?;
        let json = Zeroizing::new(serde_json::to_string_pretty(&file)?);
        fs::write(&path, json.as_bytes())?;
        tracing::info!(%network, address = %file.address, "generated bitcoin wallet");

        Ok(file.address.clone())
    }

    /// Address and key for `network`. Never creates a wallet.
    pub fn signing_material(&self, network: BtcNetwork) -> Result<SigningMaterial, WalletError> {
        let path = self.path(network);
        if !path.exists() {
            return Err(WalletError::WalletNotProvisioned(network.to_string()));
        }
        let file = read_wallet_file(&path)?;
        let key = SigningKey::from_wif(&file.private_key, network)?;
        Ok(SigningMaterial::new(file.address.as_str(), key)?)
    }
}

fn read_wallet_file(path: &Path) -> Result<WalletFile, WalletError> {
    let raw = Zeroizing::new(fs::read_to_string(path)?);
    Ok(serde_json::from_str(&raw)?)
}
