//! Desktop wallet glue: config file, key store and the bitcoin send pipeline.

pub mod config;
pub mod error;
pub mod keystore;

use std::path::{Path, PathBuf};

use chain_btc::amount::parse_btc_amount;
use chain_btc::{BtcNetwork, BtcSender, EsploraClient, FinalizedTx, SendRequest, SendResult};

use config::AppConfig;
use error::WalletError;
use keystore::KeyStore;

pub use chain_btc;

pub const CONFIG_FILE: &str = "config.json";

/// A wallet rooted at one data directory.
#[derive(Debug)]
pub struct Wallet {
    data_dir: PathBuf,
    config: AppConfig,
    keys: KeyStore,
}

impl Wallet {
    /// Open the wallet in `data_dir`, creating the directory and a default
    /// config if needed. Key pairs are created lazily per network.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, WalletError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        let config = AppConfig::load_or_create(&data_dir.join(CONFIG_FILE))?;
        let keys = KeyStore::new(&data_dir);
        Ok(Self {
            data_dir,
            config,
            keys,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    /// Replace the config with `value`; see [`AppConfig::update`].
    pub fn update_config(&mut self, value: serde_json::Value) -> Result<&AppConfig, WalletError> {
        self.config = AppConfig::update(&self.config_path(), value)?;
        Ok(&self.config)
    }

    pub fn set_bitcoin_fee(&mut self, fee_sat: u64) -> Result<(), WalletError> {
        if fee_sat == 0 {
            return Err(WalletError::Config("bitcoinFee must be positive".into()));
        }
        self.config.bitcoin_fee = fee_sat;
        self.config.save(&self.config_path())
    }

    /// The wallet's receive address on `network`.
    pub fn bitcoin_address(&self, network: BtcNetwork) -> Result<String, WalletError> {
        self.keys.load_or_create(network)
    }

    /// Confirmed plus unconfirmed balance of the wallet's address, in
    /// satoshis.
    pub async fn bitcoin_balance(&self, network: BtcNetwork) -> Result<u64, WalletError> {
        let address = self.bitcoin_address(network)?;
        let client = EsploraClient::new(self.config.esplora_config())?;
        Ok(client.balance(&address, network).await?)
    }

    /// Build a request from a decimal BTC amount; `fee_sat` defaults to the
    /// configured `bitcoinFee`.
    pub fn send_request(
        &self,
        network: BtcNetwork,
        recipient: &str,
        amount_btc: &str,
        fee_sat: Option<u64>,
    ) -> Result<SendRequest, WalletError> {
        let amount_sat = parse_btc_amount(amount_btc)?;
        let fee_sat = fee_sat.unwrap_or(self.config.bitcoin_fee);
        Ok(SendRequest::new(network, recipient, amount_sat, fee_sat)?)
    }

    /// Collect, build, sign and finalize without broadcasting.
    pub async fn prepare_bitcoin(&self, request: &SendRequest) -> Result<FinalizedTx, WalletError> {
        let material = self.keys.signing_material(request.network())?;
        let finalized = self.sender()?.prepare(&material, request).await?;
        Ok(finalized)
    }

    /// Pay `request` from this wallet and broadcast it.
    pub async fn send(&self, request: &SendRequest) -> Result<SendResult, WalletError> {
        let material = self.keys.signing_material(request.network())?;
        let result = self.sender()?.send(&material, request).await?;
        Ok(result)
    }

    /// Pay `amount_sat` to `recipient` on `network` with a flat `fee_sat`.
    pub async fn send_bitcoin(
        &self,
        network: BtcNetwork,
        recipient: &str,
        amount_sat: u64,
        fee_sat: u64,
    ) -> Result<SendResult, WalletError> {
        let request = SendRequest::new(network, recipient, amount_sat, fee_sat)?;
        self.send(&request).await
    }

    fn sender(&self) -> Result<BtcSender<EsploraClient, EsploraClient>, WalletError> {
        let client = EsploraClient::new(self.config.esplora_config())?;
        Ok(BtcSender::new(client.clone(), client))
    }
}
