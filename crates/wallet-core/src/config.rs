//! `config.json`: per-network endpoints and default fees.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chain_btc::{BtcNetwork, EsploraConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WalletError;

/// Fee applied when a config omits `bitcoinFee`.
pub const FALLBACK_BITCOIN_FEE: u64 = 25;
/// Gas price applied when a config omits `gasPrice`.
pub const FALLBACK_GAS_PRICE: u64 = 20;

const DEFAULT_BITCOIN_FEE: u64 = 250;
const DEFAULT_GAS_LIMIT: u64 = 21_000;
const DEFAULT_GAS_PRICE: u64 = 25;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Flat fee in satoshis for bitcoin sends.
    #[serde(default = "fallback_bitcoin_fee")]
    pub bitcoin_fee: u64,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    #[serde(default = "fallback_gas_price")]
    pub gas_price: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    pub testnet: NetworkSection,
    pub mainnet: NetworkSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSection {
    pub bitcoin: BitcoinSection,
    #[serde(default)]
    pub ethereum: EthereumSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitcoinSection {
    pub api_base: String,
}

/// Carried through untouched; only the bitcoin side is used here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EthereumSection {
    #[serde(default)]
    pub network: String,
    #[serde(default)]
    pub rpc_url: String,
}

fn fallback_bitcoin_fee() -> u64 {
    FALLBACK_BITCOIN_FEE
}

fn fallback_gas_price() -> u64 {
    FALLBACK_GAS_PRICE
}

fn default_gas_limit() -> u64 {
    DEFAULT_GAS_LIMIT
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bitcoin_fee: DEFAULT_BITCOIN_FEE,
            gas_limit: DEFAULT_GAS_LIMIT,
            gas_price: DEFAULT_GAS_PRICE,
            request_timeout_secs: None,
            testnet: NetworkSection {
                bitcoin: BitcoinSection {
                    api_base: BtcNetwork::Testnet.default_api_base().to_string(),
                },
                ethereum: EthereumSection {
                    network: "sepolia".into(),
                    rpc_url: "https://sepolia.infura.io/v3/PASTE_YOUR_API_KEY_HERE".into(),
                },
            },
            mainnet: NetworkSection {
                bitcoin: BitcoinSection {
                    api_base: BtcNetwork::Mainnet.default_api_base().to_string(),
                },
                ethereum: EthereumSection {
                    network: "mainnet".into(),
                    rpc_url: "https://mainnet.infura.io/v3/PASTE_YOUR_API_KEY_HERE".into(),
                },
            },
        }
    }
}

impl AppConfig {
    /// Read `path`, writing the default config there first if it is missing.
    pub fn load_or_create(path: &Path) -> Result<Self, WalletError> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            tracing::info!(path = %path.display(), "wrote default config");
            return Ok(config);
        }
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the config at `path` with `value`.
    ///
    /// A missing `bitcoinFee` becomes 25 and a missing `gasPrice` becomes 20.
    /// Per-network `bitcoin.fee` keys from older configs are dropped.
    pub fn update(path: &Path, mut value: Value) -> Result<Self, WalletError> {
        let obj = value
            .as_object_mut()
            .ok_or_else(|| WalletError::Config("config must be a JSON object".into()))?;
        obj.entry("bitcoinFee")
            .or_insert_with(|| Value::from(FALLBACK_BITCOIN_FEE));
        obj.entry("gasPrice")
            .or_insert_with(|| Value::from(FALLBACK_GAS_PRICE));
        for net in ["testnet", "mainnet"] {
            if let Some(bitcoin) = obj
                .get_mut(net)
                .and_then(|n| n.get_mut("bitcoin"))
                .and_then(Value::as_object_mut)
            {
                bitcoin.remove("fee");
            }
        }

        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        config.save(path)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), WalletError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), WalletError> {
        if self.bitcoin_fee == 0 {
            return Err(WalletError::Config("bitcoinFee must be positive".into()));
        }
        for (name, section) in [("testnet", &self.testnet), ("mainnet", &self.mainnet)] {
            if section.bitcoin.api_base.trim().is_empty() {
                return Err(WalletError::Config(format!("{name}.bitcoin.apiBase is empty")));
            }
        }
        Ok(())
    }

    pub fn section(&self, network: BtcNetwork) -> &NetworkSection {
        match network {
            BtcNetwork::Mainnet => &self.mainnet,
            BtcNetwork::Testnet => &self.testnet,
        }
    }

    pub fn api_base(&self, network: BtcNetwork) -> &str {
        &self.section(network).bitcoin.api_base
    }

    pub fn rpc_url(&self, network: BtcNetwork) -> &str {
        &self.section(network).ethereum.rpc_url
    }

    /// Client settings for the Esplora API.
    pub fn esplora_config(&self) -> EsploraConfig {
        EsploraConfig {
            mainnet_base: self.mainnet.bitcoin.api_base.clone(),
            testnet_base: self.testnet.bitcoin.api_base.clone(),
            timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }
}
