use std::str::FromStr;

use bitcoin::{Network, NetworkKind};
use serde::{Deserialize, Serialize};

use crate::error::BtcError;

/// Default Esplora endpoint for Bitcoin mainnet.
pub const MAINNET_API: &str = "https://blockstream.info/api";

/// Default Esplora endpoint for Bitcoin testnet.
pub const TESTNET_API: &str = "https://blockstream.info/testnet/api";

/// Supported Bitcoin networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BtcNetwork {
    Mainnet,
    Testnet,
}

impl BtcNetwork {
    /// Convert to the `bitcoin` crate's `Network` type.
    pub fn to_bitcoin_network(self) -> Network {
        match self {
            BtcNetwork::Mainnet => Network::Bitcoin,
            BtcNetwork::Testnet => Network::Testnet,
        }
    }

    /// Mainnet or test network, as used by WIF version bytes.
    pub fn kind(self) -> NetworkKind {
        NetworkKind::from(self.to_bitcoin_network())
    }

    /// Return the default Esplora API base for this network.
    pub fn default_api_base(self) -> &'static str {
        match self {
            BtcNetwork::Mainnet => MAINNET_API,
            BtcNetwork::Testnet => TESTNET_API,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BtcNetwork::Mainnet => "mainnet",
            BtcNetwork::Testnet => "testnet",
        }
    }
}

impl std::fmt::Display for BtcNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BtcNetwork {
    type Err = BtcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "bitcoin" => Ok(BtcNetwork::Mainnet),
            "testnet" => Ok(BtcNetwork::Testnet),
            other => Err(BtcError::InvalidNetwork(format!(
                "{other:?}, expected mainnet or testnet"
            ))),
        }
    }
}
