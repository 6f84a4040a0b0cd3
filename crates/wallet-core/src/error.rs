use chain_btc::BtcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("no {0} bitcoin wallet has been provisioned")]
    WalletNotProvisioned(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Btc(#[from] BtcError),
}

impl WalletError {
    /// The pipeline error, when this came from the send pipeline.
    pub fn as_btc(&self) -> Option<&BtcError> {
        match self {
            WalletError::Btc(e) => Some(e),
            _ => None,
        }
    }
}
