use thiserror::Error;

/// Broad classes of failure, used by callers to decide how to surface an
/// error. Nothing in this crate retries on any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-correctable input (bad address, zero amount, wrong key).
    Input,
    /// Not enough money, or nothing to spend.
    Funds,
    /// The data source returned something inconsistent.
    DataConsistency,
    /// The UTXO source or the relay failed or refused.
    Transport,
    /// Signing or serialization went wrong; indicates a construction bug.
    Signing,
}

/// Bitcoin chain operation errors.
#[derive(Debug, Error)]
pub enum BtcError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid network: {0}")]
    InvalidNetwork(String),

    #[error("network mismatch: expected {expected}, got {actual}")]
    NetworkMismatch { expected: String, actual: String },

    #[error("insufficient funds: have {available} sat, need {required} sat")]
    InsufficientFunds { available: u64, required: u64 },

    #[error("no spendable outputs for address {0}")]
    NoSpendableOutputs(String),

    #[error("invalid vout index {vout} for txid {txid}")]
    InvalidPrevOutIndex { txid: String, vout: u32 },

    #[error("satoshi value overflow")]
    ValueOverflow,

    #[error("unsupported script at input {input_index}: {script_hex}")]
    UnsupportedScript {
        input_index: usize,
        script_hex: String,
    },

    #[error("utxo source unavailable: {message}")]
    SourceUnavailable {
        status: Option<u16>,
        message: String,
    },

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("relay rejected transaction (HTTP {status}): {body}")]
    RelayRejected { status: u16, body: String },

    #[error("input {input_index} is not signed")]
    IncompleteSignature { input_index: usize },

    #[error("signing key does not match the script of input {input_index}")]
    SigningKeyMismatch { input_index: usize },

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),
}

impl BtcError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BtcError::InvalidPrivateKey(_)
            | BtcError::InvalidAddress(_)
            | BtcError::InvalidAmount(_)
            | BtcError::InvalidNetwork(_)
            | BtcError::NetworkMismatch { .. } => ErrorKind::Input,

            BtcError::InsufficientFunds { .. } | BtcError::NoSpendableOutputs(_) => {
                ErrorKind::Funds
            }

            BtcError::InvalidPrevOutIndex { .. }
            | BtcError::ValueOverflow
            | BtcError::UnsupportedScript { .. } => ErrorKind::DataConsistency,

            BtcError::SourceUnavailable { .. }
            | BtcError::NetworkUnreachable(_)
            | BtcError::RelayRejected { .. } => ErrorKind::Transport,

            BtcError::IncompleteSignature { .. }
            | BtcError::SigningKeyMismatch { .. }
            | BtcError::SigningError(_)
            | BtcError::SerializationError(_) => ErrorKind::Signing,
        }
    }

    /// For `InsufficientFunds`, how many satoshis are missing.
    pub fn shortfall(&self) -> Option<u64> {
        match self {
            BtcError::InsufficientFunds {
                available,
                required,
            } => Some(required.saturating_sub(*available)),
            _ => None,
        }
    }
}
