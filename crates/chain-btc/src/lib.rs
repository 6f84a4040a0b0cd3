//! Bitcoin P2WPKH send pipeline.
//!
//! A payment runs through five stages: collect the wallet's spendable outputs
//! from a [`UtxoSource`], build an unsigned transaction with a flat fee, sign
//! every input (BIP143), finalize witnesses into wire bytes and hand the hex
//! to a [`Broadcaster`]. [`BtcSender`] strings the stages together;
//! [`EsploraClient`] implements both seams over the Esplora REST API.

pub mod address;
pub mod amount;
pub mod broadcast;
pub mod error;
pub mod esplora;
pub mod finalize;
pub mod network;
pub mod send;
pub mod signer;
pub mod transaction;
pub mod utxo;

pub use broadcast::{BroadcastReceipt, Broadcaster};
pub use error::{BtcError, ErrorKind};
pub use esplora::{EsploraClient, EsploraConfig};
pub use finalize::FinalizedTx;
pub use network::BtcNetwork;
pub use send::{BtcSender, SendRequest, SendResult, SigningMaterial};
pub use signer::{SignedBtcTx, SigningKey};
pub use transaction::UnsignedBtcTx;
pub use utxo::{ListedUtxo, PrevOut, Utxo, UtxoSource};
