use std::future::Future;

use crate::error::BtcError;
use crate::network::BtcNetwork;

/// What the relay answered for an accepted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastReceipt {
    pub txid: String,
    pub status_code: u16,
}

/// Submits raw transactions to the network.
///
/// Implementations surface every failure as-is: `RelayRejected` with the
/// relay's status and body, `NetworkUnreachable` for transport errors. They
/// never retry.
pub trait Broadcaster {
    fn submit(
        &self,
        raw_tx_hex: &str,
        network: BtcNetwork,
    ) -> impl Future<Output = Result<BroadcastReceipt, BtcError>> + Send;
}
