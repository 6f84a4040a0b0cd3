use bitcoin::address::{Address, NetworkUnchecked};
use bitcoin::{CompressedPublicKey, ScriptBuf};

use crate::error::BtcError;
use crate::network::BtcNetwork;

/// The native SegWit (bech32) address of a compressed public key:
/// `bc1q...` on mainnet, `tb1q...` on testnet.
pub fn p2wpkh_address(public_key: &CompressedPublicKey, network: BtcNetwork) -> Address {
    Address::p2wpkh(public_key, network.to_bitcoin_network())
}

/// Parse an address and require that it belongs to `network`.
///
/// Any standard output type is accepted as a destination; only the wallet's
/// own inputs are restricted to P2WPKH.
pub fn parse_address(address: &str, network: BtcNetwork) -> Result<Address, BtcError> {
    address
        .trim()
        .parse::<Address<NetworkUnchecked>>()
        .map_err(|e| BtcError::InvalidAddress(format!("{address:?}: {e}")))?
        .require_network(network.to_bitcoin_network())
        .map_err(|_| BtcError::InvalidAddress(format!("{address:?} is not a {network} address")))
}

/// The output script an address decodes to on `network`.
pub fn output_script(address: &str, network: BtcNetwork) -> Result<ScriptBuf, BtcError> {
    parse_address(address, network).map(|addr| addr.script_pubkey())
}
