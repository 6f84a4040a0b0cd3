use std::path::PathBuf;

use chain_btc::BtcNetwork;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Bitcoin wallet: addresses, config and sends",
    long_about = None
)]
pub struct CliArgs {
    /// Directory holding config.json and the wallet files
    #[arg(long, global = true, default_value = ".")]
    pub data_dir: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print (and create on first use) the wallet's receive address
    Address {
        #[arg(short, long, default_value = "testnet")]
        network: BtcNetwork,
    },

    /// Print the wallet's balance in BTC, mempool included
    Balance {
        #[arg(short, long, default_value = "testnet")]
        network: BtcNetwork,
    },

    /// Print or change config.json
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Pay an address from the wallet
    Send {
        #[arg(short, long, default_value = "testnet")]
        network: BtcNetwork,

        /// Recipient address
        #[arg(long)]
        to: String,

        /// Amount in BTC, e.g. 0.0002
        #[arg(long)]
        amount: String,

        /// Flat fee in satoshis; defaults to bitcoinFee from config
        #[arg(long)]
        fee: Option<u64>,

        /// Build and sign, print the raw hex, do not broadcast
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigAction {
    /// Set the default bitcoin fee in satoshis
    SetFee { sats: u64 },
}
