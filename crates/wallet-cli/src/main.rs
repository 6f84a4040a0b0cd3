use std::process::ExitCode;

use chain_btc::amount::format_btc;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wallet_core::error::WalletError;
use wallet_core::Wallet;

mod cli;

use cli::{CliArgs, Command, ConfigAction};

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> Result<(), WalletError> {
    let mut wallet = Wallet::open(&args.data_dir)?;

    match args.command {
        Command::Address { network } => {
            println!("{}", wallet.bitcoin_address(network)?);
        }
        Command::Balance { network } => {
            let balance = wallet.bitcoin_balance(network).await?;
            println!("{} BTC", format_btc(balance));
        }
        Command::Config { action: None } => {
            println!("{}", serde_json::to_string_pretty(wallet.config())?);
        }
        Command::Config {
            action: Some(ConfigAction::SetFee { sats }),
        } => {
            wallet.set_bitcoin_fee(sats)?;
            tracing::info!(fee_sat = sats, "updated bitcoinFee");
        }
        Command::Send {
            network,
            to,
            amount,
            fee,
            dry_run,
        } => {
            let request = wallet.send_request(network, &to, &amount, fee)?;
            tracing::info!(
                %network,
                recipient = request.recipient(),
                amount_sat = request.amount_sat(),
                fee_sat = request.fee_sat(),
                dry_run,
                "sending"
            );

            if dry_run {
                let prepared = wallet.prepare_bitcoin(&request).await?;
                tracing::info!(txid = %prepared.txid(), vsize = prepared.vsize(), "prepared");
                println!("{}", prepared.to_hex());
            } else {
                let result = wallet.send(&request).await?;
                println!("{}", result.txid);
            }
        }
    }

    Ok(())
}
