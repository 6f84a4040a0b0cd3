//! Wallet-level sends: data directory → config → key store → Esplora mock.

use chain_btc::address::output_script;
use chain_btc::finalize::parse_raw_transaction;
use chain_btc::{BtcError, BtcNetwork};
use tempfile::TempDir;
use wallet_core::error::WalletError;
use wallet_core::Wallet;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RECIPIENT: &str = "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx";
const PARENT: &str = "5e2383defe7efcbdc9fdd6dba55da148b206617bbb49e6bb93fce7bfbb459d44";

fn point_testnet_at(wallet: &mut Wallet, server: &MockServer) {
    let mut value = serde_json::to_value(wallet.config()).unwrap();
    value["testnet"]["bitcoin"]["apiBase"] = server.uri().into();
    value["requestTimeoutSecs"] = 10.into();
    wallet.update_config(value).unwrap();
}

async fn fund(server: &MockServer, address: &str, value: u64) {
    let script = output_script(address, BtcNetwork::Testnet).unwrap();
    Mock::given(method("GET"))
        .and(path(format!("/address/{address}/utxo")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"txid": PARENT, "vout": 0, "status": {"confirmed": true}, "value": value}
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/tx/{PARENT}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "vout": [{"scriptpubkey": script.to_hex_string(), "value": value}]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn provision_then_send_with_configured_fee() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    let mut wallet = Wallet::open(dir.path()).unwrap();
    point_testnet_at(&mut wallet, &server);
    wallet.set_bitcoin_fee(1_000).unwrap();

    let address = wallet.bitcoin_address(BtcNetwork::Testnet).unwrap();
    fund(&server, &address, 50_000).await;

    let request = wallet
        .send_request(BtcNetwork::Testnet, RECIPIENT, "0.0002", None)
        .unwrap();
    let prepared = wallet.prepare_bitcoin(&request).await.unwrap();
    let txid = prepared.txid().to_string();

    Mock::given(method("POST"))
        .and(path("/tx"))
        .respond_with(ResponseTemplate::new(200).set_body_string(txid.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let result = wallet.send(&request).await.unwrap();
    assert_eq!(result.txid, txid);

    let posted = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.method.as_str() == "POST")
        .unwrap();
    let tx = parse_raw_transaction(std::str::from_utf8(&posted.body).unwrap()).unwrap();
    assert_eq!(tx.output[0].value.to_sat(), 20_000);
    assert_eq!(tx.output[1].value.to_sat(), 29_000);
    assert_eq!(
        tx.output[1].script_pubkey,
        output_script(&address, BtcNetwork::Testnet).unwrap()
    );
}

#[tokio::test]
async fn balance_of_provisioned_address() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    let mut wallet = Wallet::open(dir.path()).unwrap();
    point_testnet_at(&mut wallet, &server);

    let address = wallet.bitcoin_address(BtcNetwork::Testnet).unwrap();
    Mock::given(method("GET"))
        .and(path(format!("/address/{address}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "chain_stats": {"funded_txo_sum": 50000, "spent_txo_sum": 0},
            "mempool_stats": {"funded_txo_sum": 0, "spent_txo_sum": 20000}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let balance = wallet.bitcoin_balance(BtcNetwork::Testnet).await.unwrap();
    assert_eq!(balance, 30_000);
}

#[tokio::test]
async fn short_wallet_reports_shortfall() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    let mut wallet = Wallet::open(dir.path()).unwrap();
    point_testnet_at(&mut wallet, &server);

    let address = wallet.bitcoin_address(BtcNetwork::Testnet).unwrap();
    fund(&server, &address, 10_000).await;

    let err = wallet
        .send_bitcoin(BtcNetwork::Testnet, RECIPIENT, 20_000, 1_000)
        .await
        .unwrap_err();

    match err {
        WalletError::Btc(e @ BtcError::InsufficientFunds { .. }) => {
            assert_eq!(e.shortfall(), Some(11_000));
        }
        other => panic!("expected InsufficientFunds, got {other:?}"),
    }
}

#[tokio::test]
async fn mainnet_wallet_does_not_fund_testnet() {
    let dir = TempDir::new().unwrap();
    let wallet = Wallet::open(dir.path()).unwrap();
    wallet.bitcoin_address(BtcNetwork::Mainnet).unwrap();

    let request = wallet
        .send_request(BtcNetwork::Testnet, RECIPIENT, "0.0002", None)
        .unwrap();
    let err = wallet.prepare_bitcoin(&request).await.unwrap_err();
    assert!(matches!(err, WalletError::WalletNotProvisioned(_)));
}
