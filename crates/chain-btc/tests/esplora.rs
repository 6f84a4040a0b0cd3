//! Esplora client against a mock HTTP server.

use chain_btc::{
    BtcError, BtcNetwork, Broadcaster, EsploraClient, EsploraConfig, ErrorKind, UtxoSource,
};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ADDRESS: &str = "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx";
const PARENT: &str = "7b1eabe0209b1fe794124575ef807057c77ada2138ae4fa8d6c4de0398a14f3f";
const FOREIGN_SCRIPT: &str = "0014751e76e8199196d454941c45d1b3a323f1433bd6";

fn client(server: &MockServer) -> EsploraClient {
    EsploraClient::new(EsploraConfig {
        mainnet_base: format!("{}/mainnet", server.uri()),
        testnet_base: format!("{}/", server.uri()),
        timeout: None,
    })
    .unwrap()
}

#[tokio::test]
async fn lists_spendable_outputs_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/address/{ADDRESS}/utxo")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"txid": PARENT, "vout": 1, "status": {"confirmed": true}, "value": 30000},
            {"txid": PARENT, "vout": 0, "status": {"confirmed": false}, "value": 20000}
        ])))
        .mount(&server)
        .await;

    let listed = client(&server)
        .list_spendable(ADDRESS, BtcNetwork::Testnet)
        .await
        .unwrap();

    assert_eq!(listed.len(), 2);
    assert_eq!((listed[0].vout, listed[0].value), (1, 30_000));
    assert_eq!((listed[1].vout, listed[1].value), (0, 20_000));
    assert_eq!(listed[0].txid, PARENT);
}

#[tokio::test]
async fn mainnet_uses_its_own_base() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mainnet/address/bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4/utxo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let listed = client(&server)
        .list_spendable("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", BtcNetwork::Mainnet)
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn balance_sums_confirmed_and_mempool() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/address/{ADDRESS}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "address": ADDRESS,
            "chain_stats": {
                "funded_txo_count": 3, "funded_txo_sum": 90000,
                "spent_txo_count": 1, "spent_txo_sum": 40000, "tx_count": 4
            },
            "mempool_stats": {
                "funded_txo_count": 1, "funded_txo_sum": 5000,
                "spent_txo_count": 0, "spent_txo_sum": 0, "tx_count": 1
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let balance = client(&server)
        .balance(ADDRESS, BtcNetwork::Testnet)
        .await
        .unwrap();
    assert_eq!(balance, 55_000);
}

#[tokio::test]
async fn balance_error_status_is_source_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/address/{ADDRESS}")))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid Bitcoin address"))
        .mount(&server)
        .await;

    let err = client(&server)
        .balance(ADDRESS, BtcNetwork::Testnet)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BtcError::SourceUnavailable { status: Some(400), .. }
    ));
}

#[tokio::test]
async fn resolves_prev_out_from_parent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/tx/{PARENT}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "txid": PARENT,
            "vout": [
                {"scriptpubkey": FOREIGN_SCRIPT, "value": 1000},
                {"scriptpubkey": "00140000000000000000000000000000000000000000", "value": 2500}
            ]
        })))
        .mount(&server)
        .await;

    let prev = client(&server)
        .resolve_prev_out(PARENT, 1, BtcNetwork::Testnet)
        .await
        .unwrap();

    assert_eq!(prev.value_sat, 2_500);
    assert_eq!(
        hex::encode(prev.script_pubkey.as_bytes()),
        "00140000000000000000000000000000000000000000"
    );
}

#[tokio::test]
async fn missing_vout_is_data_consistency_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/tx/{PARENT}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "vout": [{"scriptpubkey": FOREIGN_SCRIPT, "value": 1000}]
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .resolve_prev_out(PARENT, 3, BtcNetwork::Testnet)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DataConsistency);
    assert!(matches!(err, BtcError::InvalidPrevOutIndex { vout: 3, .. }));
    assert_eq!(err.to_string(), format!("invalid vout index 3 for txid {PARENT}"));
}

#[tokio::test]
async fn listing_error_status_is_source_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/address/{ADDRESS}/utxo")))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = client(&server)
        .list_spendable(ADDRESS, BtcNetwork::Testnet)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(matches!(
        err,
        BtcError::SourceUnavailable { status: Some(503), .. }
    ));
}

#[tokio::test]
async fn malformed_listing_is_source_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/address/{ADDRESS}/utxo")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client(&server)
        .list_spendable(ADDRESS, BtcNetwork::Testnet)
        .await
        .unwrap_err();
    assert!(matches!(err, BtcError::SourceUnavailable { .. }));
}

#[tokio::test]
async fn broadcast_posts_plain_hex_and_returns_txid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tx"))
        .and(header("content-type", "text/plain"))
        .and(body_string("0200beef"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("{PARENT}\n")))
        .expect(1)
        .mount(&server)
        .await;

    let receipt = client(&server)
        .submit("0200beef", BtcNetwork::Testnet)
        .await
        .unwrap();

    assert_eq!(receipt.txid, PARENT);
    assert_eq!(receipt.status_code, 200);
}

#[tokio::test]
async fn relay_rejection_keeps_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tx"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad-txns-inputs-missingorspent"))
        .mount(&server)
        .await;

    let err = client(&server)
        .submit("0200beef", BtcNetwork::Testnet)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    match err {
        BtcError::RelayRejected { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "bad-txns-inputs-missingorspent");
        }
        other => panic!("expected RelayRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_relay_is_network_error() {
    // Nothing listens on port 9 of localhost.
    let client = EsploraClient::new(EsploraConfig {
        mainnet_base: "http://127.0.0.1:9".into(),
        testnet_base: "http://127.0.0.1:9".into(),
        timeout: Some(std::time::Duration::from_secs(5)),
    })
    .unwrap();

    let err = client.submit("00", BtcNetwork::Testnet).await.unwrap_err();
    assert!(matches!(err, BtcError::NetworkUnreachable(_)));
    assert_eq!(err.kind(), ErrorKind::Transport);
}
