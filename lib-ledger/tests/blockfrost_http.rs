//! Blockfrost client against a mock HTTP server

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lib_ledger::{BlockfrostClient, LedgerClient, LedgerError};
use lib_tx::{Transaction, TxBody, WitnessSet};
use lib_types::{Address, AssetName, Credential, KeyHash, Network, ScriptHash, TxHash, Unit};
use lib_utxo::{OutPoint, TxInput};
use serde_json::json;
use wiremock::matchers::{body_bytes, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const PROJECT: &str = "preprodTestProject";

fn address() -> Address {
    Address::enterprise(Network::Preprod, Credential::Key(KeyHash::new([4; 28])))
}

fn client(server: &MockServer) -> BlockfrostClient {
    BlockfrostClient::new(server.uri(), PROJECT, Network::Preprod)
        .with_polling(Duration::from_millis(10), Duration::from_millis(200))
}

fn utxo_json(index: u32, lovelace: u64) -> serde_json::Value {
    json!({
        "address": address().to_bech32(),
        "tx_hash": "cd".repeat(32),
        "output_index": index,
        "amount": [{ "unit": "lovelace", "quantity": lovelace.to_string() }],
        "inline_datum": null
    })
}

fn transaction() -> Transaction {
    Transaction {
        body: TxBody {
            inputs: vec![TxInput::new(OutPoint::new(TxHash::new([1; 32]), 0))],
            fee: 170_000,
            ..Default::default()
        },
        witnesses: WitnessSet::default(),
    }
}

#[tokio::test]
async fn test_utxos_follow_pages() {
    let server = MockServer::start().await;
    let utxo_path = format!("/addresses/{}/utxos", address());

    let full_page: Vec<_> = (0..100).map(|i| utxo_json(i, 2_000_000)).collect();
    Mock::given(method("GET"))
        .and(path(utxo_path.as_str()))
        .and(query_param("page", "1"))
        .and(header("project_id", PROJECT))
        .respond_with(ResponseTemplate::new(200).set_body_json(full_page))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(utxo_path.as_str()))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![utxo_json(100, 5_000_000)]))
        .expect(1)
        .mount(&server)
        .await;

    let entries = client(&server).utxos_at(&address()).await.unwrap();
    assert_eq!(entries.len(), 101);
    assert_eq!(entries[100].outpoint.output_index, 100);
    assert_eq!(entries[100].utxo.value.lovelace, 5_000_000);
}

#[tokio::test]
async fn test_unused_address_has_no_utxos() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/addresses/{}/utxos", address()).as_str()))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status_code": 404,
            "error": "Not Found",
            "message": "The requested component has not been found."
        })))
        .mount(&server)
        .await;

    assert!(client(&server).utxos_at(&address()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_utxos_with_unit_uses_unit_endpoint() {
    let server = MockServer::start().await;
    let unit = Unit::new(ScriptHash::new([9; 28]), AssetName::from_text("ref").unwrap());
    let holding = json!({
        "address": address().to_bech32(),
        "tx_hash": "ef".repeat(32),
        "output_index": 1,
        "amount": [
            { "unit": "lovelace", "quantity": "1500000" },
            { "unit": unit.to_hex(), "quantity": "1" }
        ],
        "inline_datum": "d87980"
    });
    Mock::given(method("GET"))
        .and(path(format!("/addresses/{}/utxos/{}", address(), unit.to_hex()).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![holding]))
        .expect(1)
        .mount(&server)
        .await;

    let entries = client(&server).utxos_with_unit(&address(), &unit).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].utxo.value.quantity_of(&unit), 1);
}

#[tokio::test]
async fn test_api_error_carries_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/addresses/{}/utxos", address()).as_str()))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "status_code": 403,
            "error": "Forbidden",
            "message": "Invalid project token."
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/epochs/latest/parameters"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client(&server).utxos_at(&address()).await.unwrap_err();
    match err {
        LedgerError::Api { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "Invalid project token.");
        }
        other => panic!("unexpected error {:?}", other),
    }

    // Non-JSON bodies are passed through as the message
    let err = client(&server).protocol_params().await.unwrap_err();
    assert!(matches!(err, LedgerError::Api { status: 502, ref message } if message == "Bad Gateway"));
}

#[tokio::test]
async fn test_submit_posts_cbor() {
    let server = MockServer::start().await;
    let tx = transaction();
    let tx_hash = tx.id().unwrap();
    Mock::given(method("POST"))
        .and(path("/tx/submit"))
        .and(header("content-type", "application/cbor"))
        .and(body_bytes(tx.to_cbor().unwrap()))
        .respond_with(ResponseTemplate::new(200).set_body_json(tx_hash.to_hex()))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client(&server).submit(&tx).await.unwrap(), tx_hash);
}

#[tokio::test]
async fn test_submit_rejection_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tx/submit"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status_code": 400,
            "error": "Bad Request",
            "message": "transaction submit error ShelleyTxValidationError"
        })))
        .mount(&server)
        .await;

    let err = client(&server).submit(&transaction()).await.unwrap_err();
    assert!(matches!(err, LedgerError::Api { status: 400, .. }));
}

#[tokio::test]
async fn test_await_polls_until_on_chain() {
    let server = MockServer::start().await;
    let tx_hash = TxHash::new([7; 32]);
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    Mock::given(method("GET"))
        .and(path(format!("/txs/{}", tx_hash).as_str()))
        .respond_with(move |_: &Request| {
            if seen.fetch_add(1, Ordering::SeqCst) < 2 {
                ResponseTemplate::new(404)
            } else {
                ResponseTemplate::new(200).set_body_json(json!({ "hash": tx_hash.to_hex() }))
            }
        })
        .mount(&server)
        .await;

    client(&server).await_tx(&tx_hash).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_await_times_out() {
    let server = MockServer::start().await;
    let tx_hash = TxHash::new([8; 32]);
    Mock::given(method("GET"))
        .and(path(format!("/txs/{}", tx_hash).as_str()))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server).await_tx(&tx_hash).await.unwrap_err();
    assert!(matches!(err, LedgerError::Timeout { tx_hash: waited_on, .. } if waited_on == tx_hash));
}

#[tokio::test]
async fn test_await_surfaces_server_errors() {
    let server = MockServer::start().await;
    let tx_hash = TxHash::new([9; 32]);
    Mock::given(method("GET"))
        .and(path(format!("/txs/{}", tx_hash).as_str()))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client(&server).await_tx(&tx_hash).await.unwrap_err();
    assert!(matches!(err, LedgerError::Api { status: 500, .. }));
}
