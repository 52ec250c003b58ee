use std::sync::Once;
use std::time::Duration;

use mockito::Matcher;
use serde_json::json;
use xmrpc_core::rpc::types::GetTransactionsParams;
use xmrpc_core::rpc::{ClientConfig, ConnectionDescriptor, DaemonRpc, DecodeMode, HttpRpcClient};
use xmrpc_core::{CoreError, RpcError};

static TRACING_INIT: Once = Once::new();

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("xmrpc_core=debug")),
            )
            .with_test_writer()
            .try_init();
    });
}

fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read fixture {path}: {e}"))
}

fn client(url: &str) -> HttpRpcClient {
    client_with(url, None, ClientConfig::default())
}

fn client_with(url: &str, auth: Option<(&str, &str)>, config: ClientConfig) -> HttpRpcClient {
    let (user, pass) = auth.unzip();
    let conn = ConnectionDescriptor::new(url, user, pass).expect("mock server url must parse");
    HttpRpcClient::new(conn, config).expect("client must build")
}

const DIGEST_CHALLENGE: &str =
    r#"Digest qop="auth",algorithm=MD5,realm="monero-rpc",nonce="q2VFL7yjPXbo6tmczN5rgw==",stale=false"#;

// ==============================================================================
// Envelope Shape
// ==============================================================================

#[tokio::test]
async fn json_rpc_call_sends_envelope_and_decodes_fixture() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/json_rpc")
        .match_header("accept", "application/json")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "id": "0",
            "jsonrpc": "2.0",
            "method": "get_block_count",
            "params": {}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(fixture("get_block_count.json"))
        .create_async()
        .await;

    let count = client(&server.url())
        .get_block_count()
        .await
        .expect("get_block_count must succeed");
    assert_eq!(count.count, 993163);
    assert!(count.footer.is_ok());
    assert!(!count.footer.untrusted);

    mock.assert_async().await;
}

#[tokio::test]
async fn positional_params_are_sent_verbatim() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/json_rpc")
        .match_body(Matcher::PartialJson(json!({
            "method": "on_get_block_hash",
            "params": [3195144]
        })))
        .with_body(r#"{"id":"0","jsonrpc":"2.0","result":"e22cf75f39ae720e8b71b3d120a5ac03f0db50bba6379e2850975b4859190bc6"}"#)
        .create_async()
        .await;

    let hash = client(&server.url())
        .on_get_block_hash(3195144)
        .await
        .expect("on_get_block_hash must succeed");
    assert_eq!(
        hash,
        "e22cf75f39ae720e8b71b3d120a5ac03f0db50bba6379e2850975b4859190bc6"
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn configured_request_id_is_used() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/json_rpc")
        .match_body(Matcher::PartialJson(json!({"id": "42"})))
        .with_body(r#"{"id":"42","jsonrpc":"2.0","result":{"version":196613,"release":true,"status":"OK"}}"#)
        .create_async()
        .await;

    let config = ClientConfig {
        request_id: "42".to_owned(),
        ..ClientConfig::default()
    };
    let version = client_with(&server.url(), None, config)
        .get_version()
        .await
        .expect("get_version must succeed");
    assert_eq!(version.rpc_version(), (3, 5));
    assert!(version.release);
    mock.assert_async().await;
}

#[tokio::test]
async fn plain_call_without_params_is_get() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/get_height")
        .match_header("accept", "application/json")
        .with_body(fixture("get_height.json"))
        .create_async()
        .await;

    let height = client(&server.url())
        .get_height()
        .await
        .expect("get_height must succeed");
    assert_eq!(height.height, 3195144);
    assert_eq!(height.hash.len(), 64);
    mock.assert_async().await;
}

#[tokio::test]
async fn base_path_is_kept_in_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/monero/get_height")
        .with_body(fixture("get_height.json"))
        .create_async()
        .await;

    let base = format!("{}/monero/", server.url());
    client(&base)
        .get_height()
        .await
        .expect("get_height under a base path must succeed");
    mock.assert_async().await;
}

#[tokio::test]
async fn wide_difficulty_is_kept_next_to_numeric_value() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/json_rpc")
        .match_body(Matcher::PartialJson(json!({
            "method": "get_last_block_header",
            "params": {"fill_pow_hash": false}
        })))
        .with_body(fixture("get_last_block_header.json"))
        .create_async()
        .await;

    let result = client(&server.url())
        .get_last_block_header(false)
        .await
        .expect("get_last_block_header must succeed");
    let header = result.block_header;
    assert_eq!(header.difficulty, 227026389695);
    assert_eq!(header.wide_difficulty, "0x34dbd3cabf");
    assert_eq!(header.cumulative_difficulty, 86164894009456483);
    assert_eq!(header.wide_cumulative_difficulty, "0x1321e83bb8af763");
    assert_eq!(header.reward, 600000000000);
}

// ==============================================================================
// Error Classification
// ==============================================================================

#[tokio::test]
async fn every_error_status_is_http_error_and_body_is_ignored() {
    let mut server = mockito::Server::new_async().await;
    let rpc = client(&server.url());

    for status in 400u16..=599 {
        let mock = server
            .mock("POST", "/json_rpc")
            .with_status(usize::from(status))
            .with_header("content-type", "text/html")
            .with_body("<html>definitely not json</html>")
            .create_async()
            .await;

        let err = rpc
            .get_block_count()
            .await
            .expect_err("error status must fail the call");
        match err {
            CoreError::Rpc(RpcError::HttpStatus {
                status: got,
                message,
            }) => {
                assert_eq!(got, status);
                assert!(message.starts_with(&status.to_string()), "{message}");
            }
            other => panic!("status {status}: expected HttpStatus, got {other:?}"),
        }

        mock.remove_async().await;
    }
}

#[tokio::test]
async fn plain_dialect_status_error_wins_over_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/get_transaction_pool")
        .with_status(503)
        .with_body(r#"{"error":{"code":-9,"message":"should not be read"}}"#)
        .create_async()
        .await;

    let err = client(&server.url())
        .get_transaction_pool(DecodeMode::Expand)
        .await
        .expect_err("503 must fail");
    assert_eq!(err.http_status(), Some(503));
    mock.assert_async().await;
}

#[tokio::test]
async fn embedded_error_takes_precedence_over_result() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/json_rpc")
        .with_body(fixture("error_with_result.json"))
        .create_async()
        .await;

    let err = client(&server.url())
        .get_block_count()
        .await
        .expect_err("nonzero error code must fail");
    match err {
        CoreError::Rpc(RpcError::ServerError { code, message }) => {
            assert_eq!(code, -2);
            assert!(message.contains("greater than current top block height"));
        }
        other => panic!("expected ServerError, got {other:?}"),
    }
}

#[tokio::test]
async fn zero_error_code_with_result_succeeds() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/json_rpc")
        .with_body(
            r#"{"id":"0","jsonrpc":"2.0","error":{"code":0,"message":""},"result":{"count":5,"status":"OK"}}"#,
        )
        .create_async()
        .await;

    let count = client(&server.url())
        .get_block_count()
        .await
        .expect("code 0 is not an error");
    assert_eq!(count.count, 5);
}

#[tokio::test]
async fn plain_dialect_embedded_error_is_surfaced() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/get_height")
        .with_body(r#"{"error":{"code":-1,"message":"daemon busy"},"height":0,"status":"BUSY"}"#)
        .create_async()
        .await;

    let err = client(&server.url())
        .get_height()
        .await
        .expect_err("embedded plain error must fail");
    assert!(matches!(
        err,
        CoreError::Rpc(RpcError::ServerError { code: -1, ref message }) if message == "daemon busy"
    ));
}

#[tokio::test]
async fn unparseable_body_is_decode_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/json_rpc")
        .with_body("this is not json")
        .create_async()
        .await;

    let err = client(&server.url())
        .get_info()
        .await
        .expect_err("garbage body must fail");
    assert!(matches!(err, CoreError::Decode(_)), "{err:?}");
}

#[tokio::test]
async fn wrong_result_shape_is_decode_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/json_rpc")
        .with_body(r#"{"id":"0","jsonrpc":"2.0","result":{"count":"many"}}"#)
        .create_async()
        .await;

    let err = client(&server.url())
        .get_block_count()
        .await
        .expect_err("string count must fail");
    assert!(matches!(err, CoreError::Decode(ref msg) if msg.contains("get_block_count")));
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        listener.local_addr().expect("local addr").port()
    };

    let err = client(&format!("http://127.0.0.1:{port}"))
        .get_block_count()
        .await
        .expect_err("nothing is listening");
    assert!(
        matches!(err, CoreError::Rpc(RpcError::Transport(_))),
        "{err:?}"
    );
}

#[tokio::test]
async fn silent_server_times_out() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        if let Ok((socket, _)) = listener.accept().await {
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(socket);
        }
    });

    let config = ClientConfig {
        timeout: Duration::from_millis(300),
        ..ClientConfig::default()
    };
    let err = client_with(&format!("http://{addr}"), None, config)
        .get_block_count()
        .await
        .expect_err("silent server must time out");
    assert!(err.is_timeout(), "{err:?}");
}

// ==============================================================================
// Opaque JSON Fields
// ==============================================================================

#[tokio::test]
async fn block_json_stays_raw_unless_expansion_requested() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/json_rpc")
        .match_body(Matcher::PartialJson(json!({
            "method": "get_block",
            "params": {"height": 3195144}
        })))
        .with_body(fixture("get_block.json"))
        .expect(2)
        .create_async()
        .await;
    let rpc = client(&server.url());

    let raw = rpc
        .get_block_by_height(3195144, DecodeMode::Raw)
        .await
        .expect("raw get_block must succeed");
    assert!(!raw.json.is_expanded());
    assert!(raw.json.raw().starts_with("{\n  \"major_version\": 16"));
    assert_eq!(raw.block_header.height, 3195144);
    assert_eq!(raw.block_header.wide_difficulty, "0x34dbd3cabf");

    let expanded = rpc
        .get_block_by_height(3195144, DecodeMode::Expand)
        .await
        .expect("expanded get_block must succeed");
    assert_eq!(expanded.json.raw(), raw.json.raw());
    let details = expanded.json.decoded().expect("block json must be decoded");
    assert_eq!(details.major_version, 16);
    assert_eq!(details.tx_hashes.len(), 2);
    assert_eq!(details.tx_hashes, expanded.tx_hashes);
    assert_eq!(details.miner_tx.vin.len(), 1);
    assert_eq!(
        details.miner_tx.vin[0].r#gen.map(|g| g.height),
        Some(3195144)
    );
    assert_eq!(details.miner_tx.vout.len(), 1);
    assert_eq!(details.miner_tx.vout[0].amount, expanded.block_header.reward);
    assert_eq!(
        details.miner_tx.vout[0].target.output_key(),
        Some("cccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccc")
    );
}

#[tokio::test]
async fn broken_opaque_field_fails_only_when_expanded() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/json_rpc")
        .with_body(fixture("get_block_bad_json.json"))
        .create_async()
        .await;
    let rpc = client(&server.url());

    rpc.get_block_by_hash("aa", DecodeMode::Raw)
        .await
        .expect("raw decode does not look inside the string");

    let err = rpc
        .get_block_by_hash("aa", DecodeMode::Expand)
        .await
        .expect_err("truncated block json must fail the call");
    assert!(matches!(err, CoreError::Decode(ref msg) if msg.contains("`json`")));
}

#[tokio::test]
async fn pool_transactions_expand_tx_json() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/get_transaction_pool")
        .with_body(fixture("get_transaction_pool.json"))
        .create_async()
        .await;

    let pool = client(&server.url())
        .get_transaction_pool(DecodeMode::Expand)
        .await
        .expect("get_transaction_pool must succeed");
    assert_eq!(pool.transactions.len(), 1);
    assert_eq!(pool.spent_key_images.len(), 1);

    let tx = pool.transactions[0]
        .tx_json
        .decoded()
        .expect("tx_json must be decoded");
    assert_eq!(tx.vin.len(), 2);
    assert_eq!(tx.vout.len(), 2);
    assert_eq!(tx.rct_signatures.rct_type, 6);
    assert_eq!(tx.rct_signatures.txn_fee, pool.transactions[0].fee);
    assert_eq!(tx.rct_signatures.ecdh_info.len(), 2);
    let key_input = tx.vin[0].key.as_ref().expect("ring input");
    assert_eq!(key_input.key_offsets.len(), 3);
    let prunable = tx.rctsig_prunable.as_ref().expect("prunable part present");
    assert_eq!(prunable.clsags.len(), 1);
    assert_eq!(prunable.pseudo_outs.len(), 2);
}

#[tokio::test]
async fn get_transactions_expands_exactly_when_decode_as_json_is_set() {
    let mut server = mockito::Server::new_async().await;
    let hash = "f".repeat(64);
    let decoded_mock = server
        .mock("POST", "/get_transactions")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "txs_hashes": [hash],
            "decode_as_json": true,
            "prune": false,
            "split": false
        })))
        .with_body(fixture("get_transactions.json"))
        .create_async()
        .await;
    let raw_mock = server
        .mock("POST", "/get_transactions")
        .match_body(Matcher::PartialJson(json!({"decode_as_json": false})))
        .with_body(fixture("get_transactions.json"))
        .create_async()
        .await;
    let rpc = client(&server.url());

    let mut params = GetTransactionsParams::new(vec![hash.clone()]);
    params.decode_as_json = true;
    let decoded = rpc
        .get_transactions(&params)
        .await
        .expect("get_transactions must succeed");
    assert_eq!(decoded.missed_tx.len(), 1);
    let tx = decoded.txs[0].as_json.decoded().expect("as_json decoded");
    assert_eq!(tx.vin.len(), 1);
    assert_eq!(tx.vout.len(), 2);
    assert_eq!(decoded.txs[0].output_indices.len(), tx.vout.len());

    let raw = rpc
        .get_transactions(&GetTransactionsParams::new(vec![hash]))
        .await
        .expect("get_transactions must succeed");
    assert!(!raw.txs[0].as_json.is_expanded());

    decoded_mock.assert_async().await;
    raw_mock.assert_async().await;
}

// ==============================================================================
// Digest Authentication
// ==============================================================================

#[tokio::test]
async fn digest_challenge_is_answered() {
    init_tracing();
    let mut server = mockito::Server::new_async().await;
    let challenge = server
        .mock("POST", "/json_rpc")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header("www-authenticate", DIGEST_CHALLENGE)
        .expect(1)
        .create_async()
        .await;
    let answered = server
        .mock("POST", "/json_rpc")
        .match_header(
            "authorization",
            Matcher::Regex(
                r#"^Digest username="alice", realm="monero-rpc", nonce="q2VFL7yjPXbo6tmczN5rgw==", uri="/json_rpc", algorithm=MD5, response="[0-9a-f]{32}", qop=auth, nc=00000001, cnonce="[0-9a-f]{32}"$"#
                    .to_owned(),
            ),
        )
        .with_body(fixture("get_block_count.json"))
        .expect(1)
        .create_async()
        .await;

    let rpc = client_with(&server.url(), Some(("alice", "s3cret")), ClientConfig::default());
    let count = rpc
        .get_block_count()
        .await
        .expect("digest handshake must succeed");
    assert_eq!(count.count, 993163);

    challenge.assert_async().await;
    answered.assert_async().await;
}

#[tokio::test]
async fn cached_challenge_is_reused_with_next_nonce_count() {
    let mut server = mockito::Server::new_async().await;
    let challenge = server
        .mock("GET", "/get_height")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header("www-authenticate", DIGEST_CHALLENGE)
        .expect(1)
        .create_async()
        .await;
    let first = server
        .mock("GET", "/get_height")
        .match_header("authorization", Matcher::Regex("nc=00000001".to_owned()))
        .with_body(fixture("get_height.json"))
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/get_height")
        .match_header("authorization", Matcher::Regex("nc=00000002".to_owned()))
        .with_body(fixture("get_height.json"))
        .expect(1)
        .create_async()
        .await;

    let rpc = client_with(&server.url(), Some(("alice", "s3cret")), ClientConfig::default());
    rpc.get_height().await.expect("first call must succeed");
    rpc.get_height().await.expect("second call must reuse the challenge");

    challenge.assert_async().await;
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn wrong_credentials_end_in_single_401() {
    let mut server = mockito::Server::new_async().await;
    let challenge = server
        .mock("POST", "/json_rpc")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header("www-authenticate", DIGEST_CHALLENGE)
        .expect(1)
        .create_async()
        .await;
    let rejected = server
        .mock("POST", "/json_rpc")
        .match_header("authorization", Matcher::Regex("^Digest ".to_owned()))
        .with_status(401)
        .with_header("www-authenticate", DIGEST_CHALLENGE)
        .expect(1)
        .create_async()
        .await;

    let rpc = client_with(&server.url(), Some(("alice", "wrong")), ClientConfig::default());
    let err = rpc
        .get_block_count()
        .await
        .expect_err("wrong credentials must fail");
    assert_eq!(err.http_status(), Some(401));

    challenge.assert_async().await;
    rejected.assert_async().await;
}

#[tokio::test]
async fn no_credentials_means_no_handshake() {
    let mut server = mockito::Server::new_async().await;
    let challenge = server
        .mock("POST", "/json_rpc")
        .with_status(401)
        .with_header("www-authenticate", DIGEST_CHALLENGE)
        .expect(1)
        .create_async()
        .await;

    let err = client(&server.url())
        .get_block_count()
        .await
        .expect_err("unauthenticated client must see the 401");
    assert_eq!(err.http_status(), Some(401));
    challenge.assert_async().await;
}

#[tokio::test]
async fn rotated_credentials_start_a_fresh_handshake() {
    let mut server = mockito::Server::new_async().await;
    let challenge = server
        .mock("POST", "/json_rpc")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_header("www-authenticate", DIGEST_CHALLENGE)
        .expect(2)
        .create_async()
        .await;
    let alice = server
        .mock("POST", "/json_rpc")
        .match_header("authorization", Matcher::Regex(r#"username="alice""#.to_owned()))
        .with_body(fixture("get_block_count.json"))
        .expect(1)
        .create_async()
        .await;
    let bob = server
        .mock("POST", "/json_rpc")
        .match_header(
            "authorization",
            Matcher::Regex(r#"username="bob".*nc=00000001"#.to_owned()),
        )
        .with_body(fixture("get_block_count.json"))
        .expect(1)
        .create_async()
        .await;

    let rpc = client_with(&server.url(), Some(("alice", "s3cret")), ClientConfig::default());
    rpc.get_block_count().await.expect("alice must authenticate");

    let rotated = ConnectionDescriptor::new(&server.url(), Some("bob"), Some("hunter2"))
        .expect("mock server url must parse");
    rpc.with_connection(rotated)
        .get_block_count()
        .await
        .expect("bob must authenticate");

    challenge.assert_async().await;
    alice.assert_async().await;
    bob.assert_async().await;
}
