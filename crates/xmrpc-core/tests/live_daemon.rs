use std::env;
use std::sync::Once;

use xmrpc_core::rpc::types::GetTransactionsParams;
use xmrpc_core::rpc::{ClientConfig, ConnectionDescriptor, DaemonRpc, DecodeMode, HttpRpcClient};

static TRACING_INIT: Once = Once::new();

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("xmrpc_core=debug")),
            )
            .with_target(true)
            .try_init();
    });
}

#[tokio::test(flavor = "multi_thread")]
#[ignore = "requires a reachable monerod; set XMRPC_TEST_RPC_URL"]
async fn live_daemon_answers_both_dialects() {
    init_tracing();

    let rpc_url = env::var("XMRPC_TEST_RPC_URL").expect("XMRPC_TEST_RPC_URL must be set");
    let rpc_user = env::var("XMRPC_TEST_RPC_USER").ok();
    let rpc_pass = env::var("XMRPC_TEST_RPC_PASS").ok();

    let conn = ConnectionDescriptor::new(&rpc_url, rpc_user.as_deref(), rpc_pass.as_deref())
        .expect("XMRPC_TEST_RPC_URL must be an http(s) URL");
    let rpc = HttpRpcClient::new(conn, ClientConfig::default()).expect("rpc client must construct");

    eprintln!("[itest] checking get_info against {rpc_url}");
    let info = rpc.get_info().await.expect("get_info must succeed");
    assert!(info.footer.is_ok(), "status was {}", info.footer.status);
    assert!(info.height > 0);

    eprintln!("[itest] checking plain /get_height agrees with get_block_count");
    let height = rpc.get_height().await.expect("get_height must succeed");
    let count = rpc.get_block_count().await.expect("get_block_count must succeed");
    assert!(count.count.abs_diff(height.height) <= 1, "tip moved too far during test");

    let tip = height.height.saturating_sub(1);
    eprintln!("[itest] expanding block {tip}");
    let block = rpc
        .get_block_by_height(tip, DecodeMode::Expand)
        .await
        .expect("get_block must succeed");
    let details = block.json.decoded().expect("block json must decode");
    assert_eq!(details.tx_hashes, block.tx_hashes);
    assert!(!details.miner_tx.vout.is_empty());

    let hash = rpc.on_get_block_hash(tip).await.expect("on_get_block_hash must succeed");
    assert_eq!(hash, block.block_header.hash);

    let header = rpc
        .get_block_header_by_hash(&hash, false)
        .await
        .expect("get_block_header_by_hash must succeed");
    assert_eq!(header.block_header.height, tip);

    if let Some(txid) = block.tx_hashes.first() {
        eprintln!("[itest] fetching transaction {txid}");
        let mut params = GetTransactionsParams::new(vec![txid.clone()]);
        params.decode_as_json = true;
        let txs = rpc
            .get_transactions(&params)
            .await
            .expect("get_transactions must succeed");
        assert!(txs.missed_tx.is_empty());
        let tx = txs.txs[0].as_json.decoded().expect("as_json must decode");
        assert!(!tx.vin.is_empty());
    }

    eprintln!("[itest] checking mempool decode");
    rpc.get_transaction_pool(DecodeMode::Expand)
        .await
        .expect("get_transaction_pool must succeed");
    eprintln!("[itest] integration test completed");
}
