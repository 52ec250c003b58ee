mod cli;
mod watch;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eyre::{eyre, WrapErr};
use serde::Serialize;

use xmrpc_core::rpc::types::GetTransactionsParams;
use xmrpc_core::rpc::{ClientConfig, ConnectionDescriptor, DaemonRpc, DecodeMode, HttpRpcClient};
use xmrpc_core::{CoreError, DeliveryMode};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    let connection = ConnectionDescriptor::new(
        &args.rpc_url,
        args.rpc_user.as_deref(),
        args.rpc_pass.as_deref(),
    )
    .wrap_err("invalid --rpc-url")?;
    let config = ClientConfig {
        timeout: Duration::from_secs(args.timeout_secs),
        ..ClientConfig::default()
    };
    let rpc: Arc<dyn DaemonRpc> =
        Arc::new(HttpRpcClient::new(connection, config).wrap_err("build RPC client")?);

    run_command(rpc, args.command)
        .await
        .map_err(|err| match err.downcast::<CoreError>() {
            Ok(core) => {
                let message = format_rpc_connect_error(&args.rpc_url, &error_chain(&core));
                eyre!(message).wrap_err("while talking to the Monero daemon")
            }
            Err(other) => other,
        })
}

async fn run_command(rpc: Arc<dyn DaemonRpc>, command: Command) -> eyre::Result<()> {
    match command {
        Command::BlockCount => print_json(&rpc.get_block_count().await?),
        Command::BlockHash { height } => print_json(&rpc.on_get_block_hash(height).await?),
        Command::BlockTemplate {
            wallet_address,
            reserve_size,
        } => print_json(&rpc.get_block_template(&wallet_address, reserve_size).await?),
        Command::LastBlockHeader(pow) => {
            print_json(&rpc.get_last_block_header(pow.fill_pow_hash).await?)
        }
        Command::BlockHeaderByHash { hash, pow } => {
            print_json(&rpc.get_block_header_by_hash(&hash, pow.fill_pow_hash).await?)
        }
        Command::BlockHeaderByHeight { height, pow } => print_json(
            &rpc.get_block_header_by_height(height, pow.fill_pow_hash)
                .await?,
        ),
        Command::BlockHeadersRange {
            start_height,
            end_height,
            pow,
        } => {
            if start_height > end_height {
                return Err(eyre!(
                    "start height {start_height} is above end height {end_height}"
                ));
            }
            print_json(
                &rpc.get_block_headers_range(start_height, end_height, pow.fill_pow_hash)
                    .await?,
            )
        }
        Command::Block { block, decode } => {
            let mode = decode_mode(decode.expand);
            let result = match parse_block_ref(&block)? {
                BlockRef::Hash(hash) => rpc.get_block_by_hash(hash, mode).await?,
                BlockRef::Height(height) => rpc.get_block_by_height(height, mode).await?,
            };
            match result.json.decoded() {
                Some(details) => print_json(&serde_json::json!({
                    "block_header": result.block_header,
                    "json": details,
                    "miner_tx_hash": result.miner_tx_hash,
                    "tx_hashes": result.tx_hashes,
                })),
                None => print_json(&result),
            }
        }
        Command::FeeEstimate => print_json(&rpc.get_fee_estimate().await?),
        Command::Version => print_json(&rpc.get_version().await?),
        Command::Info => print_json(&rpc.get_info().await?),
        Command::Height => print_json(&rpc.get_height().await?),
        Command::TransactionPool(decode) => {
            let pool = rpc
                .get_transaction_pool(decode_mode(decode.expand))
                .await?;
            if decode.expand {
                let decoded: Vec<_> = pool
                    .transactions
                    .iter()
                    .map(|tx| {
                        serde_json::json!({
                            "id_hash": tx.id_hash,
                            "fee": tx.fee,
                            "tx_json": tx.tx_json.decoded(),
                        })
                    })
                    .collect();
                print_json(&decoded)
            } else {
                print_json(&pool)
            }
        }
        Command::Transactions {
            hashes,
            decode_as_json,
            prune,
            split,
        } => {
            let params = GetTransactionsParams {
                txs_hashes: hashes,
                decode_as_json,
                prune,
                split,
            };
            let txs = rpc.get_transactions(&params).await?;
            if !txs.missed_tx.is_empty() {
                tracing::warn!(missed = ?txs.missed_tx, "daemon does not know some transactions");
            }
            print_json(&txs)
        }
        Command::Watch {
            interval_secs,
            concurrent,
        } => {
            let mode = if concurrent {
                DeliveryMode::Concurrent
            } else {
                DeliveryMode::Sequential
            };
            watch::run(rpc, Duration::from_secs(interval_secs), mode).await
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum BlockRef<'a> {
    Hash(&'a str),
    Height(u64),
}

/// A 64-character hex string is a block hash; anything else must be a height.
fn parse_block_ref(block: &str) -> eyre::Result<BlockRef<'_>> {
    if block.len() == 64 && block.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Ok(BlockRef::Hash(block));
    }
    block
        .parse::<u64>()
        .map(BlockRef::Height)
        .map_err(|_| eyre!("`{block}` is neither a block height nor a 64-character block hash"))
}

/// `Display` of `err` followed by every distinct cause in its source chain.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !rendered.contains(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}

fn decode_mode(expand: bool) -> DecodeMode {
    if expand {
        DecodeMode::Expand
    } else {
        DecodeMode::Raw
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> eyre::Result<()> {
    let rendered = serde_json::to_string_pretty(value).wrap_err("render result as JSON")?;
    println!("{rendered}");
    Ok(())
}

fn format_rpc_connect_error(rpc_url: &str, source_error: &str) -> String {
    let mut lines = vec![
        format!("RPC call to `{rpc_url}` failed"),
        format!("RPC error: {source_error}"),
    ];

    if source_error.contains("dns error") || source_error.contains("failed to lookup address") {
        lines.push(
            "hint: hostname resolution failed; verify the daemon hostname and your DNS/network"
                .into(),
        );
    } else if source_error.contains("tls")
        || source_error.contains("certificate")
        || source_error.contains("SSL")
    {
        lines.push(
            "hint: TLS handshake failed; verify certificate trust and that the daemon serves HTTPS"
                .into(),
        );
    } else if source_error.contains("401") {
        lines.push(
            "hint: digest authentication failed; verify --rpc-user/--rpc-pass match monerod --rpc-login"
                .into(),
        );
    } else if source_error.contains("403") {
        lines.push(
            "hint: method refused; restricted RPC nodes (--restricted-rpc) reject some calls".into(),
        );
    } else if source_error.contains("404") {
        lines.push("hint: endpoint path is invalid; the RPC URL should not include /json_rpc".into());
    } else if source_error.contains("timed out") {
        lines.push("hint: the daemon did not answer in time; raise --timeout-secs or check sync load".into());
    } else if source_error.contains("error sending request for url") {
        lines.push("hint: request could not be sent; verify the daemon is running and --rpc-bind-port is reachable".into());
    }

    lines.join("\n")
}
