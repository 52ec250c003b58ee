use clap::{Args, Parser, Subcommand};

/// xmrpc: query a Monero daemon over its JSON-RPC and plain JSON endpoints.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Daemon RPC base URL.
    #[arg(long, default_value = "http://127.0.0.1:18081", env = "XMRPC_RPC_URL")]
    pub rpc_url: String,

    /// Digest auth username (`--rpc-login` user on monerod).
    #[arg(long, env = "XMRPC_RPC_USER")]
    pub rpc_user: Option<String>,

    /// Digest auth password.
    #[arg(long, env = "XMRPC_RPC_PASS", hide_env_values = true)]
    pub rpc_pass: Option<String>,

    /// Whole-request timeout in seconds.
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Number of blocks in the longest chain.
    BlockCount,
    /// Block hash at a height.
    BlockHash { height: u64 },
    /// Block template for mining to an address.
    BlockTemplate {
        wallet_address: String,
        #[arg(long, default_value = "60")]
        reserve_size: u64,
    },
    /// Header of the chain tip.
    LastBlockHeader(PowArgs),
    /// Header of the block with the given hash.
    BlockHeaderByHash {
        hash: String,
        #[command(flatten)]
        pow: PowArgs,
    },
    /// Header of the block at the given height.
    BlockHeaderByHeight {
        height: u64,
        #[command(flatten)]
        pow: PowArgs,
    },
    /// Headers for an inclusive height range.
    BlockHeadersRange {
        start_height: u64,
        end_height: u64,
        #[command(flatten)]
        pow: PowArgs,
    },
    /// Full block by height or hash.
    Block {
        /// A height, or a 64-character block hash.
        block: String,
        #[command(flatten)]
        decode: DecodeArgs,
    },
    /// Fee estimate per byte.
    FeeEstimate,
    /// Daemon RPC version.
    Version,
    /// General node information.
    Info,
    /// Chain height and tip hash (plain endpoint).
    Height,
    /// Mempool contents.
    TransactionPool(DecodeArgs),
    /// Transactions by hash.
    Transactions {
        #[arg(required = true)]
        hashes: Vec<String>,
        /// Ask the daemon for `as_json` and decode it.
        #[arg(long)]
        decode_as_json: bool,
        #[arg(long)]
        prune: bool,
        #[arg(long)]
        split: bool,
    },
    /// Watch for new chain tips and log each new block.
    Watch {
        /// Seconds between `/get_height` polls.
        #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
        interval_secs: u64,
        /// Deliver to observers concurrently instead of in order.
        #[arg(long)]
        concurrent: bool,
    },
}

#[derive(Args, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowArgs {
    /// Ask the daemon to fill in `pow_hash`.
    #[arg(long)]
    pub fill_pow_hash: bool,
}

#[derive(Args, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeArgs {
    /// Decode the embedded JSON documents instead of printing them as strings.
    #[arg(long)]
    pub expand: bool,
}
