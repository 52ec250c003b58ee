//! Monero daemon RPC abstraction layer.
//!
//! Defines the [`DaemonRpc`] trait and provides an HTTP implementation
//! ([`HttpRpcClient`]) that speaks both daemon dialects through a single
//! generic dispatch call.

mod http_adapter;
pub mod methods;
pub mod opaque;
pub mod types;

pub use http_adapter::{
    encode_request, ClientConfig, ConnectionDescriptor, Credentials, Dialect, EmbeddedError,
    HttpRpcClient, MethodDescriptor, RpcRequest, DEFAULT_REQUEST_ID, JSON_RPC_PATH,
    JSON_RPC_VERSION,
};
pub use opaque::{DecodeMode, ExpandOpaque, OpaqueJson};

use async_trait::async_trait;

use crate::error::CoreError;
use types::{
    BlockCount, BlockHeaderResult, BlockHeadersRange, BlockResult, BlockTemplate, ChainHeight,
    DaemonInfo, DaemonVersion, FeeEstimate, GetTransactionsParams, TransactionPool, Transactions,
};

/// The daemon methods this crate knows how to call.
///
/// Methods returning records with opaque JSON fields take a [`DecodeMode`];
/// `get_transactions` expands exactly when `decode_as_json` is requested.
#[async_trait]
pub trait DaemonRpc: Send + Sync {
    async fn get_block_count(&self) -> Result<BlockCount, CoreError>;

    /// Hash of the block at `height`.
    async fn on_get_block_hash(&self, height: u64) -> Result<String, CoreError>;

    async fn get_block_template(
        &self,
        wallet_address: &str,
        reserve_size: u64,
    ) -> Result<BlockTemplate, CoreError>;

    async fn get_last_block_header(&self, fill_pow_hash: bool)
        -> Result<BlockHeaderResult, CoreError>;

    async fn get_block_header_by_hash(
        &self,
        hash: &str,
        fill_pow_hash: bool,
    ) -> Result<BlockHeaderResult, CoreError>;

    async fn get_block_header_by_height(
        &self,
        height: u64,
        fill_pow_hash: bool,
    ) -> Result<BlockHeaderResult, CoreError>;

    /// Headers for the inclusive range `start_height..=end_height`.
    async fn get_block_headers_range(
        &self,
        start_height: u64,
        end_height: u64,
        fill_pow_hash: bool,
    ) -> Result<BlockHeadersRange, CoreError>;

    async fn get_block_by_height(&self, height: u64, mode: DecodeMode)
        -> Result<BlockResult, CoreError>;

    async fn get_block_by_hash(&self, hash: &str, mode: DecodeMode)
        -> Result<BlockResult, CoreError>;

    async fn get_fee_estimate(&self) -> Result<FeeEstimate, CoreError>;

    async fn get_version(&self) -> Result<DaemonVersion, CoreError>;

    async fn get_info(&self) -> Result<DaemonInfo, CoreError>;

    /// Current chain height and tip hash (plain dialect).
    async fn get_height(&self) -> Result<ChainHeight, CoreError>;

    async fn get_transaction_pool(&self, mode: DecodeMode) -> Result<TransactionPool, CoreError>;

    async fn get_transactions(
        &self,
        params: &GetTransactionsParams,
    ) -> Result<Transactions, CoreError>;
}
