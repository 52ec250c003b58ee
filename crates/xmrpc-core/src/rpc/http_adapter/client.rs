use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::error::{CoreError, RpcError};

use super::super::methods;
use super::super::opaque::{DecodeMode, ExpandOpaque};
use super::super::types::{
    BlockCount, BlockHeaderResult, BlockHeadersRange, BlockHeadersRangeParams, BlockResult,
    BlockTemplate, BlockTemplateParams, ByHashParams, ByHeightParams, ChainHeight, DaemonInfo,
    DaemonVersion, FeeEstimate, FillPowHashParams, GetTransactionsParams, TransactionPool,
    Transactions,
};
use super::super::DaemonRpc;
use super::connection::ConnectionDescriptor;
use super::protocol::{decode_response, encode_request, MethodDescriptor, DEFAULT_REQUEST_ID};
use super::transport::AuthenticatedTransport;

/// Transport-level knobs for [`HttpRpcClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Whole-request deadline; expiry surfaces as [`RpcError::Timeout`].
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// JSON-RPC correlation id sent with every request.
    pub request_id: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            request_id: DEFAULT_REQUEST_ID.to_owned(),
        }
    }
}

/// Monero daemon RPC client over HTTP(S).
///
/// Every call is independent: no caching, no retries, no batching. Callers
/// wanting parallel calls issue them from their own tasks; the underlying
/// `reqwest` pool is shared.
#[derive(Debug)]
pub struct HttpRpcClient {
    client: reqwest::Client,
    transport: AuthenticatedTransport,
    config: ClientConfig,
}

impl HttpRpcClient {
    pub fn new(connection: ConnectionDescriptor, config: ClientConfig) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()
            .map_err(RpcError::Transport)?;

        Ok(Self {
            transport: AuthenticatedTransport::new(client.clone(), connection),
            client,
            config,
        })
    }

    /// A client for another descriptor (e.g. rotated credentials) sharing this
    /// client's connection pool and config. The digest state starts empty.
    pub fn with_connection(&self, connection: ConnectionDescriptor) -> Self {
        Self {
            transport: AuthenticatedTransport::new(self.client.clone(), connection),
            client: self.client.clone(),
            config: self.config.clone(),
        }
    }

    pub fn connection(&self) -> &ConnectionDescriptor {
        self.transport.connection()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run one remote method and decode its result as `R`.
    ///
    /// Pass `&()` for methods without parameters. Failure order: transport,
    /// then HTTP status >= 400 (body left unread), then the embedded error
    /// record, then decoding.
    pub async fn call<P, R>(&self, descriptor: &MethodDescriptor, params: &P) -> Result<R, CoreError>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let request = encode_request(descriptor, &self.config.request_id, params)?;
        debug!(
            rpc.id = %self.config.request_id,
            rpc.method = descriptor.name(),
            rpc.path = descriptor.path(),
            http.method = %request.method,
            "rpc call"
        );

        let response = self.transport.send(&request).await?;
        let status = response.status();
        if status.as_u16() >= 400 {
            debug!(rpc.method = descriptor.name(), %status, "rpc http error");
            return Err(RpcError::HttpStatus {
                status: status.as_u16(),
                message: status.to_string(),
            }
            .into());
        }

        let body = response.bytes().await.map_err(RpcError::from_reqwest)?;
        debug!(rpc.method = descriptor.name(), %status, body_len = body.len(), "rpc response");
        trace!(
            rpc.method = descriptor.name(),
            body = %String::from_utf8_lossy(&body),
            "rpc response body"
        );

        let decoded = decode_response::<R>(descriptor, &body)?;
        if let Some(id) = decoded.id.as_deref() {
            if id != self.config.request_id {
                warn!(
                    rpc.method = descriptor.name(),
                    expected = %self.config.request_id,
                    received = id,
                    "JSON-RPC response id mismatch"
                );
            }
        }
        Ok(decoded.result)
    }

    /// [`HttpRpcClient::call`] followed by the opaque-field pass `mode` asks for.
    pub async fn call_with_mode<P, R>(
        &self,
        descriptor: &MethodDescriptor,
        params: &P,
        mode: DecodeMode,
    ) -> Result<R, CoreError>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned + ExpandOpaque,
    {
        let mut result: R = self.call(descriptor, params).await?;
        result.apply_decode_mode(mode)?;
        Ok(result)
    }
}

#[async_trait]
impl DaemonRpc for HttpRpcClient {
    async fn get_block_count(&self) -> Result<BlockCount, CoreError> {
        self.call(&methods::GET_BLOCK_COUNT, &()).await
    }

    async fn on_get_block_hash(&self, height: u64) -> Result<String, CoreError> {
        self.call(&methods::ON_GET_BLOCK_HASH, &[height]).await
    }

    async fn get_block_template(
        &self,
        wallet_address: &str,
        reserve_size: u64,
    ) -> Result<BlockTemplate, CoreError> {
        let params = BlockTemplateParams {
            wallet_address: wallet_address.to_owned(),
            reserve_size,
        };
        self.call(&methods::GET_BLOCK_TEMPLATE, &params).await
    }

    async fn get_last_block_header(
        &self,
        fill_pow_hash: bool,
    ) -> Result<BlockHeaderResult, CoreError> {
        self.call(
            &methods::GET_LAST_BLOCK_HEADER,
            &FillPowHashParams { fill_pow_hash },
        )
        .await
    }

    async fn get_block_header_by_hash(
        &self,
        hash: &str,
        fill_pow_hash: bool,
    ) -> Result<BlockHeaderResult, CoreError> {
        let params = ByHashParams {
            fill_pow_hash,
            hash: hash.to_owned(),
        };
        self.call(&methods::GET_BLOCK_HEADER_BY_HASH, &params).await
    }

    async fn get_block_header_by_height(
        &self,
        height: u64,
        fill_pow_hash: bool,
    ) -> Result<BlockHeaderResult, CoreError> {
        let params = ByHeightParams {
            fill_pow_hash,
            height,
        };
        self.call(&methods::GET_BLOCK_HEADER_BY_HEIGHT, &params).await
    }

    async fn get_block_headers_range(
        &self,
        start_height: u64,
        end_height: u64,
        fill_pow_hash: bool,
    ) -> Result<BlockHeadersRange, CoreError> {
        let params = BlockHeadersRangeParams {
            fill_pow_hash,
            start_height,
            end_height,
        };
        self.call(&methods::GET_BLOCK_HEADERS_RANGE, &params).await
    }

    async fn get_block_by_height(
        &self,
        height: u64,
        mode: DecodeMode,
    ) -> Result<BlockResult, CoreError> {
        let params = ByHeightParams {
            fill_pow_hash: false,
            height,
        };
        self.call_with_mode(&methods::GET_BLOCK, &params, mode).await
    }

    async fn get_block_by_hash(&self, hash: &str, mode: DecodeMode) -> Result<BlockResult, CoreError> {
        let params = ByHashParams {
            fill_pow_hash: false,
            hash: hash.to_owned(),
        };
        self.call_with_mode(&methods::GET_BLOCK, &params, mode).await
    }

    async fn get_fee_estimate(&self) -> Result<FeeEstimate, CoreError> {
        self.call(&methods::GET_FEE_ESTIMATE, &()).await
    }

    async fn get_version(&self) -> Result<DaemonVersion, CoreError> {
        self.call(&methods::GET_VERSION, &()).await
    }

    async fn get_info(&self) -> Result<DaemonInfo, CoreError> {
        self.call(&methods::GET_INFO, &()).await
    }

    async fn get_height(&self) -> Result<ChainHeight, CoreError> {
        self.call(&methods::GET_HEIGHT, &()).await
    }

    async fn get_transaction_pool(&self, mode: DecodeMode) -> Result<TransactionPool, CoreError> {
        self.call_with_mode(&methods::GET_TRANSACTION_POOL, &(), mode)
            .await
    }

    async fn get_transactions(
        &self,
        params: &GetTransactionsParams,
    ) -> Result<Transactions, CoreError> {
        let mode = if params.decode_as_json {
            DecodeMode::Expand
        } else {
            DecodeMode::Raw
        };
        self.call_with_mode(&methods::GET_TRANSACTIONS, params, mode)
            .await
    }
}
