//! Descriptors for every daemon method the client speaks.

use super::http_adapter::MethodDescriptor;

// ==============================================================================
// JSON-RPC Dialect (POST /json_rpc)
// ==============================================================================

pub const GET_BLOCK_COUNT: MethodDescriptor = MethodDescriptor::json_rpc("get_block_count");
pub const ON_GET_BLOCK_HASH: MethodDescriptor = MethodDescriptor::json_rpc("on_get_block_hash");
pub const GET_BLOCK_TEMPLATE: MethodDescriptor = MethodDescriptor::json_rpc("get_block_template");
pub const GET_LAST_BLOCK_HEADER: MethodDescriptor =
    MethodDescriptor::json_rpc("get_last_block_header");
pub const GET_BLOCK_HEADER_BY_HASH: MethodDescriptor =
    MethodDescriptor::json_rpc("get_block_header_by_hash");
pub const GET_BLOCK_HEADER_BY_HEIGHT: MethodDescriptor =
    MethodDescriptor::json_rpc("get_block_header_by_height");
pub const GET_BLOCK_HEADERS_RANGE: MethodDescriptor =
    MethodDescriptor::json_rpc("get_block_headers_range");
pub const GET_BLOCK: MethodDescriptor = MethodDescriptor::json_rpc("get_block");
pub const GET_FEE_ESTIMATE: MethodDescriptor = MethodDescriptor::json_rpc("get_fee_estimate");
pub const GET_VERSION: MethodDescriptor = MethodDescriptor::json_rpc("get_version");
pub const GET_INFO: MethodDescriptor = MethodDescriptor::json_rpc("get_info");

// ==============================================================================
// Plain Dialect
// ==============================================================================

pub const GET_HEIGHT: MethodDescriptor = MethodDescriptor::plain("get_height", "/get_height");
pub const GET_TRANSACTION_POOL: MethodDescriptor =
    MethodDescriptor::plain("get_transaction_pool", "/get_transaction_pool");
pub const GET_TRANSACTIONS: MethodDescriptor =
    MethodDescriptor::plain("get_transactions", "/get_transactions");
