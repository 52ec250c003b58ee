//! Parameter and result records for the daemon RPC methods.
//!
//! Result records are `#[serde(default)]` so that fields a given node version
//! omits decode to zero values instead of failing the call. Wide (`wide_*`)
//! hex strings are kept verbatim next to their numeric counterparts.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

use super::opaque::{ExpandOpaque, OpaqueJson};

// ==============================================================================
// Shared Pieces
// ==============================================================================

/// `{status, untrusted}` trailer present on most responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseFooter {
    pub status: String,
    pub untrusted: bool,
}

impl ResponseFooter {
    pub fn is_ok(&self) -> bool {
        self.status == "OK"
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillPowHashParams {
    pub fill_pow_hash: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockHeader {
    pub block_size: u64,
    pub block_weight: u64,
    pub cumulative_difficulty: u64,
    pub cumulative_difficulty_top64: u64,
    pub depth: u64,
    pub difficulty: u64,
    pub difficulty_top64: u64,
    pub hash: String,
    pub height: u64,
    pub long_term_weight: u64,
    pub major_version: u32,
    pub miner_tx_hash: String,
    pub minor_version: u32,
    pub nonce: u64,
    pub num_txes: u32,
    pub orphan_status: bool,
    pub pow_hash: String,
    pub prev_hash: String,
    pub reward: u64,
    pub timestamp: u64,
    pub wide_cumulative_difficulty: String,
    pub wide_difficulty: String,
}

// ==============================================================================
// JSON-RPC Dialect
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockCount {
    pub count: u64,
    #[serde(flatten)]
    pub footer: ResponseFooter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTemplateParams {
    pub wallet_address: String,
    pub reserve_size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockTemplate {
    pub blockhashing_blob: String,
    pub blocktemplate_blob: String,
    pub difficulty: u64,
    pub difficulty_top64: u64,
    pub expected_reward: u64,
    pub height: u64,
    pub next_seed_hash: String,
    pub prev_hash: String,
    pub reserved_offset: u64,
    pub seed_hash: String,
    pub seed_height: u64,
    pub wide_difficulty: String,
    #[serde(flatten)]
    pub footer: ResponseFooter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByHashParams {
    pub fill_pow_hash: bool,
    pub hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByHeightParams {
    pub fill_pow_hash: bool,
    pub height: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeadersRangeParams {
    pub fill_pow_hash: bool,
    pub start_height: u64,
    pub end_height: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockHeaderResult {
    pub block_header: BlockHeader,
    pub credits: u64,
    pub top_hash: String,
    #[serde(flatten)]
    pub footer: ResponseFooter,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockHeadersRange {
    pub headers: Vec<BlockHeader>,
    pub credits: u64,
    pub top_hash: String,
    #[serde(flatten)]
    pub footer: ResponseFooter,
}

/// `get_block` result. `json` holds the block body as a JSON string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockResult {
    pub blob: String,
    pub json: OpaqueJson<BlockDetails>,
    pub miner_tx_hash: String,
    pub tx_hashes: Vec<String>,
    pub block_header: BlockHeader,
    pub credits: u64,
    pub top_hash: String,
    #[serde(flatten)]
    pub footer: ResponseFooter,
}

impl ExpandOpaque for BlockResult {
    fn expand_opaque(&mut self) -> Result<(), CoreError> {
        self.json.expand("json")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeEstimate {
    pub credits: u64,
    pub fee: u64,
    pub fees: Vec<u64>,
    pub quantization_mask: u64,
    pub top_hash: String,
    #[serde(flatten)]
    pub footer: ResponseFooter,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonVersion {
    pub release: bool,
    pub version: u32,
    #[serde(flatten)]
    pub footer: ResponseFooter,
}

impl DaemonVersion {
    /// The packed RPC version as `(major, minor)`.
    pub fn rpc_version(&self) -> (u16, u16) {
        ((self.version >> 16) as u16, (self.version & 0xffff) as u16)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonInfo {
    pub adjusted_time: u64,
    pub alt_blocks_count: u32,
    pub block_size_limit: u64,
    pub block_size_median: u64,
    pub block_weight_limit: u64,
    pub block_weight_median: u64,
    pub bootstrap_daemon_address: String,
    pub busy_syncing: bool,
    pub credits: u64,
    pub cumulative_difficulty: u64,
    pub cumulative_difficulty_top64: u64,
    pub database_size: u64,
    pub difficulty: u64,
    pub difficulty_top64: u64,
    pub free_space: u64,
    pub grey_peerlist_size: u32,
    pub height: u64,
    pub height_without_bootstrap: u64,
    pub incoming_connections_count: u32,
    pub mainnet: bool,
    pub nettype: String,
    pub offline: bool,
    pub outgoing_connections_count: u32,
    pub rpc_connections_count: u32,
    pub stagenet: bool,
    pub start_time: u64,
    pub synchronized: bool,
    pub target: u32,
    pub target_height: u64,
    pub testnet: bool,
    pub top_block_hash: String,
    pub top_hash: String,
    pub tx_count: u64,
    pub tx_pool_size: u32,
    pub update_available: bool,
    pub version: String,
    pub was_bootstrap_ever_used: bool,
    pub white_peerlist_size: u32,
    pub wide_cumulative_difficulty: String,
    pub wide_difficulty: String,
    #[serde(flatten)]
    pub footer: ResponseFooter,
}

// ==============================================================================
// Plain Dialect
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainHeight {
    pub hash: String,
    pub height: u64,
    #[serde(flatten)]
    pub footer: ResponseFooter,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpentKeyImage {
    pub id_hash: String,
    pub txs_hashes: Vec<String>,
}

/// One mempool entry from `/get_transaction_pool`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolTransaction {
    pub blob_size: u64,
    pub do_not_relay: bool,
    pub double_spend_seen: bool,
    pub fee: u64,
    pub id_hash: String,
    pub kept_by_block: bool,
    pub last_failed_height: u64,
    pub last_failed_id_hash: String,
    pub last_relayed_time: u64,
    pub max_used_block_height: u64,
    pub max_used_block_id_hash: String,
    pub receive_time: u64,
    pub relayed: bool,
    pub tx_blob: String,
    pub tx_json: OpaqueJson<TxDetails>,
    pub weight: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionPool {
    pub credits: u64,
    pub spent_key_images: Vec<SpentKeyImage>,
    pub top_hash: String,
    pub transactions: Vec<PoolTransaction>,
    #[serde(flatten)]
    pub footer: ResponseFooter,
}

impl ExpandOpaque for TransactionPool {
    fn expand_opaque(&mut self) -> Result<(), CoreError> {
        self.transactions
            .iter_mut()
            .try_for_each(|tx| tx.tx_json.expand("tx_json"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTransactionsParams {
    pub txs_hashes: Vec<String>,
    pub decode_as_json: bool,
    pub prune: bool,
    pub split: bool,
}

impl GetTransactionsParams {
    pub fn new(txs_hashes: Vec<String>) -> Self {
        Self {
            txs_hashes,
            ..Self::default()
        }
    }
}

/// One entry of `/get_transactions`. `as_json` is empty unless
/// `decode_as_json` was requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionEntry {
    pub as_hex: String,
    pub as_json: OpaqueJson<TxDetails>,
    pub block_height: u64,
    pub block_timestamp: u64,
    pub confirmations: u64,
    pub double_spend_seen: bool,
    pub in_pool: bool,
    pub output_indices: Vec<u64>,
    pub prunable_as_hex: String,
    pub prunable_hash: String,
    pub pruned_as_hex: String,
    pub tx_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transactions {
    pub credits: u64,
    pub missed_tx: Vec<String>,
    pub top_hash: String,
    pub txs: Vec<TransactionEntry>,
    #[serde(flatten)]
    pub footer: ResponseFooter,
}

impl ExpandOpaque for Transactions {
    fn expand_opaque(&mut self) -> Result<(), CoreError> {
        self.txs
            .iter_mut()
            .try_for_each(|tx| tx.as_json.expand("as_json"))
    }
}

// ==============================================================================
// Decoded Sub-Documents
// ==============================================================================

/// Block body carried in `get_block`'s `json` field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockDetails {
    pub major_version: u32,
    pub minor_version: u32,
    pub timestamp: u64,
    pub prev_id: String,
    pub nonce: u64,
    pub miner_tx: TxDetails,
    pub tx_hashes: Vec<String>,
}

/// Transaction body carried in `tx_json` / `as_json` (and the miner tx).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxDetails {
    pub version: u32,
    pub unlock_time: u64,
    pub vin: Vec<TxInput>,
    pub vout: Vec<TxOutput>,
    pub extra: Vec<u8>,
    pub rct_signatures: RctSignatures,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rctsig_prunable: Option<RctPrunable>,
}

/// Either a coinbase `gen` input or a ring-signature `key` input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#gen: Option<GenInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<KeyInput>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenInput {
    pub height: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyInput {
    pub amount: u64,
    pub key_offsets: Vec<u64>,
    pub k_image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxOutput {
    pub amount: u64,
    pub target: OutputTarget,
}

/// Output key, either legacy `key` or view-tagged `tagged_key`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputTarget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagged_key: Option<TaggedKey>,
}

impl OutputTarget {
    pub fn output_key(&self) -> Option<&str> {
        self.tagged_key
            .as_ref()
            .map(|tagged| tagged.key.as_str())
            .or(self.key.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggedKey {
    pub key: String,
    pub view_tag: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RctSignatures {
    #[serde(rename = "type")]
    pub rct_type: u8,
    #[serde(rename = "txnFee")]
    pub txn_fee: u64,
    #[serde(rename = "ecdhInfo")]
    pub ecdh_info: Vec<EcdhInfo>,
    #[serde(rename = "outPk")]
    pub out_pk: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcdhInfo {
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trunc_amount: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RctPrunable {
    pub nbp: u32,
    pub bpp: Vec<BulletproofPlus>,
    #[serde(rename = "CLSAGs")]
    pub clsags: Vec<Clsag>,
    #[serde(rename = "pseudoOuts")]
    pub pseudo_outs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletproofPlus {
    #[serde(rename = "A")]
    pub a: String,
    #[serde(rename = "A1")]
    pub a1: String,
    #[serde(rename = "B")]
    pub b: String,
    pub r1: String,
    pub s1: String,
    pub d1: String,
    #[serde(rename = "L")]
    pub l: Vec<String>,
    #[serde(rename = "R")]
    pub r: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Clsag {
    pub s: Vec<String>,
    pub c1: String,
    #[serde(rename = "D")]
    pub d: String,
}
