//! Typed wrappers over [`RpcClient::call`], one per daemon method.
//!
//! Wrappers validate enumerated or ranged inputs locally and raise
//! [`RpcError::InvalidParams`] before any request is issued, so a rejected
//! argument consumes no call id and leaves the counters untouched.

use std::fmt;
use std::str::FromStr;

use bitcoin::{BlockHash, Txid};
use serde_json::{json, Value};

use crate::error::RpcError;
use crate::rpc::{RpcClient, RpcResponse};

// ==============================================================================
// Parameter Types
// ==============================================================================

/// Accepted `mode` values for `getmemoryinfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoryInfoMode {
    #[default]
    Stats,
    MallocInfo,
}

impl MemoryInfoMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stats => "stats",
            Self::MallocInfo => "mallocinfo",
        }
    }
}

impl fmt::Display for MemoryInfoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemoryInfoMode {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stats" => Ok(Self::Stats),
            "mallocinfo" => Ok(Self::MallocInfo),
            other => Err(RpcError::InvalidParams(format!(
                "invalid mode: {other}, valid modes: 'stats' or 'mallocinfo'"
            ))),
        }
    }
}

/// A block addressed either by height or by hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRef {
    Height(u64),
    Hash(BlockHash),
}

impl From<u64> for BlockRef {
    fn from(height: u64) -> Self {
        Self::Height(height)
    }
}

impl From<BlockHash> for BlockRef {
    fn from(hash: BlockHash) -> Self {
        Self::Hash(hash)
    }
}

impl BlockRef {
    fn to_param(self) -> Value {
        match self {
            Self::Height(height) => json!(height),
            Self::Hash(hash) => json!(hash.to_string()),
        }
    }
}

/// Highest `verbosity` accepted by `getblock`.
pub const MAX_BLOCK_VERBOSITY: u8 = 3;

// ==============================================================================
// Wrappers
// ==============================================================================

impl RpcClient {
    /// Total uptime of the server, in seconds.
    pub async fn uptime(&self) -> Result<RpcResponse, RpcError> {
        self.call("uptime", Vec::new()).await
    }

    pub async fn get_rpc_info(&self) -> Result<RpcResponse, RpcError> {
        self.call("getrpcinfo", Vec::new()).await
    }

    pub async fn get_blockchain_info(&self) -> Result<RpcResponse, RpcError> {
        self.call("getblockchaininfo", Vec::new()).await
    }

    /// Height of the most-work fully-validated chain.
    pub async fn get_block_count(&self) -> Result<RpcResponse, RpcError> {
        self.call("getblockcount", Vec::new()).await
    }

    pub async fn get_best_block_hash(&self) -> Result<RpcResponse, RpcError> {
        self.call("getbestblockhash", Vec::new()).await
    }

    pub async fn get_block_hash(&self, height: u64) -> Result<RpcResponse, RpcError> {
        self.call("getblockhash", vec![json!(height)]).await
    }

    /// `verbosity` 0 returns hex, 1 a decoded block with txids, 2 and 3 add
    /// decoded transactions and prevouts.
    pub async fn get_block(
        &self,
        hash: &BlockHash,
        verbosity: u8,
    ) -> Result<RpcResponse, RpcError> {
        if verbosity > MAX_BLOCK_VERBOSITY {
            return Err(RpcError::InvalidParams(format!(
                "invalid verbosity: {verbosity}, valid range: 0..={MAX_BLOCK_VERBOSITY}"
            )));
        }
        let params = vec![json!(hash.to_string()), json!(verbosity)];
        self.call("getblock", params).await
    }

    pub async fn get_block_header(
        &self,
        hash: &BlockHash,
        verbose: bool,
    ) -> Result<RpcResponse, RpcError> {
        let params = vec![json!(hash.to_string()), json!(verbose)];
        self.call("getblockheader", params).await
    }

    pub async fn get_block_stats(
        &self,
        block: impl Into<BlockRef>,
    ) -> Result<RpcResponse, RpcError> {
        let params = vec![block.into().to_param()];
        self.call("getblockstats", params).await
    }

    pub async fn get_chain_states(&self) -> Result<RpcResponse, RpcError> {
        self.call("getchainstates", Vec::new()).await
    }

    pub async fn get_chain_tips(&self) -> Result<RpcResponse, RpcError> {
        self.call("getchaintips", Vec::new()).await
    }

    /// Transaction-rate statistics over the last `nblocks` blocks, or the
    /// daemon's one-month default window when `None`.
    pub async fn get_chain_tx_stats(&self, nblocks: Option<u32>) -> Result<RpcResponse, RpcError> {
        let params = nblocks.map(|n| vec![json!(n)]).unwrap_or_default();
        self.call("getchaintxstats", params).await
    }

    /// Soft-fork deployment state at `hash`, or at the tip when `None`.
    pub async fn get_deployment_info(
        &self,
        hash: Option<&BlockHash>,
    ) -> Result<RpcResponse, RpcError> {
        let params = hash.map(|h| vec![json!(h.to_string())]).unwrap_or_default();
        self.call("getdeploymentinfo", params).await
    }

    pub async fn get_difficulty(&self) -> Result<RpcResponse, RpcError> {
        self.call("getdifficulty", Vec::new()).await
    }

    /// `mode` must be `stats` or `mallocinfo`.
    pub async fn get_memory_info(&self, mode: &str) -> Result<RpcResponse, RpcError> {
        let mode: MemoryInfoMode = mode.parse()?;
        self.call("getmemoryinfo", vec![json!(mode.as_str())]).await
    }

    pub async fn get_mem_pool_info(&self) -> Result<RpcResponse, RpcError> {
        self.call("getmempoolinfo", Vec::new()).await
    }

    pub async fn get_raw_mem_pool(&self, verbose: bool) -> Result<RpcResponse, RpcError> {
        self.call("getrawmempool", vec![json!(verbose)]).await
    }

    pub async fn get_mem_pool_entry(&self, txid: &Txid) -> Result<RpcResponse, RpcError> {
        let params = vec![json!(txid.to_string())];
        self.call("getmempoolentry", params).await
    }

    /// Confirmed transactions outside the mempool need `-txindex`.
    pub async fn get_raw_transaction(
        &self,
        txid: &Txid,
        verbose: bool,
    ) -> Result<RpcResponse, RpcError> {
        let params = vec![json!(txid.to_string()), json!(verbose)];
        self.call("getrawtransaction", params).await
    }

    /// `result` is null when the output is spent or unknown.
    pub async fn get_tx_out(
        &self,
        txid: &Txid,
        vout: u32,
        include_mempool: bool,
    ) -> Result<RpcResponse, RpcError> {
        let params = vec![json!(txid.to_string()), json!(vout), json!(include_mempool)];
        self.call("gettxout", params).await
    }

    pub async fn get_network_info(&self) -> Result<RpcResponse, RpcError> {
        self.call("getnetworkinfo", Vec::new()).await
    }

    pub async fn get_connection_count(&self) -> Result<RpcResponse, RpcError> {
        self.call("getconnectioncount", Vec::new()).await
    }

    pub async fn get_net_totals(&self) -> Result<RpcResponse, RpcError> {
        self.call("getnettotals", Vec::new()).await
    }

    /// Known peer addresses; `count` 0 returns all of them.
    pub async fn get_node_addresses(&self, count: u32) -> Result<RpcResponse, RpcError> {
        self.call("getnodeaddresses", vec![json!(count)]).await
    }

    pub async fn get_peer_info(&self) -> Result<RpcResponse, RpcError> {
        self.call("getpeerinfo", Vec::new()).await
    }
}
