use crate::error::Result;
use crate::rpc::types::{BlockResponse, BlockTxsResponse};

/// The three node queries the indexer depends on.
///
/// Implementations return `Error::Rpc` for transport-level failures; the
/// fetcher treats those as transient and retries them.
#[async_trait::async_trait]
pub trait RpcClient: Send + Sync {
    async fn get_height(&self) -> Result<u64>;

    async fn get_block(&self, height: u64) -> Result<BlockResponse>;

    async fn get_block_transactions(
        &self,
        height: u64,
        page: u32,
        per_page: u32,
    ) -> Result<BlockTxsResponse>;
}
