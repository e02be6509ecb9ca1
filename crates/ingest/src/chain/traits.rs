use crate::ChainClientError;
use alloy_eips::BlockNumberOrTag;
use async_trait::async_trait;
use std::fmt::Debug;
use trawler_types::BlockBundle;

/// Read access to the chain being ingested.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainClient: Debug + Send + Sync {
    /// Returns the number of the latest block known to the node.
    async fn head_number(&self) -> Result<u64, ChainClientError>;

    /// Fetches a block together with its receipts and logs.
    ///
    /// [`BlockNumberOrTag::Latest`] fetches the latest block.
    async fn fetch_block(&self, block: BlockNumberOrTag) -> Result<BlockBundle, ChainClientError>;
}
