//! [`ChainClient`] implementation backed by an alloy [`RootProvider`].

use crate::{ChainClient, ChainClientError};
use alloy_eips::{BlockId, BlockNumberOrTag};
use alloy_provider::{Provider, RootProvider};
use async_trait::async_trait;
use trawler_types::BlockBundle;
use url::Url;

/// A [`ChainClient`] talking JSON-RPC over HTTP.
#[derive(Debug, Clone)]
pub struct AlloyChainClient {
    provider: RootProvider,
}

impl AlloyChainClient {
    /// Creates a client for `url` without contacting the node.
    pub fn new_http(url: Url) -> Self {
        Self { provider: RootProvider::new_http(url) }
    }

    /// Creates a client for `url` and verifies the node is reachable.
    ///
    /// Returns the client together with the chain id reported by the node.
    pub async fn connect(url: Url) -> Result<(Self, u64), ChainClientError> {
        let client = Self::new_http(url);
        let chain_id = client.provider.get_chain_id().await?;
        Ok((client, chain_id))
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    async fn head_number(&self) -> Result<u64, ChainClientError> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn fetch_block(&self, block: BlockNumberOrTag) -> Result<BlockBundle, ChainClientError> {
        let rpc_block = self
            .provider
            .get_block_by_number(block)
            .await?
            .ok_or(ChainClientError::BlockNotFound(block))?;
        let number = rpc_block.header.number;

        // Pin receipts to the fetched hash so `latest` cannot move between the two calls.
        let receipts = self
            .provider
            .get_block_receipts(BlockId::hash(rpc_block.header.hash))
            .await?
            .ok_or(ChainClientError::ReceiptsNotFound(number))?;

        let transactions = rpc_block.transactions.len();
        if receipts.len() != transactions {
            return Err(ChainClientError::ReceiptCountMismatch {
                number,
                transactions,
                receipts: receipts.len(),
            });
        }

        Ok(BlockBundle::from_rpc(&rpc_block, &receipts))
    }
}
