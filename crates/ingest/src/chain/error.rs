use alloy_eips::BlockNumberOrTag;
use alloy_transport::{RpcError, TransportError};
use thiserror::Error;

/// Errors returned by a [`crate::ChainClient`].
#[derive(Debug, Error)]
pub enum ChainClientError {
    /// The RPC call failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The node does not know the requested block.
    #[error("Block not found: {0}")]
    BlockNotFound(BlockNumberOrTag),

    /// The node returned no receipts for a known block.
    #[error("Receipts not found for block {0}")]
    ReceiptsNotFound(u64),

    /// The node returned a different number of receipts than the block has transactions.
    #[error("Block {number} has {transactions} transactions but {receipts} receipts")]
    ReceiptCountMismatch {
        /// The block number.
        number: u64,
        /// Transactions in the block.
        transactions: usize,
        /// Receipts returned.
        receipts: usize,
    },
}

impl ChainClientError {
    /// Returns `true` if repeating the call may succeed.
    ///
    /// Missing blocks and receipts are transient: a load-balanced endpoint may be lagging behind
    /// the node that reported the head. Malformed requests and responses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(err) => !matches!(
                err,
                RpcError::SerError(_) | RpcError::DeserError { .. } | RpcError::UnsupportedFeature(_)
            ),
            Self::BlockNotFound(_) | Self::ReceiptsNotFound(_) | Self::ReceiptCountMismatch { .. } => {
                true
            }
        }
    }
}
