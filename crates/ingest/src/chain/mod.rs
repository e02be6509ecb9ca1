//! Access to the ingested chain.

mod error;
pub use error::ChainClientError;

mod traits;
pub use traits::ChainClient;
#[cfg(test)]
pub(crate) use traits::MockChainClient;

mod alloy;
pub use alloy::AlloyChainClient;
