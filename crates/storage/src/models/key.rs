//! Composite key for per-transaction and per-log tables.

use reth_db_api::{
    DatabaseError,
    table::{Decode, Encode},
};
use serde::{Deserialize, Serialize};

/// Locates an item inside a block: a receipt by transaction index or a log by log index.
///
/// Encoded as 16 big-endian bytes (`block_number ‖ index`), so a cursor walk over a table keyed
/// by [`BlockItemKey`] visits blocks in ascending order and items in index order within a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockItemKey {
    /// The block containing the item.
    pub block_number: u64,
    /// The transaction index or log index within the block.
    pub index: u64,
}

impl BlockItemKey {
    /// Creates a new [`BlockItemKey`].
    pub const fn new(block_number: u64, index: u64) -> Self {
        Self { block_number, index }
    }

    /// The lowest key belonging to `block_number`.
    pub(crate) const fn first(block_number: u64) -> Self {
        Self::new(block_number, 0)
    }

    /// The highest key belonging to `block_number`.
    pub(crate) const fn last(block_number: u64) -> Self {
        Self::new(block_number, u64::MAX)
    }
}

impl Encode for BlockItemKey {
    type Encoded = [u8; 16];

    fn encode(self) -> Self::Encoded {
        let mut buf = [0u8; 16];
        buf[..8].copy_from_slice(&self.block_number.to_be_bytes());
        buf[8..].copy_from_slice(&self.index.to_be_bytes());
        buf
    }
}

impl Decode for BlockItemKey {
    fn decode(value: &[u8]) -> Result<Self, DatabaseError> {
        let (number, index) = value.split_at_checked(8).ok_or(DatabaseError::Decode)?;
        let block_number = u64::from_be_bytes(number.try_into().map_err(|_| DatabaseError::Decode)?);
        let index = u64::from_be_bytes(index.try_into().map_err(|_| DatabaseError::Decode)?);
        Ok(Self { block_number, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_orders_by_block_then_index() {
        let keys = [
            BlockItemKey::new(1, 300),
            BlockItemKey::new(2, 0),
            BlockItemKey::new(2, 1),
            BlockItemKey::new(256, 0),
        ];
        for pair in keys.windows(2) {
            assert!(pair[0].encode() < pair[1].encode(), "{:?} < {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_decode() {
        let key = BlockItemKey::new(0x0102, 7);
        assert_eq!(BlockItemKey::decode(&key.encode()).unwrap(), key);
        assert!(matches!(BlockItemKey::decode(&[0u8; 15]), Err(DatabaseError::Decode)));
        assert!(matches!(BlockItemKey::decode(&[0u8; 17]), Err(DatabaseError::Decode)));
    }

    #[test]
    fn test_block_bounds() {
        assert!(BlockItemKey::first(5) < BlockItemKey::new(5, 3));
        assert!(BlockItemKey::new(5, 3) < BlockItemKey::last(5));
        assert!(BlockItemKey::last(5) < BlockItemKey::first(6));
    }
}
