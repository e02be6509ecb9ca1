//! End-to-end tests of [`ChainDb`] through its public storage traits.

use alloy_primitives::{Address, Bytes, keccak256};
use tempfile::TempDir;
use trawler_storage::{
    BlockDataStorage, BlockDeletion, BlockItemKey, BlockStateStorage, ChainDb, IndexStorage,
};
use trawler_types::{BlockRecord, BlockState, LogRecord, ReceiptRecord};

fn open() -> (TempDir, ChainDb) {
    let dir = TempDir::new().expect("create temp dir");
    let db = ChainDb::new(&dir.path().join("trawler")).expect("open database");
    (dir, db)
}

fn block(number: u64, fork: u8) -> (BlockRecord, Vec<ReceiptRecord>, Vec<LogRecord>) {
    let hash = keccak256([fork, number as u8]);
    let block = BlockRecord {
        number,
        hash,
        transaction_count: 2,
        extra_data: Bytes::from_static(b"trawler"),
        ..Default::default()
    };
    let receipts = (0..2)
        .map(|index| ReceiptRecord {
            block_number: number,
            block_hash: hash,
            transaction_index: index,
            transaction_hash: keccak256([fork, number as u8, index as u8]),
            ..Default::default()
        })
        .collect();
    let logs = (0..3)
        .map(|index| LogRecord {
            address: Address::repeat_byte(fork),
            block_number: number,
            block_hash: hash,
            log_index: index,
            ..Default::default()
        })
        .collect();
    (block, receipts, logs)
}

fn persist(db: &ChainDb, data: &(BlockRecord, Vec<ReceiptRecord>, Vec<LogRecord>)) {
    let (block, receipts, logs) = data;
    db.insert_block(block).unwrap();
    db.insert_receipts(block.number, receipts).unwrap();
    db.insert_logs(block.number, logs).unwrap();
}

#[test]
fn dirty_block_is_replaced_without_duplicates() {
    let (_dir, db) = open();
    let original = block(100, 0x01);
    let replacement = block(100, 0x02);

    assert!(db.insert_block_state(100).unwrap());
    persist(&db, &original);
    db.update_block_state(100, BlockState::Confirmed).unwrap();

    assert!(
        db.compare_and_set_block_state(100, Some(BlockState::Confirmed), BlockState::Dirty)
            .unwrap()
    );

    let deletion = db.delete_block(100).unwrap();
    assert_eq!(deletion, BlockDeletion { block: true, receipts: 2, logs: 3 });
    persist(&db, &replacement);
    db.update_block_state(100, BlockState::Confirmed).unwrap();

    assert_eq!(db.block_state(100).unwrap(), Some(BlockState::Confirmed));
    assert_eq!(db.get_block(100).unwrap(), Some(replacement.0.clone()));
    assert_eq!(db.get_receipts(100).unwrap(), replacement.1);
    assert_eq!(db.get_logs(100).unwrap(), replacement.2);

    assert_eq!(db.block_number_by_hash(original.0.hash).unwrap(), None);
    assert_eq!(db.block_number_by_hash(replacement.0.hash).unwrap(), Some(100));
    assert_eq!(db.receipt_location_by_tx_hash(original.1[0].transaction_hash).unwrap(), None);
    assert_eq!(
        db.receipt_location_by_tx_hash(replacement.1[1].transaction_hash).unwrap(),
        Some(BlockItemKey::new(100, 1))
    );
}

#[test]
fn rebuild_indexes_after_reopen() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("trawler");
    {
        let db = ChainDb::new(&path).unwrap();
        for number in 0..4 {
            persist(&db, &block(number, 0x10));
        }
    }

    let db = ChainDb::new(&path).unwrap();
    let stats = db.rebuild_indexes().unwrap();
    assert_eq!(stats.blocks, 4);
    assert_eq!(stats.receipts, 8);
    for number in 0..4 {
        assert_eq!(db.block_number_by_hash(block(number, 0x10).0.hash).unwrap(), Some(number));
    }
}

#[test]
fn genesis_is_a_regular_block() {
    let (_dir, db) = open();

    assert!(db.compare_and_set_block_state(0, None, BlockState::Pending).unwrap());
    persist(&db, &block(0, 0x07));
    assert_eq!(db.get_receipts(0).unwrap().len(), 2);
    assert!(db.get_receipts(1).unwrap().is_empty());
}
