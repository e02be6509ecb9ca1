//! Runs the pipeline end to end against an on-disk [`ChainDb`].

use alloy_primitives::B256;
use std::{sync::Arc, time::Duration};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use trawler_ingest::{
    BlockLocks, IngestConfig, IngestOutcome, IngestService, IngestWorker,
    test_utils::{FakeChain, fast_retry, test_bundle},
};
use trawler_storage::{BlockDataStorage, BlockStateStorage, ChainDb, IndexStorage};
use trawler_types::{BlockState, ReceiptRecord};

fn open(dir: &TempDir) -> Arc<ChainDb> {
    Arc::new(ChainDb::new(&dir.path().join("trawler")).expect("open database"))
}

async fn wait_confirmed(db: &ChainDb, numbers: impl Iterator<Item = u64> + Clone) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while !numbers
            .clone()
            .all(|number| db.block_state(number).unwrap() == Some(BlockState::Confirmed))
        {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("blocks were not confirmed in time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn ingests_whole_chain_and_survives_restart() {
    let dir = TempDir::new().unwrap();
    let chain = Arc::new(FakeChain::linear(60, 0));
    let config = IngestConfig {
        poll_interval: Duration::from_millis(5),
        retry: fast_retry(),
        ..Default::default()
    };

    {
        let db = open(&dir);
        let cancellation = CancellationToken::new();
        let service =
            IngestService::new(Arc::clone(&chain), Arc::clone(&db), config, cancellation.clone());
        let handle = tokio::spawn(service.run());
        wait_confirmed(&db, 0..=52).await;
        cancellation.cancel();
        handle.await.unwrap().unwrap();
    }

    let db = open(&dir);
    for number in 0..=52 {
        let bundle = chain.bundle(number).unwrap();
        assert_eq!(db.get_block(number).unwrap(), Some(bundle.block.clone()));
        assert_eq!(db.get_receipts(number).unwrap(), bundle.receipts);
        assert_eq!(db.get_logs(number).unwrap(), bundle.logs);
        assert_eq!(db.block_number_by_hash(bundle.block.hash).unwrap(), Some(number));
    }

    // A restarted worker finds everything confirmed and writes nothing.
    let locks = BlockLocks::new();
    let worker = IngestWorker::new(Arc::clone(&chain), Arc::clone(&db), locks, fast_retry());
    for number in 0..=52 {
        assert_eq!(worker.ingest(number).await, IngestOutcome::AlreadyConfirmed);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reorg_below_frontier_is_repaired_on_disk() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    let chain = Arc::new(FakeChain::linear(40, 0));
    let config = IngestConfig {
        reorg_margin: 4,
        poll_interval: Duration::from_millis(5),
        retry: fast_retry(),
        ..Default::default()
    };
    let cancellation = CancellationToken::new();
    let service =
        IngestService::new(Arc::clone(&chain), Arc::clone(&db), config, cancellation.clone());
    let handle = tokio::spawn(service.run());
    wait_confirmed(&db, 0..=36).await;

    let stale = chain.bundle(34).unwrap();
    chain.reorg(33, 7);
    chain.advance(41, 7);
    wait_confirmed(&db, 37..=37).await;
    tokio::time::timeout(Duration::from_secs(10), async {
        while db.get_block(34).unwrap().map(|block| block.hash) == Some(stale.block.hash) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("stale block was not replaced");

    cancellation.cancel();
    handle.await.unwrap().unwrap();

    for number in 33..=37 {
        let bundle = chain.bundle(number).unwrap();
        assert_eq!(db.get_block(number).unwrap(), Some(bundle.block), "block {number}");
        assert_eq!(db.block_state(number).unwrap(), Some(BlockState::Confirmed));
    }
    assert_eq!(db.block_number_by_hash(stale.block.hash).unwrap(), None);
    for receipt in &stale.receipts {
        assert_eq!(db.receipt_location_by_tx_hash(receipt.transaction_hash).unwrap(), None);
    }
}

#[tokio::test]
async fn pending_block_with_rows_of_replaced_fork_is_rewritten() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    let chain = Arc::new(FakeChain::linear(10, 0));

    // Rows of an interrupted pass over a fork that no longer exists.
    let mut stale = test_bundle(5, B256::ZERO, 9);
    stale.receipts.push(ReceiptRecord {
        transaction_hash: B256::repeat_byte(0xee),
        block_number: 5,
        transaction_index: 2,
        ..Default::default()
    });
    assert!(db.insert_block_state(5).unwrap());
    db.insert_block(&stale.block).unwrap();
    db.insert_receipts(5, &stale.receipts).unwrap();

    let locks = BlockLocks::new();
    let worker = IngestWorker::new(Arc::clone(&chain), Arc::clone(&db), locks, fast_retry());
    assert_eq!(worker.ingest(5).await, IngestOutcome::Inserted);

    let canonical = chain.bundle(5).unwrap();
    assert_eq!(db.block_state(5).unwrap(), Some(BlockState::Confirmed));
    assert_eq!(db.get_block(5).unwrap(), Some(canonical.block.clone()));
    assert_eq!(db.get_receipts(5).unwrap(), canonical.receipts);
    assert_eq!(db.get_logs(5).unwrap(), canonical.logs);
    assert_eq!(db.block_number_by_hash(stale.block.hash).unwrap(), None);
    assert_eq!(db.block_number_by_hash(canonical.block.hash).unwrap(), Some(5));
    for receipt in &stale.receipts {
        assert_eq!(db.receipt_location_by_tx_hash(receipt.transaction_hash).unwrap(), None);
    }
}
