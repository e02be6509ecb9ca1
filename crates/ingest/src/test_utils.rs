//! In-memory doubles for the chain and the store.

use crate::{ChainClient, ChainClientError, RetryConfig};
use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{Address, B256, keccak256};
use async_trait::async_trait;
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use trawler_storage::{BlockDataStorage, BlockDeletion, BlockStateStorage, StorageError};
use trawler_types::{BlockBundle, BlockRecord, BlockState, LogRecord, ReceiptRecord};

/// A backoff policy with two quick retries.
pub const fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_times: 2,
        min_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(2),
    }
}

/// The hash of test block `number` on `fork`.
pub fn block_hash(number: u64, fork: u8) -> B256 {
    let mut preimage = [0u8; 9];
    preimage[0] = fork;
    preimage[1..].copy_from_slice(&number.to_be_bytes());
    keccak256(preimage)
}

/// Builds a block with two transactions, each emitting one log.
pub fn test_bundle(number: u64, parent_hash: B256, fork: u8) -> BlockBundle {
    let hash = block_hash(number, fork);
    let receipts = (0..2u64)
        .map(|index| {
            let transaction_hash = keccak256([hash.as_slice(), index.to_be_bytes().as_slice()].concat());
            ReceiptRecord {
                status: 1,
                transaction_hash,
                block_hash: hash,
                block_number: number,
                transaction_index: index,
                logs: vec![LogRecord {
                    address: Address::with_last_byte(fork),
                    block_number: number,
                    transaction_hash,
                    transaction_index: index,
                    block_hash: hash,
                    log_index: index,
                    ..Default::default()
                }],
                ..Default::default()
            }
        })
        .collect();
    let block =
        BlockRecord { number, hash, parent_hash, transaction_count: 2, ..Default::default() };
    BlockBundle::new(block, receipts)
}

/// The kinds of storage calls [`InMemoryStorage`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageOp {
    /// [`BlockStateStorage::block_state`].
    BlockState,
    /// [`BlockStateStorage::insert_block_state`].
    InsertBlockState,
    /// [`BlockStateStorage::update_block_state`].
    UpdateBlockState,
    /// [`BlockStateStorage::compare_and_set_block_state`].
    CompareAndSet,
    /// [`BlockDataStorage::insert_block`].
    InsertBlock,
    /// [`BlockDataStorage::insert_receipts`].
    InsertReceipts,
    /// [`BlockDataStorage::insert_logs`].
    InsertLogs,
    /// [`BlockDataStorage::delete_block`].
    DeleteBlock,
}

/// A successful mutating call made against [`InMemoryStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCall {
    /// A pending record was created.
    InsertBlockState(u64),
    /// A state was overwritten.
    UpdateBlockState(u64, BlockState),
    /// A compare-and-set succeeded.
    CompareAndSet(u64, Option<BlockState>, BlockState),
    /// A block document was written.
    InsertBlock(u64),
    /// Receipts were written.
    InsertReceipts(u64, usize),
    /// Logs were written.
    InsertLogs(u64, usize),
    /// Block data was deleted.
    DeleteBlock(u64),
}

#[derive(Debug, Default)]
struct StorageInner {
    // `None` marks a record that no longer decodes.
    states: BTreeMap<u64, Option<BlockState>>,
    blocks: BTreeMap<u64, BlockRecord>,
    receipts: BTreeMap<(u64, u64), ReceiptRecord>,
    logs: BTreeMap<(u64, u64), LogRecord>,
    calls: Vec<StorageCall>,
    failures: HashMap<StorageOp, usize>,
}

impl StorageInner {
    fn check(&mut self, op: StorageOp) -> Result<(), StorageError> {
        match self.failures.get_mut(&op) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(StorageError::DatabaseInit(format!("injected {op:?} failure")))
            }
            _ => Ok(()),
        }
    }

    fn state(&self, number: u64) -> Option<BlockState> {
        self.states.get(&number).copied().flatten()
    }
}

/// A [`BlockStateStorage`] and [`BlockDataStorage`] kept in memory that records every
/// successful mutation and can inject failures.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    inner: Mutex<StorageInner>,
}

impl InMemoryStorage {
    fn inner(&self) -> MutexGuard<'_, StorageInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes the next `times` calls of kind `op` fail.
    pub fn fail(&self, op: StorageOp, times: usize) {
        self.inner().failures.insert(op, times);
    }

    /// Replaces the state record of `number` with one that does not decode.
    pub fn corrupt_state(&self, number: u64) {
        self.inner().states.insert(number, None);
    }

    /// Sets the state of `number` without recording a call.
    pub fn seed_state(&self, number: u64, state: BlockState) {
        self.inner().states.insert(number, Some(state));
    }

    /// Stores `bundle` without recording calls.
    pub fn seed_bundle(&self, bundle: &BlockBundle) {
        let mut inner = self.inner();
        let number = bundle.number();
        inner.blocks.insert(number, bundle.block.clone());
        for receipt in &bundle.receipts {
            inner.receipts.insert((number, receipt.transaction_index), receipt.clone());
        }
        for log in &bundle.logs {
            inner.logs.insert((number, log.log_index), log.clone());
        }
    }

    /// Every successful mutating call, in order.
    pub fn calls(&self) -> Vec<StorageCall> {
        self.inner().calls.clone()
    }

    /// Forgets the recorded calls.
    pub fn clear_calls(&self) {
        self.inner().calls.clear();
    }

    /// The state of `number`, `None` if absent or malformed.
    pub fn state(&self, number: u64) -> Option<BlockState> {
        self.inner().state(number)
    }

    /// Numbers that have a state record, in ascending order.
    pub fn tracked(&self) -> Vec<u64> {
        self.inner().states.keys().copied().collect()
    }

    /// Number of stored receipts across all blocks.
    pub fn receipt_count(&self) -> usize {
        self.inner().receipts.len()
    }

    /// Number of stored logs across all blocks.
    pub fn log_count(&self) -> usize {
        self.inner().logs.len()
    }
}

impl BlockStateStorage for InMemoryStorage {
    fn block_state(&self, number: u64) -> Result<Option<BlockState>, StorageError> {
        let mut inner = self.inner();
        inner.check(StorageOp::BlockState)?;
        Ok(inner.state(number))
    }

    fn insert_block_state(&self, number: u64) -> Result<bool, StorageError> {
        let mut inner = self.inner();
        inner.check(StorageOp::InsertBlockState)?;
        if inner.state(number).is_some() {
            return Ok(false);
        }
        inner.states.insert(number, Some(BlockState::Pending));
        inner.calls.push(StorageCall::InsertBlockState(number));
        Ok(true)
    }

    fn update_block_state(&self, number: u64, state: BlockState) -> Result<(), StorageError> {
        let mut inner = self.inner();
        inner.check(StorageOp::UpdateBlockState)?;
        if inner.state(number).is_none() {
            return Err(StorageError::EntryNotFound(format!("block state {number}")));
        }
        inner.states.insert(number, Some(state));
        inner.calls.push(StorageCall::UpdateBlockState(number, state));
        Ok(())
    }

    fn compare_and_set_block_state(
        &self,
        number: u64,
        expected: Option<BlockState>,
        new: BlockState,
    ) -> Result<bool, StorageError> {
        let mut inner = self.inner();
        inner.check(StorageOp::CompareAndSet)?;
        if inner.state(number) != expected {
            return Ok(false);
        }
        inner.states.insert(number, Some(new));
        inner.calls.push(StorageCall::CompareAndSet(number, expected, new));
        Ok(true)
    }
}

impl BlockDataStorage for InMemoryStorage {
    fn insert_block(&self, block: &BlockRecord) -> Result<(), StorageError> {
        let mut inner = self.inner();
        inner.check(StorageOp::InsertBlock)?;
        inner.blocks.insert(block.number, block.clone());
        inner.calls.push(StorageCall::InsertBlock(block.number));
        Ok(())
    }

    fn insert_receipts(&self, number: u64, receipts: &[ReceiptRecord]) -> Result<(), StorageError> {
        let mut inner = self.inner();
        inner.check(StorageOp::InsertReceipts)?;
        for receipt in receipts {
            inner.receipts.insert((number, receipt.transaction_index), receipt.clone());
        }
        inner.calls.push(StorageCall::InsertReceipts(number, receipts.len()));
        Ok(())
    }

    fn insert_logs(&self, number: u64, logs: &[LogRecord]) -> Result<(), StorageError> {
        let mut inner = self.inner();
        inner.check(StorageOp::InsertLogs)?;
        for log in logs {
            inner.logs.insert((number, log.log_index), log.clone());
        }
        inner.calls.push(StorageCall::InsertLogs(number, logs.len()));
        Ok(())
    }

    fn delete_block(&self, number: u64) -> Result<BlockDeletion, StorageError> {
        let mut inner = self.inner();
        inner.check(StorageOp::DeleteBlock)?;
        let block = inner.blocks.remove(&number).is_some();
        let before = (inner.receipts.len(), inner.logs.len());
        inner.receipts.retain(|(block_number, _), _| *block_number != number);
        inner.logs.retain(|(block_number, _), _| *block_number != number);
        inner.calls.push(StorageCall::DeleteBlock(number));
        Ok(BlockDeletion {
            block,
            receipts: before.0 - inner.receipts.len(),
            logs: before.1 - inner.logs.len(),
        })
    }

    fn get_block(&self, number: u64) -> Result<Option<BlockRecord>, StorageError> {
        Ok(self.inner().blocks.get(&number).cloned())
    }

    fn get_receipts(&self, number: u64) -> Result<Vec<ReceiptRecord>, StorageError> {
        let inner = self.inner();
        Ok(inner.receipts.range((number, 0)..=(number, u64::MAX)).map(|(_, r)| r.clone()).collect())
    }

    fn get_logs(&self, number: u64) -> Result<Vec<LogRecord>, StorageError> {
        let inner = self.inner();
        Ok(inner.logs.range((number, 0)..=(number, u64::MAX)).map(|(_, l)| l.clone()).collect())
    }
}

#[derive(Debug, Default)]
struct ChainInner {
    head: u64,
    blocks: BTreeMap<u64, BlockBundle>,
    failing: HashSet<u64>,
    head_failures: usize,
    fetches: Vec<u64>,
}

/// A [`ChainClient`] serving generated blocks from memory.
#[derive(Debug, Default)]
pub struct FakeChain {
    inner: Mutex<ChainInner>,
}

impl FakeChain {
    /// Creates a chain with blocks `0..=head` on `fork`.
    pub fn linear(head: u64, fork: u8) -> Self {
        let chain = Self::default();
        chain.extend(0, head, fork);
        chain
    }

    fn inner(&self) -> MutexGuard<'_, ChainInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn extend(&self, from: u64, to: u64, fork: u8) {
        let mut inner = self.inner();
        let mut parent_hash = from
            .checked_sub(1)
            .and_then(|parent| inner.blocks.get(&parent))
            .map(|bundle| bundle.block.hash)
            .unwrap_or_default();
        for number in from..=to {
            let bundle = test_bundle(number, parent_hash, fork);
            parent_hash = bundle.block.hash;
            inner.blocks.insert(number, bundle);
        }
        inner.blocks.retain(|number, _| *number <= to);
        inner.head = to;
    }

    /// Grows the chain on `fork` until its head is `head`.
    pub fn advance(&self, head: u64, fork: u8) {
        let from = self.head() + 1;
        self.extend(from, head, fork);
    }

    /// Replaces blocks `from..=head` with blocks of `fork`, keeping the head height.
    pub fn reorg(&self, from: u64, fork: u8) {
        let head = self.head();
        self.extend(from, head, fork);
    }

    /// The current head number.
    pub fn head(&self) -> u64 {
        self.inner().head
    }

    /// The block currently served at `number`.
    pub fn bundle(&self, number: u64) -> Option<BlockBundle> {
        self.inner().blocks.get(&number).cloned()
    }

    /// Makes every fetch of `number` fail until [`Self::recover`] is called.
    pub fn fail_block(&self, number: u64) {
        self.inner().failing.insert(number);
    }

    /// Undoes [`Self::fail_block`].
    pub fn recover(&self, number: u64) {
        self.inner().failing.remove(&number);
    }

    /// Makes the next `times` head queries fail.
    pub fn fail_head(&self, times: usize) {
        self.inner().head_failures = times;
    }

    /// Every block number fetched so far, in order.
    pub fn fetches(&self) -> Vec<u64> {
        self.inner().fetches.clone()
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn head_number(&self) -> Result<u64, ChainClientError> {
        let mut inner = self.inner();
        if inner.head_failures > 0 {
            inner.head_failures -= 1;
            return Err(ChainClientError::BlockNotFound(BlockNumberOrTag::Latest));
        }
        Ok(inner.head)
    }

    async fn fetch_block(&self, block: BlockNumberOrTag) -> Result<BlockBundle, ChainClientError> {
        let mut inner = self.inner();
        let number = match block {
            BlockNumberOrTag::Number(number) => number,
            _ => inner.head,
        };
        inner.fetches.push(number);
        if inner.failing.contains(&number) {
            return Err(ChainClientError::BlockNotFound(block));
        }
        inner.blocks.get(&number).cloned().ok_or(ChainClientError::BlockNotFound(block))
    }
}
