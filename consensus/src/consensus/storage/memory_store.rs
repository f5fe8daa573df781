//! In-memory chain store
//!
//! Keeps blocks, the main-chain height index, the transaction index and
//! spent-output bitmaps in hash maps. Writes made between `begin` and
//! `commit` are journaled so `rollback` can undo them.

use super::{BlockEntry, ChainStore, Coins, TxLocation};
use consensus_core::errors::ConsensusResult;
use consensus_core::{Hash, InternalError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

enum Undo {
    Block(Hash),
    Height(usize),
    Tx(Hash),
    Coins(Hash, Option<Coins>),
}

#[derive(Default)]
struct Inner {
    blocks: HashMap<Hash, Arc<BlockEntry>>,
    main_chain: Vec<Hash>,
    txs: HashMap<Hash, (Hash, usize)>,
    coins: HashMap<Hash, Coins>,
    journal: Option<Vec<Undo>>,
}

impl Inner {
    fn record(&mut self, undo: Undo) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(undo);
        }
    }
}

/// Chain store backed by process memory
#[derive(Default)]
pub struct MemoryChainStore {
    inner: RwLock<Inner>,
}

impl MemoryChainStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block_count(&self) -> usize {
        self.inner.read().blocks.len()
    }

    pub fn in_transaction(&self) -> bool {
        self.inner.read().journal.is_some()
    }
}

impl ChainStore for MemoryChainStore {
    fn find_block(&self, hash: &Hash) -> ConsensusResult<Option<Arc<BlockEntry>>> {
        Ok(self.inner.read().blocks.get(hash).cloned())
    }

    fn find_block_by_height(&self, height: u64) -> ConsensusResult<Option<Arc<BlockEntry>>> {
        let inner = self.inner.read();
        Ok(inner.main_chain.get(height as usize).and_then(|h| inner.blocks.get(h)).cloned())
    }

    fn max_height(&self) -> ConsensusResult<Option<u64>> {
        let len = self.inner.read().main_chain.len();
        Ok(len.checked_sub(1).map(|h| h as u64))
    }

    fn find_tx(&self, hash: &Hash) -> ConsensusResult<Option<TxLocation>> {
        let inner = self.inner.read();
        Ok(inner
            .txs
            .get(hash)
            .and_then(|(block_hash, index)| inner.blocks.get(block_hash).map(|entry| TxLocation { entry: entry.clone(), index: *index })))
    }

    fn coins_by_tx_hash(&self, hash: &Hash) -> ConsensusResult<Option<Coins>> {
        Ok(self.inner.read().coins.get(hash).cloned())
    }

    fn save_coins_by_tx_hash(&self, hash: &Hash, coins: Coins) -> ConsensusResult<()> {
        let mut inner = self.inner.write();
        let previous = inner.coins.insert(*hash, coins);
        inner.record(Undo::Coins(*hash, previous));
        Ok(())
    }

    fn insert_block(&self, entry: Arc<BlockEntry>, main_chain: bool) -> ConsensusResult<()> {
        let mut inner = self.inner.write();
        if main_chain {
            if entry.height as usize != inner.main_chain.len() {
                return Err(InternalError::Storage(format!(
                    "main-chain insert at height {} but chain length is {}",
                    entry.height,
                    inner.main_chain.len()
                ))
                .into());
            }
            let len = inner.main_chain.len();
            inner.main_chain.push(entry.hash);
            inner.record(Undo::Height(len));
            for (index, tx_id) in entry.tx_ids.iter().enumerate() {
                // first confirmation wins, as with duplicate coinbases on old chains
                if !inner.txs.contains_key(tx_id) {
                    inner.txs.insert(*tx_id, (entry.hash, index));
                    inner.record(Undo::Tx(*tx_id));
                }
            }
        }
        if inner.blocks.insert(entry.hash, entry.clone()).is_none() {
            inner.record(Undo::Block(entry.hash));
        }
        Ok(())
    }

    fn begin(&self) -> ConsensusResult<()> {
        let mut inner = self.inner.write();
        if inner.journal.is_some() {
            return Err(InternalError::Storage("transaction already open".to_string()).into());
        }
        inner.journal = Some(Vec::new());
        Ok(())
    }

    fn commit(&self) -> ConsensusResult<()> {
        let mut inner = self.inner.write();
        match inner.journal.take() {
            Some(_) => Ok(()),
            None => Err(InternalError::Storage("commit without transaction".to_string()).into()),
        }
    }

    fn rollback(&self) -> ConsensusResult<()> {
        let mut inner = self.inner.write();
        let journal = inner
            .journal
            .take()
            .ok_or_else(|| InternalError::Storage("rollback without transaction".to_string()))?;
        for undo in journal.into_iter().rev() {
            match undo {
                Undo::Block(hash) => {
                    inner.blocks.remove(&hash);
                }
                Undo::Height(len) => inner.main_chain.truncate(len),
                Undo::Tx(hash) => {
                    inner.txs.remove(&hash);
                }
                Undo::Coins(hash, Some(previous)) => {
                    inner.coins.insert(hash, previous);
                }
                Undo::Coins(hash, None) => {
                    inner.coins.remove(&hash);
                }
            }
        }
        Ok(())
    }
}
