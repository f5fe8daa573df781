use super::{BlockEntry, ChainStore, TxLocation};
use consensus_core::errors::ConsensusResult;
use consensus_core::{ConsensusError, Hash, InternalError};
use std::sync::Arc;

/// Explicit chain context for ancestor walks.
///
/// Pairs the store with a best-block snapshot taken once, so a walk never
/// observes the tip moving underneath it.
#[derive(Clone)]
pub struct ChainView<'a> {
    store: &'a dyn ChainStore,
    best: Option<Arc<BlockEntry>>,
}

impl<'a> ChainView<'a> {
    pub fn new(store: &'a dyn ChainStore, best: Option<Arc<BlockEntry>>) -> Self {
        Self { store, best }
    }

    pub fn store(&self) -> &'a dyn ChainStore {
        self.store
    }

    pub fn best(&self) -> Option<&Arc<BlockEntry>> {
        self.best.as_ref()
    }

    pub fn best_height(&self) -> Option<u64> {
        self.best.as_ref().map(|b| b.height)
    }

    pub fn is_best(&self, entry: &BlockEntry) -> bool {
        self.best.as_ref().map_or(false, |b| b.hash == entry.hash)
    }

    /// Block the chain already references; absence is a broken invariant
    pub fn block(&self, hash: &Hash) -> ConsensusResult<Arc<BlockEntry>> {
        self.store.find_block(hash)?.ok_or_else(|| InternalError::BrokenAncestry(*hash).into())
    }

    /// Parent of `entry`, `None` for the genesis block
    pub fn prev(&self, entry: &BlockEntry) -> ConsensusResult<Option<Arc<BlockEntry>>> {
        if entry.is_genesis() {
            return Ok(None);
        }
        self.store
            .find_block(&entry.prev_hash())?
            .map(Some)
            .ok_or_else(|| InternalError::BrokenAncestry(entry.hash).into())
    }

    /// Main-chain block at `height`, limited to the snapshot
    pub fn block_at(&self, height: u64) -> ConsensusResult<Arc<BlockEntry>> {
        let within = self.best_height().map_or(false, |best| height <= best);
        if !within {
            return Err(InternalError::Storage(format!("height {} is beyond the chain view", height)).into());
        }
        self.store
            .find_block_by_height(height)?
            .ok_or_else(|| InternalError::Storage(format!("no main-chain block at height {}", height)).into())
    }

    /// Confirmed transaction; absence is an ordinary rejection
    pub fn find_tx(&self, hash: &Hash) -> ConsensusResult<TxLocation> {
        match self.store.find_tx(hash)? {
            Some(loc) if self.best_height().map_or(false, |h| loc.height() <= h) => Ok(loc),
            _ => Err(ConsensusError::TxNotFound(*hash)),
        }
    }

    /// Timestamps of `entry` and up to `count - 1` of its ancestors, newest first
    pub fn recent_timestamps(&self, entry: &Arc<BlockEntry>, count: usize) -> ConsensusResult<Vec<u32>> {
        let mut out = Vec::with_capacity(count);
        let mut cur = Some(entry.clone());
        while let Some(b) = cur {
            if out.len() == count {
                break;
            }
            out.push(b.timestamp());
            cur = self.prev(&b)?;
        }
        Ok(out)
    }

    /// Median of the `span` timestamps ending at `entry`
    pub fn median_time_past(&self, entry: &Arc<BlockEntry>, span: usize) -> ConsensusResult<u32> {
        let mut times = self.recent_timestamps(entry, span.max(1))?;
        times.sort_unstable();
        Ok(times[times.len() / 2])
    }
}
