//! Storage collaborator interface.
//!
//! The engine never touches a storage engine directly: it reads and writes
//! blocks, the transaction index and spent-output bitmaps through
//! [`ChainStore`], and walks ancestry through a [`ChainView`] snapshot.

pub mod chain_view;
pub mod memory_store;

pub use chain_view::ChainView;
pub use memory_store::MemoryChainStore;

use consensus_core::errors::ConsensusResult;
use consensus_core::{Block, ChainCodec, ConsensusError, Hash, ProofType, StakeRecord, Target, Transaction};
use std::sync::Arc;

/// Per-output spent state of one transaction; `true` means unspent
pub type Coins = Vec<bool>;

/// A block as persisted, together with its derived chain data
#[derive(Debug, Clone)]
pub struct BlockEntry {
    pub hash: Hash,
    pub height: u64,
    pub block: Arc<Block>,
    pub tx_ids: Vec<Hash>,
    pub stake: StakeRecord,
}

impl BlockEntry {
    pub fn new(block: Arc<Block>, height: u64, stake: StakeRecord, codec: &ChainCodec) -> Self {
        let hash = block.id(codec);
        let tx_ids = block.transactions().iter().map(|tx| tx.id(codec)).collect();
        Self { hash, height, block, tx_ids, stake }
    }

    pub fn timestamp(&self) -> u32 {
        self.block.header().timestamp
    }

    pub fn bits(&self) -> u32 {
        self.block.header().bits
    }

    pub fn target(&self) -> ConsensusResult<Target> {
        Target::from_compact(self.bits())
    }

    pub fn prev_hash(&self) -> Hash {
        self.block.header().prev_block
    }

    pub fn is_genesis(&self) -> bool {
        self.block.header().is_genesis()
    }

    pub fn proof_type(&self) -> ProofType {
        self.block.proof_type()
    }

    /// Proof hash used by stake modifier selection: the kernel hash for
    /// stake blocks, the block id otherwise
    pub fn proof_hash(&self) -> ConsensusResult<Hash> {
        match self.proof_type() {
            ProofType::Work => Ok(self.hash),
            ProofType::Stake => self.stake.proof_of_stake_hash.ok_or_else(|| {
                ConsensusError::from(consensus_core::InternalError::Storage(format!(
                    "stake block {} stored without proof-of-stake hash",
                    self.hash
                )))
            }),
        }
    }
}

/// A confirmed transaction and where it lives
#[derive(Debug, Clone)]
pub struct TxLocation {
    pub entry: Arc<BlockEntry>,
    pub index: usize,
}

impl TxLocation {
    pub fn tx(&self) -> &Transaction {
        &self.entry.block.transactions()[self.index]
    }

    pub fn height(&self) -> u64 {
        self.entry.height
    }

    pub fn hash(&self) -> Hash {
        self.entry.tx_ids[self.index]
    }
}

/// Block and transaction persistence consumed by the engine.
///
/// Lookups are fail-fast: a missing object is `Ok(None)` and the engine maps
/// it to the matching rejection. Failures of the storage itself surface as
/// internal errors.
pub trait ChainStore: Send + Sync {
    fn find_block(&self, hash: &Hash) -> ConsensusResult<Option<Arc<BlockEntry>>>;

    /// Main-chain block at `height`
    fn find_block_by_height(&self, height: u64) -> ConsensusResult<Option<Arc<BlockEntry>>>;

    /// Height of the main-chain tip, `None` while the store is empty
    fn max_height(&self) -> ConsensusResult<Option<u64>>;

    /// Main-chain transaction by id
    fn find_tx(&self, hash: &Hash) -> ConsensusResult<Option<TxLocation>>;

    fn coins_by_tx_hash(&self, hash: &Hash) -> ConsensusResult<Option<Coins>>;

    fn save_coins_by_tx_hash(&self, hash: &Hash, coins: Coins) -> ConsensusResult<()>;

    /// Stores a block; main-chain blocks are also indexed by height and
    /// their transactions by id
    fn insert_block(&self, entry: Arc<BlockEntry>, main_chain: bool) -> ConsensusResult<()>;

    fn begin(&self) -> ConsensusResult<()>;

    fn commit(&self) -> ConsensusResult<()>;

    fn rollback(&self) -> ConsensusResult<()>;
}
