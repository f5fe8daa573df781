//! Consensus engine
//!
//! Orchestrates header, block and contextual validation for one currency,
//! persists accepted blocks through the chain store and tracks the best
//! block.

use crate::config::EngineConfig;
use crate::consensus::profile::{ConsensusProfile, ProfileRegistry};
use crate::consensus::stake::{check_proof_of_stake, compute_stake_modifier};
use crate::consensus::storage::{BlockEntry, ChainStore, ChainView};
use crate::consensus::types::{BlockAcceptance, ChainExtension, InboundMessage, MessageOutcome};
use crate::consensus::validation::{
    verify_checkpoint, AdvisoryCheckpoint, BlockValidator, ContextualValidator, HeaderValidator, ScriptVerifier,
    SignatureVerifier,
};
use consensus_core::checkpoint::CheckpointMessage;
use consensus_core::errors::ConsensusResult;
use consensus_core::{
    Block, ChainParams, ConsensusError, Hash, InternalError, ProofType, StakeRecord, Target, Transaction, ZERO_HASH,
};
use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Validation engine of a single currency
pub struct ConsensusEngine {
    config: EngineConfig,
    profile: Arc<dyn ConsensusProfile>,
    store: Arc<dyn ChainStore>,
    signatures: Arc<dyn SignatureVerifier>,
    scripts: Arc<dyn ScriptVerifier>,
    header_validator: HeaderValidator,
    block_validator: BlockValidator,
    contextual_validator: ContextualValidator,
    /// Best-block snapshot; held only while copying it out
    best: RwLock<Option<Arc<BlockEntry>>>,
    /// Serializes block acceptance so the tip cannot move mid-accept
    accept_lock: Mutex<()>,
    checkpoints: Mutex<Vec<AdvisoryCheckpoint>>,
}

impl ConsensusEngine {
    /// Creates an engine for `config.currency` and loads the best block
    /// from `store`
    pub fn new(
        registry: &ProfileRegistry,
        config: EngineConfig,
        store: Arc<dyn ChainStore>,
        signatures: Arc<dyn SignatureVerifier>,
        scripts: Arc<dyn ScriptVerifier>,
    ) -> ConsensusResult<Self> {
        let profile = registry.profile(&config.currency)?;
        let params = profile.params();
        let header_validator = HeaderValidator::with_params(params.median_time_span, config.max_future_seconds);
        let block_validator = BlockValidator::new(profile.clone(), signatures.clone(), scripts.clone());
        let contextual_validator = ContextualValidator::new(profile.clone());

        let best = match store.max_height()? {
            Some(height) => Some(
                store
                    .find_block_by_height(height)?
                    .ok_or_else(|| InternalError::Storage(format!("no main-chain block at max height {}", height)))?,
            ),
            None => None,
        };
        info!(
            "consensus engine for {} starting at height {}",
            params.name,
            best.as_ref().map_or_else(|| "none".to_string(), |b| b.height.to_string())
        );

        Ok(Self {
            config,
            profile,
            store,
            signatures,
            scripts,
            header_validator,
            block_validator,
            contextual_validator,
            best: RwLock::new(best),
            accept_lock: Mutex::new(()),
            checkpoints: Mutex::new(Vec::new()),
        })
    }

    pub fn profile(&self) -> &Arc<dyn ConsensusProfile> {
        &self.profile
    }

    pub fn params(&self) -> &ChainParams {
        self.profile.params()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ChainStore> {
        &self.store
    }

    /// Current best block
    pub fn tip(&self) -> Option<Arc<BlockEntry>> {
        self.best.read().clone()
    }

    /// Chain view over the store with the best block copied out under the lock
    pub fn chain_view(&self) -> ChainView<'_> {
        ChainView::new(self.store.as_ref(), self.tip())
    }

    /// Stores the genesis block with stake modifier 0 and makes it the tip
    pub fn init_genesis(&self, block: Block) -> ConsensusResult<BlockAcceptance> {
        let _guard = self.accept_lock.lock();
        let codec = self.params().codec();
        let hash = block.id(&codec);
        if !block.header().is_genesis() || hash != self.params().genesis {
            return Err(ConsensusError::BadGenesis(hash));
        }
        if self.store.find_block(&hash)?.is_some() {
            return Err(ConsensusError::DuplicateBlock(hash));
        }
        let entry = Arc::new(BlockEntry::new(Arc::new(block), 0, StakeRecord::new(None, Some(0)), &codec));
        self.persist(&entry, true)?;
        *self.best.write() = Some(entry);
        info!("{} genesis block {} initialized", self.params().name, hash);
        Ok(BlockAcceptance { hash, height: 0, extension: ChainExtension::ExtendsBest })
    }

    /// Context-free checks of `block`, plus the kernel of stake blocks
    /// against the current chain
    pub fn check_block(&self, block: &Block, check_merkle_root: bool) -> ConsensusResult<()> {
        self.block_validator.check_block(&self.chain_view(), block, check_merkle_root)
    }

    /// Target a `candidate` block on top of the current tip must carry
    pub fn next_target(&self, candidate: ProofType) -> ConsensusResult<Target> {
        let view = self.chain_view();
        let tip = view.best().cloned().ok_or(ConsensusError::PrevBlockNotFound(ZERO_HASH))?;
        self.profile.next_target(&view, &tip, candidate)
    }

    fn proof_type(&self, block: &Block) -> ProofType {
        if self.profile.is_proof_of_stake() {
            block.proof_type()
        } else {
            ProofType::Work
        }
    }

    /// Validates `block` against its parent and stores it. Blocks on top of
    /// the tip extend the main chain; others are kept as side-chain blocks
    /// after the checks that do not depend on spent-output state.
    pub fn accept_block(&self, block: Block) -> ConsensusResult<BlockAcceptance> {
        let _guard = self.accept_lock.lock();
        let params = self.profile.params();
        let codec = params.codec();
        let hash = block.id(&codec);
        if self.store.find_block(&hash)?.is_some() {
            return Err(ConsensusError::DuplicateBlock(hash));
        }
        let parent = self
            .store
            .find_block(&block.header().prev_block)?
            .ok_or(ConsensusError::PrevBlockNotFound(block.header().prev_block))?;

        let view = self.chain_view();
        let extends_best = view.best().map_or(false, |tip| tip.hash == parent.hash);
        let height = parent.height + 1;
        let proof_type = self.proof_type(&block);

        self.block_validator.check_block(&view, &block, self.config.check_merkle_root)?;

        let header = block.header();
        self.header_validator.validate_future_time(header, HeaderValidator::now())?;
        self.header_validator.validate_median_time(&view, &parent, header)?;
        let required = self.profile.next_target(&view, &parent, proof_type)?;
        self.header_validator.validate_difficulty_bits(header, required)?;
        if proof_type == ProofType::Work {
            let pow_hash = self.profile.hash_for_block_id(header);
            self.header_validator.validate_pow(header, &pow_hash, params.max_target)?;
        }

        if extends_best {
            let fees = self.contextual_validator.validate_block_in_context(&view, &block, height)?;
            debug!("block {} collects {} in fees", hash, fees);
        }

        let stake = match self.profile.block_variant() {
            Some(variant) => {
                let proof_hash = match proof_type {
                    ProofType::Stake => Some(check_proof_of_stake(&view, variant, self.scripts.as_ref(), &block, params)?),
                    ProofType::Work => None,
                };
                StakeRecord::new(proof_hash, compute_stake_modifier(&view, variant, Some(&parent))?)
            }
            None => StakeRecord::default(),
        };

        let entry = Arc::new(BlockEntry::new(Arc::new(block), height, stake, &codec));
        self.persist(&entry, extends_best)?;

        let extension = if extends_best {
            *self.best.write() = Some(entry.clone());
            ChainExtension::ExtendsBest
        } else {
            ChainExtension::SideChain
        };
        info!("accepted {:?} block {} at height {} ({:?})", proof_type, hash, height, extension);
        Ok(BlockAcceptance { hash, height, extension })
    }

    /// Writes `entry` and, for main-chain blocks, its spent-output updates
    /// in one storage transaction
    fn persist(&self, entry: &Arc<BlockEntry>, main_chain: bool) -> ConsensusResult<()> {
        self.store.begin()?;
        let written = self.store.insert_block(entry.clone(), main_chain).and_then(|_| {
            if main_chain {
                self.update_coins(entry)
            } else {
                Ok(())
            }
        });
        match written {
            Ok(()) => self.store.commit(),
            Err(e) => {
                self.store.rollback()?;
                Err(e)
            }
        }
    }

    fn update_coins(&self, entry: &BlockEntry) -> ConsensusResult<()> {
        for (tx, tx_id) in entry.block.transactions().iter().zip(&entry.tx_ids) {
            if !tx.is_coinbase() {
                for input in tx.inputs() {
                    let prev = &input.prev_out;
                    let missing = ConsensusError::MissingOutput { tx: prev.tx_hash, index: prev.index };
                    let mut coins = self.store.coins_by_tx_hash(&prev.tx_hash)?.ok_or_else(|| missing.clone())?;
                    let unspent = coins.get_mut(prev.index as usize).ok_or(missing)?;
                    if !*unspent {
                        return Err(ConsensusError::DoubleSpend { tx: prev.tx_hash, index: prev.index });
                    }
                    *unspent = false;
                    self.store.save_coins_by_tx_hash(&prev.tx_hash, coins)?;
                }
            }
            self.store.save_coins_by_tx_hash(tx_id, vec![true; tx.outputs().len()])?;
        }
        Ok(())
    }

    /// Checks a loose transaction's inputs against the tip; returns its fee
    pub fn check_transaction_inputs(&self, tx: &Transaction) -> ConsensusResult<i64> {
        self.contextual_validator.validate_transaction(&self.chain_view(), tx)
    }

    /// Verifies a raw checkpoint announcement and records it as advisory
    pub fn process_checkpoint(&self, payload: &[u8]) -> ConsensusResult<AdvisoryCheckpoint> {
        let message = CheckpointMessage::decode(payload)?;
        let checkpoint = verify_checkpoint(self.profile.as_ref(), self.signatures.as_ref(), &message)?;
        let mut recorded = self.checkpoints.lock();
        if !recorded.contains(&checkpoint) {
            recorded.push(checkpoint);
            info!("recorded advisory checkpoint {} (version {})", checkpoint.block_hash, checkpoint.version);
        }
        Ok(checkpoint)
    }

    pub fn advisory_checkpoints(&self) -> Vec<AdvisoryCheckpoint> {
        self.checkpoints.lock().clone()
    }

    /// Whether a checkpoint names `hash`
    pub fn is_checkpointed(&self, hash: &Hash) -> bool {
        self.checkpoints.lock().iter().any(|c| c.block_hash == *hash)
    }

    /// Handles one message from the network collaborator
    pub fn process_message(&self, message: InboundMessage) -> MessageOutcome {
        let (kind, result) = match message {
            InboundMessage::Block(block) => ("block", self.accept_block(block).map(|_| ())),
            InboundMessage::Tx(tx) => ("tx", self.check_transaction_inputs(&tx).map(|_| ())),
            InboundMessage::Checkpoint(payload) => ("checkpoint", self.process_checkpoint(&payload).map(|_| ())),
        };
        match result {
            Ok(()) => MessageOutcome::Accepted,
            Err(e) => {
                let outcome = MessageOutcome::from_error(e);
                match &outcome {
                    MessageOutcome::Fatal(e) => error!("{} processing hit broken chain data: {}", kind, e),
                    MessageOutcome::Rejected { reason, misbehavior } => {
                        warn!("rejected {}: {} (misbehavior +{})", kind, reason, misbehavior)
                    }
                    MessageOutcome::Accepted => {}
                }
                outcome
            }
        }
    }
}
