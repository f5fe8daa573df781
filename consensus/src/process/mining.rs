//! Work items and nonce submission
//!
//! External hash-search backends receive a [`WorkItem`] and return
//! candidate nonces; [`test_and_submit`] re-checks a candidate and feeds the
//! finished block back through ordinary block acceptance.

use crate::consensus::profile::ConsensusProfile;
use crate::consensus::types::BlockAcceptance;
use crate::consensus::validation::Secp256k1Signer;
use crate::pipeline::ConsensusEngine;
use crate::process::coinbase::CoinbaseProcessor;
use consensus_core::{Block, ConsensusError, Hash, Header, ProofType, Target, Transaction};
use log::{debug, info};
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MiningError {
    #[error("Mining is not allowed for {0}")]
    NotAllowed(String),

    #[error("Work item builds on {0}, which is no longer the tip")]
    StaleWork(Hash),

    #[error("Blocks of this chain must be signed")]
    SignerRequired,

    #[error("Signing failed: {0}")]
    Signing(#[from] secp256k1::Error),

    #[error(transparent)]
    Consensus(#[from] ConsensusError),
}

/// A block template waiting for a nonce
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub job_id: u64,
    pub header: Header,
    pub transactions: Vec<Transaction>,
    pub target: Target,
}

impl WorkItem {
    pub fn new(job_id: u64, header: Header, transactions: Vec<Transaction>) -> Result<Self, MiningError> {
        let target = Target::from_compact(header.bits)?;
        Ok(Self { job_id, header, transactions, target })
    }

    /// Work on top of the engine's tip paying the coinbase to `pubkey`
    pub fn for_tip(
        engine: &ConsensusEngine,
        job_id: u64,
        pubkey: &[u8],
        transactions: Vec<Transaction>,
        fees: i64,
        timestamp: u32,
    ) -> Result<Self, MiningError> {
        let profile = engine.profile();
        if !profile.mining_allowed() {
            return Err(MiningError::NotAllowed(profile.params().name.clone()));
        }
        let tip = engine.tip().ok_or(ConsensusError::PrevBlockNotFound(consensus_core::ZERO_HASH))?;
        let bits = engine.next_target(ProofType::Work)?.to_compact();
        let height = tip.height + 1;

        let coinbase = CoinbaseProcessor::new(profile.clone()).create_coinbase_transaction(
            height, timestamp, &tip.hash, bits, fees, pubkey,
        )?;
        let mut txs = Vec::with_capacity(transactions.len() + 1);
        txs.push(coinbase);
        txs.extend(transactions);

        let codec = profile.params().codec();
        let mut header = Header {
            version: profile.default_block_version(),
            prev_block: tip.hash,
            timestamp,
            bits,
            ..Default::default()
        };
        header.merkle_root = Block::new(header, txs.clone(), Vec::new()).compute_merkle_root(&codec);
        Self::new(job_id, header, txs)
    }

    pub fn header_with_nonce(&self, nonce: u32) -> Header {
        Header { nonce, ..self.header }
    }
}

/// Hash-search backend: given a work item, return candidate nonces
pub trait NonceSource {
    fn find_nonces(&mut self, work: &WorkItem, profile: &dyn ConsensusProfile) -> Vec<u32>;
}

/// Single-threaded nonce scan over a fixed range
#[derive(Debug, Clone)]
pub struct CpuNonceSource {
    pub start: u32,
    pub max_iterations: u64,
    /// Stop after this many hits
    pub max_results: usize,
}

impl Default for CpuNonceSource {
    fn default() -> Self {
        Self { start: 0, max_iterations: 1 << 20, max_results: 1 }
    }
}

impl NonceSource for CpuNonceSource {
    fn find_nonces(&mut self, work: &WorkItem, profile: &dyn ConsensusProfile) -> Vec<u32> {
        let started = Instant::now();
        let mut found = Vec::new();
        let mut nonce = self.start;
        let mut iterations = 0u64;
        while iterations < self.max_iterations && found.len() < self.max_results {
            let hash = profile.hash_for_block_id(&work.header_with_nonce(nonce));
            if work.target.is_met_by(&hash) {
                found.push(nonce);
            }
            nonce = nonce.wrapping_add(1);
            iterations += 1;
        }
        self.start = nonce;
        debug!(
            "job {}: {} candidate nonces after {} iterations in {}ms",
            work.job_id,
            found.len(),
            iterations,
            started.elapsed().as_millis()
        );
        found
    }
}

/// Signs the id of a finished block
pub trait BlockSigner {
    fn sign_block(&self, block_id: &Hash) -> Result<Vec<u8>, MiningError>;
}

impl BlockSigner for Secp256k1Signer {
    fn sign_block(&self, block_id: &Hash) -> Result<Vec<u8>, MiningError> {
        Ok(self.sign(block_id)?)
    }
}

/// Re-checks `nonce` against the work target and, when it meets it,
/// submits the finished block to the engine. Returns `None` for a miss.
pub fn test_and_submit(
    engine: &ConsensusEngine,
    signer: Option<&dyn BlockSigner>,
    work: &WorkItem,
    nonce: u32,
) -> Result<Option<BlockAcceptance>, MiningError> {
    let profile = engine.profile();
    if !profile.mining_allowed() {
        return Err(MiningError::NotAllowed(profile.params().name.clone()));
    }
    let header = work.header_with_nonce(nonce);
    let block_id = profile.hash_for_block_id(&header);
    if !work.target.is_met_by(&block_id) {
        debug!("job {}: nonce {} misses the target", work.job_id, nonce);
        return Ok(None);
    }
    match engine.tip() {
        Some(tip) if tip.hash == header.prev_block => {}
        _ => return Err(MiningError::StaleWork(header.prev_block)),
    }

    let signature = if profile.is_proof_of_stake() {
        signer.ok_or(MiningError::SignerRequired)?.sign_block(&block_id)?
    } else {
        Vec::new()
    };
    let acceptance = engine.accept_block(Block::new(header, work.transactions.clone(), signature))?;
    info!("job {} mined block {} at height {}", work.job_id, acceptance.hash, acceptance.height);
    Ok(Some(acceptance))
}
