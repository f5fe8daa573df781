//! Block validation for consensus
//!
//! This module validates complete blocks including:
//! - Block structure and size
//! - Coinbase and coinstake placement
//! - Merkle root
//! - Coinstake timestamp and kernel for stake blocks
//! - Block signature

use super::signature::{check_block_signature, ScriptVerifier, SignatureVerifier};
use super::transaction_validator::TransactionValidator;
use crate::consensus::profile::ConsensusProfile;
use crate::consensus::stake::check_proof_of_stake;
use crate::consensus::storage::ChainView;
use consensus_core::constants::{COINBASE_TRANSACTION_INDEX, COINSTAKE_TRANSACTION_INDEX, MAX_BLOCK_SIZE, MAX_FUTURE_SECONDS};
use consensus_core::errors::ConsensusResult;
use consensus_core::{Block, ConsensusError, TxFormat};
use std::sync::Arc;

/// Block validator for consensus rules
pub struct BlockValidator {
    profile: Arc<dyn ConsensusProfile>,
    signatures: Arc<dyn SignatureVerifier>,
    scripts: Arc<dyn ScriptVerifier>,
    transaction_validator: TransactionValidator,
}

impl BlockValidator {
    pub fn new(
        profile: Arc<dyn ConsensusProfile>,
        signatures: Arc<dyn SignatureVerifier>,
        scripts: Arc<dyn ScriptVerifier>,
    ) -> Self {
        let transaction_validator = TransactionValidator::new(profile.params());
        Self { profile, signatures, scripts, transaction_validator }
    }

    pub fn transaction_validator(&self) -> &TransactionValidator {
        &self.transaction_validator
    }

    /// Full context-free validation plus, for stake blocks, the kernel check
    /// against `chain`
    pub fn check_block(&self, chain: &ChainView, block: &Block, check_merkle_root: bool) -> ConsensusResult<()> {
        let params = self.profile.params();
        let codec = params.codec();

        self.validate_block_structure(block)?;
        self.validate_coinbase(block)?;

        if check_merkle_root && block.compute_merkle_root(&codec) != block.header().merkle_root {
            return Err(ConsensusError::BadMerkleRoot);
        }

        let timestamped = params.tx_format == TxFormat::Timestamped;
        for tx in block.transactions() {
            self.transaction_validator.validate_transaction(tx)?;
            if timestamped && block.header().timestamp < tx.time() {
                return Err(ConsensusError::TimestampViolation);
            }
        }

        let Some(variant) = self.profile.block_variant() else {
            return Ok(());
        };

        if let Some(index) = block.transactions().iter().skip(2).position(|tx| tx.is_coinstake()) {
            return Err(ConsensusError::CoinstakeInWrongPosition(index + 2));
        }
        let coinbase = &block.transactions()[COINBASE_TRANSACTION_INDEX];
        if block.header().timestamp as u64 > coinbase.time() as u64 + MAX_FUTURE_SECONDS as u64 {
            return Err(ConsensusError::CoinbaseTimestampTooEarly);
        }

        if block.is_proof_of_stake() {
            if coinbase.outputs().len() != 1 || !coinbase.outputs()[0].is_empty() {
                return Err(ConsensusError::BadCoinbase);
            }
            let coinstake = &block.transactions()[COINSTAKE_TRANSACTION_INDEX];
            variant.check_coinstake_timestamp(block.header().timestamp, coinstake.time())?;
            check_proof_of_stake(chain, variant, self.scripts.as_ref(), block, params)?;
        }

        check_block_signature(self.signatures.as_ref(), block, &block.id(&codec))
    }

    /// Validate block structure
    fn validate_block_structure(&self, block: &Block) -> ConsensusResult<()> {
        if block.transactions().is_empty() {
            return Err(ConsensusError::EmptyTransactionList);
        }
        let size = block.serialized_size(&self.profile.params().codec());
        if size > MAX_BLOCK_SIZE {
            return Err(ConsensusError::OversizedBlock(size));
        }
        Ok(())
    }

    /// First transaction is the only coinbase
    pub fn validate_coinbase(&self, block: &Block) -> ConsensusResult<()> {
        let first = block.transactions().first().ok_or(ConsensusError::EmptyTransactionList)?;
        if !first.is_coinbase() {
            return Err(ConsensusError::BadCoinbase);
        }
        if block.transactions()[1..].iter().any(|tx| tx.is_coinbase()) {
            return Err(ConsensusError::BadCoinbase);
        }
        Ok(())
    }
}
