//! Header validation for consensus
//!
//! This module validates block headers against their parent including:
//! - Proof of work
//! - Timestamp window (median time past, future drift)
//! - Required difficulty bits

use crate::consensus::storage::{BlockEntry, ChainView};
use consensus_core::constants::MAX_FUTURE_SECONDS;
use consensus_core::errors::ConsensusResult;
use consensus_core::{ConsensusError, Hash, Header, Target};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Header validator for consensus rules
pub struct HeaderValidator {
    max_future_seconds: u32,
    median_time_span: usize,
}

impl HeaderValidator {
    pub fn new(median_time_span: usize) -> Self {
        Self { max_future_seconds: MAX_FUTURE_SECONDS, median_time_span }
    }

    pub fn with_params(median_time_span: usize, max_future_seconds: u32) -> Self {
        Self { max_future_seconds, median_time_span }
    }

    /// Seconds since the epoch on the local clock
    pub fn now() -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
    }

    /// Rejects headers too far ahead of `now`
    pub fn validate_future_time(&self, header: &Header, now: u64) -> ConsensusResult<()> {
        if header.timestamp as u64 > now + self.max_future_seconds as u64 {
            return Err(ConsensusError::TimeTooNew);
        }
        Ok(())
    }

    /// Header time must be later than the median of the recent ancestors
    pub fn validate_median_time(&self, chain: &ChainView, parent: &Arc<BlockEntry>, header: &Header) -> ConsensusResult<()> {
        let median = chain.median_time_past(parent, self.median_time_span)?;
        if header.timestamp <= median {
            return Err(ConsensusError::TimeTooOld);
        }
        Ok(())
    }

    pub fn validate_difficulty_bits(&self, header: &Header, required: Target) -> ConsensusResult<()> {
        let expected = required.to_compact();
        if header.bits != expected {
            return Err(ConsensusError::BadDifficultyBits { expected, found: header.bits });
        }
        Ok(())
    }

    /// Block id must meet the header's own target, which may not be easier
    /// than the work ceiling
    pub fn validate_pow(&self, header: &Header, block_id: &Hash, max_target: Target) -> ConsensusResult<()> {
        let target = Target::from_compact(header.bits)?;
        if target > max_target {
            return Err(ConsensusError::BadTargetBits(header.bits));
        }
        if !target.is_met_by(block_id) {
            return Err(ConsensusError::InvalidProofOfWork);
        }
        Ok(())
    }
}
