//! Block-level rules that differ between proof-of-stake protocol versions.

use super::modifier::SELECTION_INTERVAL;
use crate::consensus::storage::{BlockEntry, ChainView};
use consensus_core::errors::ConsensusResult;
use consensus_core::ConsensusError;
use crypto_hashes::hash160;
use std::sync::Arc;

/// Protocol-version hooks of a proof-of-stake chain
pub trait BlockVariant: Send + Sync {
    /// Coinstake timestamp against the timestamp of its block
    fn check_coinstake_timestamp(&self, block_time: u32, tx_time: u32) -> ConsensusResult<()> {
        if block_time != tx_time {
            return Err(ConsensusError::TimestampViolation);
        }
        Ok(())
    }

    /// Writes the modifier part of the kernel hash input for a coinstake
    /// spending an output confirmed in `spent`
    fn write_kernel_modifier(
        &self,
        chain: &ChainView,
        spent: &Arc<BlockEntry>,
        _bits: u32,
        _tx_time: u32,
        out: &mut Vec<u8>,
    ) -> ConsensusResult<()> {
        let modifier = kernel_stake_modifier(chain, spent)?;
        out.extend_from_slice(&modifier.to_le_bytes());
        Ok(())
    }

    /// Entropy bit the block contributes to modifier selection
    fn stake_entropy_bit(&self, entry: &BlockEntry) -> u64 {
        entry.hash.low_u64() & 1
    }
}

/// Current-protocol rules with no version switches
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPosBlock;

impl BlockVariant for StandardPosBlock {}

/// Modifier of the first main-chain block at or after `spent` whose
/// timestamp clears the selection interval. Reaching the best block first
/// means the output cannot stake yet.
pub fn kernel_stake_modifier(chain: &ChainView, spent: &Arc<BlockEntry>) -> ConsensusResult<u64> {
    let best = chain.best_height().ok_or(ConsensusError::CoinstakeCheckTargetFailed)?;
    let deadline = spent.timestamp() as i64 + *SELECTION_INTERVAL;
    let mut modifier = spent.stake.stake_modifier.unwrap_or_default();
    let mut modifier_time = spent.timestamp() as i64;
    let mut height = spent.height;
    while modifier_time < deadline {
        if height >= best {
            return Err(ConsensusError::CoinstakeCheckTargetFailed);
        }
        height += 1;
        let entry = chain.block_at(height)?;
        if let Some(m) = entry.stake.stake_modifier {
            modifier = m;
            modifier_time = entry.timestamp() as i64;
        }
    }
    Ok(modifier)
}

/// Version switches of the PPCoin protocol, keyed by timestamp
#[derive(Debug, Clone, Copy)]
pub struct PPCoinBlock {
    /// Start of protocol v0.3 (2013-03-20 17:20 UTC)
    pub v03_switch: u32,
    /// Start of protocol v0.4 (2014-05-05 14:26:40 UTC)
    pub v04_switch: u32,
    /// Clock drift tolerated between a v0.2 coinstake and its block
    pub max_clock_drift: u32,
}

impl Default for PPCoinBlock {
    fn default() -> Self {
        Self { v03_switch: 1_363_800_000, v04_switch: 1_399_300_000, max_clock_drift: 2 * 60 * 60 }
    }
}

impl BlockVariant for PPCoinBlock {
    fn check_coinstake_timestamp(&self, block_time: u32, tx_time: u32) -> ConsensusResult<()> {
        let ok = if tx_time >= self.v03_switch {
            block_time == tx_time
        } else {
            tx_time <= block_time && block_time as u64 <= tx_time as u64 + self.max_clock_drift as u64
        };
        if !ok {
            return Err(ConsensusError::TimestampViolation);
        }
        Ok(())
    }

    fn write_kernel_modifier(
        &self,
        chain: &ChainView,
        spent: &Arc<BlockEntry>,
        bits: u32,
        tx_time: u32,
        out: &mut Vec<u8>,
    ) -> ConsensusResult<()> {
        if tx_time >= self.v03_switch {
            let modifier = kernel_stake_modifier(chain, spent)?;
            out.extend_from_slice(&modifier.to_le_bytes());
        } else {
            out.extend_from_slice(&bits.to_le_bytes());
        }
        Ok(())
    }

    fn stake_entropy_bit(&self, entry: &BlockEntry) -> u64 {
        if entry.timestamp() >= self.v04_switch {
            entry.hash.low_u64() & 1
        } else {
            (hash160(entry.block.signature())[19] >> 7) as u64
        }
    }
}
