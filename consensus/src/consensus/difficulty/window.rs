//! Difficulty window management
//!
//! Collects the recent history a retarget looks at: timestamps and
//! expanded targets of consecutive ancestors.

use crate::consensus::storage::{BlockEntry, ChainView};
use consensus_core::errors::ConsensusResult;
use consensus_core::Target;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSample {
    pub height: u64,
    pub timestamp: u32,
    pub target: Target,
}

/// Difficulty window for adjustment calculations
#[derive(Debug, Clone)]
pub struct DifficultyWindow {
    /// Newest first
    samples: Vec<WindowSample>,
    /// Block reached after the last step back
    anchor: Arc<BlockEntry>,
}

impl DifficultyWindow {
    /// Walks `steps` blocks back from `last`, sampling each visited block.
    /// The walk stops early at the genesis block, which then serves as the
    /// anchor.
    pub fn collect(chain: &ChainView, last: &Arc<BlockEntry>, steps: usize) -> ConsensusResult<Self> {
        let mut samples = Vec::with_capacity(steps);
        let mut cur = last.clone();
        for _ in 0..steps {
            samples.push(WindowSample { height: cur.height, timestamp: cur.timestamp(), target: cur.target()? });
            match chain.prev(&cur)? {
                Some(prev) => cur = prev,
                None => break,
            }
        }
        Ok(Self { samples, anchor: cur })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[WindowSample] {
        &self.samples
    }

    pub fn anchor(&self) -> &Arc<BlockEntry> {
        &self.anchor
    }

    /// Timestamps of the sampled blocks, newest first
    pub fn timestamps(&self) -> Vec<u32> {
        self.samples.iter().map(|s| s.timestamp).collect()
    }

    /// Seconds between the anchor and the newest sample; may be negative
    pub fn time_span(&self) -> i64 {
        match self.samples.first() {
            Some(newest) => newest.timestamp as i64 - self.anchor.timestamp() as i64,
            None => 0,
        }
    }
}
