//! Fixed-interval averaging retarget.
//!
//! Retargets once per interval (or every block after a fork), scaling the
//! previous or averaged target by the clamped ratio of actual to expected
//! time span.

use super::window::DifficultyWindow;
use crate::consensus::storage::{BlockEntry, ChainView};
use chain_math::{narrow_saturating, widen, U512};
use consensus_core::constants::SECONDS_PER_DAY;
use consensus_core::errors::ConsensusResult;
use consensus_core::{ChainParams, Target};
use log::debug;
use std::sync::Arc;

/// Outliers dropped from each end of the sorted timestamps
const TRIM: usize = 6;

/// Height-dependent shape of an averaging retarget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AveragingSchedule {
    /// Below this height the previous target is reused unchanged
    pub bootstrap_height: u64,
    /// From this height on the target is recomputed every block
    pub fork_height: Option<u64>,
    /// Expected span in seconds before and after the fork
    pub span_before_fork: u32,
    pub span_after_fork: u32,
    /// Above this height targets are averaged and timestamps trimmed
    pub averaging_height: Option<u64>,
}

impl AveragingSchedule {
    /// Plain two-week retarget on interval boundaries
    pub fn bitcoin() -> Self {
        Self {
            bootstrap_height: 0,
            fork_height: None,
            span_before_fork: 14 * SECONDS_PER_DAY,
            span_after_fork: 14 * SECONDS_PER_DAY,
            averaging_height: None,
        }
    }

    pub fn devcoin() -> Self {
        Self {
            bootstrap_height: 10,
            fork_height: Some(10_700),
            span_before_fork: 14 * SECONDS_PER_DAY,
            span_after_fork: SECONDS_PER_DAY,
            averaging_height: Some(10_800),
        }
    }

    fn before_fork(&self, height: u64) -> bool {
        self.fork_height.map_or(true, |fork| height < fork)
    }

    pub fn target_span(&self, height: u64) -> u32 {
        if self.before_fork(height) {
            self.span_before_fork
        } else {
            self.span_after_fork
        }
    }

    fn averages_at(&self, height: u64) -> bool {
        self.averaging_height.map_or(false, |h| height > h)
    }
}

/// Target required of the block following `last`
pub fn next_target(
    chain: &ChainView,
    last: &Arc<BlockEntry>,
    schedule: &AveragingSchedule,
    params: &ChainParams,
) -> ConsensusResult<Target> {
    let height = last.height;
    let target_span = schedule.target_span(height) as i64;
    let interval = (target_span / params.block_span.max(1) as i64).max(1) as u64;
    if height < schedule.bootstrap_height || (schedule.before_fork(height) && (height + 1) % interval != 0) {
        return last.target();
    }

    let window = DifficultyWindow::collect(chain, last, (interval - 1) as usize)?;
    let mut span = window.time_span();
    let avg = if schedule.averages_at(height) && !window.is_empty() {
        let sum = window.samples().iter().fold(U512::zero(), |acc, s| acc + widen(s.target.as_u256()));
        let mut times = window.timestamps();
        times.sort_unstable();
        let n = times.len();
        if n > 2 * TRIM {
            let factor = ((interval - 1) as usize / (n - 2 * TRIM)) as i64;
            span = (times[n - TRIM] as i64 - times[TRIM] as i64) * factor;
        }
        narrow_saturating(sum / U512::from(n as u64))
    } else {
        last.target()?.as_u256()
    };

    let span = span.clamp(target_span / 4, target_span * 4);
    let scaled = widen(avg) * U512::from(span as u64) / U512::from(target_span.max(1) as u64);
    let next = Target::from_u256(narrow_saturating(scaled)).clamp_to(params.max_target);
    debug!(
        "{} retarget at height {}: span {}s of {}s, target {} -> {}",
        params.name,
        height + 1,
        span,
        target_span,
        last.target()?,
        next
    );
    Ok(next)
}
