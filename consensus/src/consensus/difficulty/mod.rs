//! Difficulty retargeting.
//!
//! Every currency picks one [`RetargetRule`]; the rule computes the target
//! the block following `last` must carry.

pub mod averaging;
pub mod continuous;
pub mod gravity_well;
pub mod window;

pub use averaging::AveragingSchedule;
pub use window::{DifficultyWindow, WindowSample};

use crate::consensus::storage::{BlockEntry, ChainView};
use consensus_core::errors::ConsensusResult;
use consensus_core::{ChainParams, ProofType, Target};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetargetRule {
    /// Interval retarget, optionally averaged and trimmed after a fork
    Averaging(AveragingSchedule),
    /// Per-block retarget of work and stake targets
    Continuous,
    /// Kimoto gravity well from `fork_height` on, `fallback` below it
    GravityWell { fork_height: u64, min_blocks: u64, max_blocks: u64, fallback: AveragingSchedule },
}

impl RetargetRule {
    pub fn next_target(
        &self,
        params: &ChainParams,
        chain: &ChainView,
        last: &Arc<BlockEntry>,
        candidate: ProofType,
    ) -> ConsensusResult<Target> {
        match self {
            RetargetRule::Averaging(schedule) => averaging::next_target(chain, last, schedule, params),
            RetargetRule::Continuous => continuous::next_target(chain, last, candidate, params),
            RetargetRule::GravityWell { fork_height, min_blocks, max_blocks, fallback } => {
                if last.height + 1 < *fork_height {
                    averaging::next_target(chain, last, fallback, params)
                } else {
                    gravity_well::next_target(chain, last, *min_blocks, *max_blocks, params)
                }
            }
        }
    }
}
