//! Per-block continuous retarget for hybrid proof-of-work / proof-of-stake
//! chains. Work and stake blocks are retargeted independently, each from
//! the two most recent blocks of its own type.

use crate::consensus::storage::{BlockEntry, ChainView};
use chain_math::{narrow_saturating, widen, U512};
use consensus_core::constants::{STAKE_TARGET_SPACING, STAKE_TARGET_TIMESPAN};
use consensus_core::errors::ConsensusResult;
use consensus_core::{ChainParams, ProofType, Target};
use log::debug;
use std::sync::Arc;

/// Nearest block at or below `from` carrying `proof_type`
fn last_of_type(
    chain: &ChainView,
    from: Option<Arc<BlockEntry>>,
    proof_type: ProofType,
) -> ConsensusResult<Option<Arc<BlockEntry>>> {
    let mut cur = from;
    while let Some(entry) = cur {
        if entry.proof_type() == proof_type {
            return Ok(Some(entry));
        }
        cur = chain.prev(&entry)?;
    }
    Ok(None)
}

/// Target ceiling for a block of the given type
pub fn target_limit(params: &ChainParams, proof_type: ProofType) -> Target {
    match proof_type {
        ProofType::Stake => params.max_target_stake,
        ProofType::Work => params.max_target,
    }
}

pub fn next_target(
    chain: &ChainView,
    last: &Arc<BlockEntry>,
    proof_type: ProofType,
    params: &ChainParams,
) -> ConsensusResult<Target> {
    let prev = match last_of_type(chain, Some(last.clone()), proof_type)? {
        Some(prev) => prev,
        None => return Ok(params.init_target),
    };
    let prev_prev = match last_of_type(chain, chain.prev(&prev)?, proof_type)? {
        Some(pp) if !pp.is_genesis() => pp,
        _ => return Ok(params.init_target),
    };

    let spacing: i64 = match proof_type {
        ProofType::Stake => STAKE_TARGET_SPACING as i64,
        ProofType::Work => {
            let adaptive = STAKE_TARGET_SPACING as i64 * (last.height - prev.height + 1) as i64;
            adaptive.min(params.target_spacing_work_max.max(1) as i64)
        }
    };
    let interval = STAKE_TARGET_TIMESPAN as i64 / spacing;
    let actual = prev.timestamp() as i64 - prev_prev.timestamp() as i64;

    let numerator = spacing * (interval - 1) + 2 * actual;
    let denominator = spacing * (interval + 1);
    let limit = target_limit(params, proof_type);
    let next = if numerator <= 0 {
        Target::HARDEST
    } else {
        let scaled = widen(prev.target()?.as_u256()) * U512::from(numerator as u64) / U512::from(denominator as u64);
        Target::from_u256(narrow_saturating(scaled)).clamp_to(limit)
    };
    debug!(
        "{:?} retarget after height {}: spacing {}s, actual {}s, target {} -> {}",
        proof_type,
        last.height,
        spacing,
        actual,
        prev.target()?,
        next
    );
    Ok(next)
}
