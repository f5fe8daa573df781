//! Kimoto gravity well retarget.
//!
//! Walks back over a variable-length window and stops as soon as the
//! observed block rate leaves an "event horizon" that narrows as more
//! blocks are examined.

use crate::consensus::storage::{BlockEntry, ChainView};
use chain_math::{narrow_saturating, running_average_step, widen, U256, U512};
use consensus_core::errors::ConsensusResult;
use consensus_core::{ChainParams, Target};
use log::debug;
use std::sync::Arc;

/// Allowed deviation of the block rate after examining `mass` blocks
pub fn event_horizon_deviation(mass: u64) -> f64 {
    1.0 + 0.7084 * (mass as f64 / 144.0).powf(-1.228)
}

pub fn next_target(
    chain: &ChainView,
    last: &Arc<BlockEntry>,
    min_blocks: u64,
    max_blocks: u64,
    params: &ChainParams,
) -> ConsensusResult<Target> {
    if last.height == 0 || last.height < min_blocks {
        return Ok(params.max_target);
    }

    let spacing = params.block_span as i64;
    let mut mass: u64 = 0;
    let mut average = U256::zero();
    let mut actual: i64 = 0;
    let mut expected: i64 = 0;

    let mut reading = last.clone();
    let mut i: u64 = 1;
    while reading.height > 0 {
        if max_blocks > 0 && i > max_blocks {
            break;
        }
        mass += 1;
        let target = reading.target()?.as_u256();
        average = if i == 1 { target } else { running_average_step(average, target, i) };

        actual = (last.timestamp() as i64 - reading.timestamp() as i64).max(0);
        expected = spacing * mass as i64;
        let ratio = if actual != 0 && expected != 0 { expected as f64 / actual as f64 } else { 1.0 };

        let fast = event_horizon_deviation(mass);
        let slow = 1.0 / fast;
        if mass >= min_blocks && (ratio <= slow || ratio >= fast) {
            break;
        }
        match chain.prev(&reading)? {
            Some(prev) => reading = prev,
            None => break,
        }
        i += 1;
    }

    let mut next = widen(average);
    if actual != 0 && expected != 0 {
        next = next * U512::from(actual as u64) / U512::from(expected as u64);
    }
    let next = Target::from_u256(narrow_saturating(next)).clamp_to(params.max_target);
    debug!(
        "gravity well after height {}: {} blocks, {}s actual of {}s expected, target {}",
        last.height, mass, actual, expected, next
    );
    Ok(next)
}
