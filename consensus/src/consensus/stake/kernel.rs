//! Kernel hash verification of proof-of-stake blocks.

use super::variant::BlockVariant;
use crate::consensus::storage::ChainView;
use crate::consensus::validation::signature::ScriptVerifier;
use chain_math::{widen, U256, U512};
use consensus_core::constants::{COINSTAKE_TRANSACTION_INDEX, SECONDS_PER_DAY, STAKE_MAX_AGE, STAKE_MIN_AGE};
use consensus_core::errors::ConsensusResult;
use consensus_core::{Block, ChainCodec, ChainParams, ConsensusError, Hash, InternalError, Target};
use crypto_hashes::double_sha256;
use log::debug;

/// Coin-days weighting the kernel target, holding time capped at the
/// maximum stake age
pub fn coin_day_weight(value: i64, held_seconds: u32, params: &ChainParams) -> U256 {
    let held = held_seconds.min(STAKE_MAX_AGE) as u128;
    let weight = value.max(0) as u128 * held / (SECONDS_PER_DAY as u128 * params.coin_value.max(1) as u128);
    U256::from(weight)
}

/// Whether `proof` meets `target` scaled by `weight`
pub fn meets_weighted_target(proof: &Hash, target: Target, weight: U256) -> bool {
    let proof = widen(U256::from_little_endian(proof.as_bytes()));
    proof <= widen(target.as_u256()) * U512::from(weight)
}

/// Verifies the coinstake kernel of `block` and returns its proof-of-stake
/// hash, memoized on the block.
pub fn check_proof_of_stake(
    chain: &ChainView,
    variant: &dyn BlockVariant,
    scripts: &dyn ScriptVerifier,
    block: &Block,
    params: &ChainParams,
) -> ConsensusResult<Hash> {
    block.proof_of_stake_hash_with(|| compute_proof_of_stake(chain, variant, scripts, block, params))
}

fn compute_proof_of_stake(
    chain: &ChainView,
    variant: &dyn BlockVariant,
    scripts: &dyn ScriptVerifier,
    block: &Block,
    params: &ChainParams,
) -> ConsensusResult<Hash> {
    let codec: ChainCodec = params.codec();
    let tx = block
        .transactions()
        .get(COINSTAKE_TRANSACTION_INDEX)
        .filter(|tx| tx.is_coinstake())
        .ok_or(ConsensusError::CoinstakeInWrongPosition(COINSTAKE_TRANSACTION_INDEX))?;
    let kernel = &tx.inputs()[0].prev_out;
    let loc = chain.find_tx(&kernel.tx_hash)?;
    let prev = loc.tx();
    if !scripts.verify_input(prev, tx, 0) {
        return Err(ConsensusError::ScriptVerifyFailed(0));
    }
    if tx.time() < prev.time() {
        return Err(ConsensusError::TimestampViolation);
    }
    let spent = &loc.entry;
    if spent.timestamp() as u64 + STAKE_MIN_AGE as u64 > tx.time() as u64 {
        return Err(ConsensusError::CoinsAreTooRecent);
    }
    let output = prev
        .outputs()
        .get(kernel.index as usize)
        .ok_or(ConsensusError::MissingOutput { tx: kernel.tx_hash, index: kernel.index })?;
    let offset = spent
        .block
        .tx_offset(&kernel.tx_hash, &codec)
        .ok_or_else(|| InternalError::Storage(format!("transaction {} missing from block {}", kernel.tx_hash, spent.hash)))?;

    let mut input = Vec::with_capacity(28);
    variant.write_kernel_modifier(chain, spent, block.header().bits, tx.time(), &mut input)?;
    input.extend_from_slice(&spent.timestamp().to_le_bytes());
    input.extend_from_slice(&offset.to_le_bytes());
    input.extend_from_slice(&prev.time().to_le_bytes());
    input.extend_from_slice(&kernel.index.to_le_bytes());
    input.extend_from_slice(&tx.time().to_le_bytes());
    let proof = Hash::from_bytes(double_sha256(&input));

    let target = Target::from_compact(block.header().bits)?;
    let weight = coin_day_weight(output.value, tx.time() - prev.time(), params);
    if !meets_weighted_target(&proof, target, weight) {
        debug!("kernel {} misses target {} weighted by {} coin-days", proof, target, weight);
        return Err(ConsensusError::CoinstakeCheckTargetFailed);
    }
    Ok(proof)
}
