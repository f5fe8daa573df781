use crate::consensus::storage::ChainView;
use consensus_core::constants::{SECONDS_PER_DAY, STAKE_MIN_AGE};
use consensus_core::errors::ConsensusResult;
use consensus_core::{ChainParams, ConsensusError, Transaction};

/// Coin age of `tx` in coin-days, memoized on the transaction.
///
/// Inputs whose spent output was confirmed less than the minimum stake age
/// before `tx` do not count. A coinbase has no coin age.
pub fn coin_age(chain: &ChainView, tx: &Transaction, params: &ChainParams) -> ConsensusResult<u64> {
    tx.coin_age_with(|| compute_coin_age(chain, tx, params))
}

fn compute_coin_age(chain: &ChainView, tx: &Transaction, params: &ChainParams) -> ConsensusResult<u64> {
    if tx.is_coinbase() {
        return Ok(0);
    }
    let cent = params.cent().max(1) as u128;
    let mut cent_seconds: u128 = 0;
    for input in tx.inputs() {
        let loc = chain.find_tx(&input.prev_out.tx_hash)?;
        let prev = loc.tx();
        if tx.time() < prev.time() {
            return Err(ConsensusError::TimestampViolation);
        }
        let output = prev.outputs().get(input.prev_out.index as usize).ok_or(ConsensusError::MissingOutput {
            tx: input.prev_out.tx_hash,
            index: input.prev_out.index,
        })?;
        if loc.entry.timestamp() as u64 + STAKE_MIN_AGE as u64 > tx.time() as u64 {
            continue;
        }
        let held = (tx.time() - prev.time()) as u128;
        cent_seconds += output.value.max(0) as u128 * held / cent;
    }
    let coin_days = cent_seconds / (100 * SECONDS_PER_DAY as u128);
    Ok(u64::try_from(coin_days).unwrap_or(u64::MAX))
}
