use super::coin_age::coin_age;
use crate::consensus::profile::ConsensusProfile;
use crate::consensus::storage::ChainView;
use crate::consensus::validation::transaction_validator::{min_fee, value_in, FeeMode};
use consensus_core::errors::ConsensusResult;
use consensus_core::{ChainParams, ConsensusError, Transaction};
use log::debug;

/// Days per year in the 33-day-cycle approximation of the calendar year
const YEAR_NUMERATOR: i128 = 33;
const YEAR_DENOMINATOR: i128 = 365 * 33 + 8;

/// Interest earned by `coin_age` coin-days at the annual percentage rate
pub fn proof_of_stake_reward(params: &ChainParams, coin_age: u64) -> i64 {
    let reward = params.coin_value as i128 * params.annual_percentage_rate as i128 * coin_age as i128 * YEAR_NUMERATOR
        / (100 * YEAR_DENOMINATOR);
    i64::try_from(reward).unwrap_or(i64::MAX)
}

/// Checks that the coinstake claims no more than its stake reward, less the
/// fee it owes, plus the minimum transaction fee.
pub fn check_coinstake_reward(chain: &ChainView, profile: &dyn ConsensusProfile, coinstake: &Transaction) -> ConsensusResult<()> {
    let params = profile.params();
    let value_out = coinstake.value_out().ok_or(ConsensusError::MoneyOutOfRange(i64::MAX))?;
    let claimed = value_out - value_in(chain, coinstake)?;
    let age = coin_age(chain, coinstake, params)?;
    let reward = profile.proof_of_stake_reward(age);
    let fee = min_fee(profile, coinstake, 1, profile.allow_free_txes(), FeeMode::Block);
    let allowed = reward.saturating_sub(fee).saturating_add(params.min_tx_fee);
    debug!("coinstake claims {} of {} allowed ({} coin-days)", claimed, allowed, age);
    if claimed > allowed {
        return Err(ConsensusError::StakeRewardExceeded { claimed, allowed });
    }
    Ok(())
}
