use super::ConsensusProfile;
use crate::consensus::difficulty::{AveragingSchedule, RetargetRule};
use consensus_core::config::params::TxFormat;
use consensus_core::{ChainParams, Hash, HashAlgo, Target};

const COIN: i64 = 100_000_000;
const BLOCK_VERSION: i32 = 112;
/// First block retargeted by the gravity well
const GRAVITY_WELL_HEIGHT: u64 = 199;
/// History examined by the gravity well, in seconds
const GRAVITY_WELL_MIN_PAST: u64 = 24 * 60 * 60 / 100;
/// Day-based like the minimum: 403 blocks at 30 s. MaxCoin's reference client
/// computes `hours(1) / 100 * 14`, 504 s or 16 blocks, which falls below the
/// 28-block minimum.
const GRAVITY_WELL_MAX_PAST: u64 = 24 * 60 * 60 / 100 * 14;

/// The genesis hash is not shipped and must come from configuration
pub(super) fn params() -> ChainParams {
    let limit = Target::from_u256(chain_math::U256::from(0xffffu64) << 208);
    ChainParams {
        name: "MaxCoin".into(),
        symbol: "MAX".into(),
        genesis: Hash::zeroed(),
        block_span: 30,
        coin_value: COIN,
        max_money: 100_000_000 * COIN,
        min_tx_fee: 10_000,
        init_block_value: 96 * COIN,
        half_life: 1_051_200,
        coinbase_maturity: 100,
        annual_percentage_rate: 0,
        max_target: limit,
        max_target_stake: limit,
        init_target: limit,
        target_spacing_work_max: 30,
        pow_of_difficulty_to_half_subsidy: 0.0,
        median_time_span: 11,
        message_hash: HashAlgo::Sha256,
        block_hash: HashAlgo::Keccak256,
        tx_format: TxFormat::Plain,
        checkpoint_master_pubkey: String::new(),
    }
}

/// Keccak-256 proof-of-work retargeted by the Kimoto gravity well
pub struct MaxCoinProfile {
    params: ChainParams,
}

impl MaxCoinProfile {
    pub fn new() -> Self {
        Self::with_params(params())
    }

    pub fn with_params(params: ChainParams) -> Self {
        Self { params }
    }
}

impl Default for MaxCoinProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsensusProfile for MaxCoinProfile {
    fn params(&self) -> &ChainParams {
        &self.params
    }

    fn retarget_rule(&self) -> RetargetRule {
        let span = self.params.block_span.max(1) as u64;
        RetargetRule::GravityWell {
            fork_height: GRAVITY_WELL_HEIGHT,
            min_blocks: GRAVITY_WELL_MIN_PAST / span,
            max_blocks: GRAVITY_WELL_MAX_PAST / span,
            fallback: AveragingSchedule::bitcoin(),
        }
    }

    fn default_block_version(&self) -> i32 {
        BLOCK_VERSION
    }

    fn mining_allowed(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consensus_core::Header;

    #[test]
    fn gravity_well_window_in_blocks() {
        match MaxCoinProfile::new().retarget_rule() {
            RetargetRule::GravityWell { fork_height, min_blocks, max_blocks, .. } => {
                assert_eq!(fork_height, 199);
                assert_eq!(min_blocks, 28);
                assert_eq!(max_blocks, 403);
            }
            other => panic!("unexpected rule {:?}", other),
        }
    }

    #[test]
    fn block_id_uses_keccak() {
        let profile = MaxCoinProfile::new();
        let header = Header { version: BLOCK_VERSION, ..Default::default() };
        let id = profile.hash_for_block_id(&header);
        assert_eq!(id, HashAlgo::Keccak256.digest(&header.encode()));
        assert_ne!(id, HashAlgo::Sha256d.digest(&header.encode()));
        assert!(!profile.mining_allowed());
    }
}
