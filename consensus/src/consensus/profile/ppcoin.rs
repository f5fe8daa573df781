use super::ConsensusProfile;
use crate::consensus::difficulty::RetargetRule;
use crate::consensus::stake::{BlockVariant, PPCoinBlock};
use consensus_core::config::params::TxFormat;
use consensus_core::{ChainParams, Hash, HashAlgo, Target};

const COIN: i64 = 1_000_000;

/// Compact targets in expanded form; the compact forms are 0x1d00ffff,
/// 0x1e00ffff and 0x1c00ffff
fn expanded(mantissa: u64, shift: usize) -> Target {
    Target::from_u256(chain_math::U256::from(mantissa) << shift)
}

/// The checkpoint master key is not shipped and must come from configuration
pub(super) fn params() -> ChainParams {
    ChainParams {
        name: "PPCoin".into(),
        symbol: "PPC".into(),
        genesis: Hash::from_le_u64([0xfd7eb1c880cd27e3, 0xd8957e87c508eaa4, 0x66d54963b62a4677, 0x0000000032fe6771]),
        block_span: 600,
        coin_value: COIN,
        max_money: 2_000_000_000 * COIN,
        min_tx_fee: 10_000,
        init_block_value: 9_999 * COIN,
        half_life: 0,
        coinbase_maturity: 500,
        annual_percentage_rate: 1,
        max_target: expanded(0xffff, 208),
        max_target_stake: expanded(0xffff, 216),
        init_target: expanded(0xffff, 200),
        target_spacing_work_max: 2 * 60 * 60,
        pow_of_difficulty_to_half_subsidy: 0.25,
        median_time_span: 11,
        message_hash: HashAlgo::Sha256d,
        block_hash: HashAlgo::Sha256d,
        tx_format: TxFormat::Timestamped,
        checkpoint_master_pubkey: String::new(),
    }
}

/// Hybrid proof-of-work / proof-of-stake
pub struct PPCoinProfile {
    params: ChainParams,
    variant: PPCoinBlock,
}

impl PPCoinProfile {
    pub fn new() -> Self {
        Self::with_params(params())
    }

    pub fn with_params(params: ChainParams) -> Self {
        Self { params, variant: PPCoinBlock::default() }
    }
}

impl Default for PPCoinProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsensusProfile for PPCoinProfile {
    fn params(&self) -> &ChainParams {
        &self.params
    }

    fn retarget_rule(&self) -> RetargetRule {
        RetargetRule::Continuous
    }

    /// Subsidy halves with every sixteenfold rise in difficulty, rounded up
    /// to whole cents
    fn subsidy(&self, _height: u64, _prev_hash: &Hash, difficulty: f64) -> i64 {
        let cent = self.params.cent().max(1);
        let scale = difficulty.powf(self.params.pow_of_difficulty_to_half_subsidy);
        let cents = (self.params.init_block_value as f64 / (scale * cent as f64)).ceil();
        (cents as i64).saturating_mul(cent)
    }

    fn block_variant(&self) -> Option<&dyn BlockVariant> {
        Some(&self.variant)
    }

    fn allow_free_txes(&self) -> bool {
        false
    }

    /// Fees are destroyed rather than collected by the coinbase
    fn coinbase_allowance(&self, subsidy: i64, _fees: i64) -> i64 {
        subsidy
    }
}
