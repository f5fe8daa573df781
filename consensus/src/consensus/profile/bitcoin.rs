use super::ConsensusProfile;
use crate::consensus::difficulty::{AveragingSchedule, RetargetRule};
use consensus_core::config::params::TxFormat;
use consensus_core::{ChainParams, Hash, HashAlgo, Target};

const COIN: i64 = 100_000_000;

pub(super) fn params() -> ChainParams {
    let limit = Target::from_u256(chain_math::U256::from(0xffffu64) << 208);
    ChainParams {
        name: "Bitcoin".into(),
        symbol: "BTC".into(),
        genesis: Hash::from_le_u64([0x72b3f1b60a8ce26f, 0x4ff763ae46a2a6c1, 0x9c085ae165831e93, 0x000000000019d668]),
        block_span: 600,
        coin_value: COIN,
        max_money: 21_000_000 * COIN,
        min_tx_fee: 10_000,
        init_block_value: 50 * COIN,
        half_life: 210_000,
        coinbase_maturity: 100,
        annual_percentage_rate: 0,
        max_target: limit,
        max_target_stake: limit,
        init_target: limit,
        target_spacing_work_max: 600,
        pow_of_difficulty_to_half_subsidy: 0.0,
        median_time_span: 11,
        message_hash: HashAlgo::Sha256d,
        block_hash: HashAlgo::Sha256d,
        tx_format: TxFormat::Plain,
        checkpoint_master_pubkey: String::new(),
    }
}

/// Plain proof-of-work with boundary retargets and halving subsidy
pub struct BitcoinProfile {
    params: ChainParams,
}

impl BitcoinProfile {
    pub fn new() -> Self {
        Self::with_params(params())
    }

    pub fn with_params(params: ChainParams) -> Self {
        Self { params }
    }
}

impl Default for BitcoinProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsensusProfile for BitcoinProfile {
    fn params(&self) -> &ChainParams {
        &self.params
    }

    fn retarget_rule(&self) -> RetargetRule {
        RetargetRule::Averaging(AveragingSchedule::bitcoin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_hash_matches_mainnet() {
        let p = params();
        assert_eq!(p.genesis.to_hex(), "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f");
        assert_eq!(p.max_target.to_compact(), 0x1d00ffff);
    }
}
