use super::ConsensusProfile;
use crate::consensus::difficulty::{AveragingSchedule, RetargetRule};
use consensus_core::config::params::TxFormat;
use consensus_core::{ChainParams, Hash, HashAlgo, Target, Transaction};

const COIN: i64 = 100_000_000;

/// The genesis hash is not shipped and must come from configuration
pub(super) fn params() -> ChainParams {
    let limit = Target::from_u256(chain_math::U256::from(0xffffu64) << 208);
    ChainParams {
        name: "DevCoin".into(),
        symbol: "DVC".into(),
        genesis: Hash::zeroed(),
        block_span: 600,
        coin_value: COIN,
        max_money: 21_000_000_000 * COIN,
        min_tx_fee: 1_000_000,
        init_block_value: 50_000 * COIN,
        half_life: 0,
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

/// Proof-of-work with a one-day averaged retarget after the 10700 fork and
/// a per-output fee surcharge
pub struct DevCoinProfile {
    params: ChainParams,
}

impl DevCoinProfile {
    pub fn new() -> Self {
        Self::with_params(params())
    }

    pub fn with_params(params: ChainParams) -> Self {
        Self { params }
    }
}

impl Default for DevCoinProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsensusProfile for DevCoinProfile {
    fn params(&self) -> &ChainParams {
        &self.params
    }

    fn retarget_rule(&self) -> RetargetRule {
        RetargetRule::Averaging(AveragingSchedule::devcoin())
    }

    fn min_relay_fee(&self) -> i64 {
        self.params.min_tx_fee
    }

    fn fee_for_tx_outputs(&self, min_fee: i64, base_fee: i64, tx: &Transaction) -> i64 {
        min_fee.saturating_add((base_fee / 10).saturating_mul(tx.outputs().len() as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consensus_core::{OutPoint, TxIn, TxOut};

    #[test]
    fn surcharge_per_output() {
        let profile = DevCoinProfile::new();
        let input = vec![TxIn::new(OutPoint::new(Hash::from_le_u64([1, 0, 0, 0]), 0), vec![])];
        let tx = Transaction::new(1, 0, input, vec![TxOut::new(COIN, vec![]), TxOut::new(COIN, vec![])], 0);
        assert_eq!(profile.fee_for_tx_outputs(0, 1000, &tx), 200);
        assert_eq!(profile.min_relay_fee(), profile.params().min_tx_fee);
    }

    #[test]
    fn subsidy_does_not_halve() {
        let profile = DevCoinProfile::new();
        assert_eq!(profile.subsidy(5_000_000, &Hash::zeroed(), 1.0), 50_000 * COIN);
    }
}
