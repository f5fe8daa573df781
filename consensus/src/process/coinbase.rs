//! Coinbase transaction processing
//!
//! This module builds the coinbase of a new work block from the profile's
//! subsidy and coinbase allowance.

use crate::consensus::profile::ConsensusProfile;
use consensus_core::errors::ConsensusResult;
use consensus_core::{Hash, OutPoint, Target, Transaction, TxIn, TxOut};
use std::sync::Arc;

/// Coinbase transaction builder
pub struct CoinbaseProcessor {
    profile: Arc<dyn ConsensusProfile>,
}

impl CoinbaseProcessor {
    pub fn new(profile: Arc<dyn ConsensusProfile>) -> Self {
        Self { profile }
    }

    /// Value the coinbase of a block at `height` may claim
    pub fn block_reward(&self, height: u64, prev_hash: &Hash, bits: u32, fees: i64) -> ConsensusResult<i64> {
        let difficulty = self.profile.params().difficulty(Target::from_compact(bits)?);
        let subsidy = self.profile.subsidy(height, prev_hash, difficulty);
        Ok(self.profile.coinbase_allowance(subsidy, fees))
    }

    /// Coinbase paying the full reward to `pubkey`
    pub fn create_coinbase_transaction(
        &self,
        height: u64,
        time: u32,
        prev_hash: &Hash,
        bits: u32,
        fees: i64,
        pubkey: &[u8],
    ) -> ConsensusResult<Transaction> {
        let reward = self.block_reward(height, prev_hash, bits, fees)?;
        Ok(Transaction::new(
            1,
            time,
            vec![TxIn::new(OutPoint::null(), height_script(height))],
            vec![TxOut::pay_to_pubkey(reward, pubkey)],
            0,
        ))
    }
}

/// Little-endian height with trailing zero bytes dropped, at least two bytes
/// so the script satisfies the coinbase length rule
fn height_script(height: u64) -> Vec<u8> {
    let mut script = height.to_le_bytes().to_vec();
    while script.len() > 2 && script.last() == Some(&0) {
        script.pop();
    }
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::profile::{BitcoinProfile, PPCoinProfile};

    #[test]
    fn test_height_script() {
        assert_eq!(height_script(0), vec![0, 0]);
        assert_eq!(height_script(0x1234), vec![0x34, 0x12]);
        assert_eq!(height_script(0x010000), vec![0, 0, 1]);
    }

    #[test]
    fn test_create_coinbase_transaction() {
        let profile: Arc<dyn ConsensusProfile> = Arc::new(BitcoinProfile::new());
        let processor = CoinbaseProcessor::new(profile.clone());
        let bits = profile.params().max_target.to_compact();
        let coinbase = processor.create_coinbase_transaction(100, 0, &Hash::zeroed(), bits, 1000, &[0x02; 33]).unwrap();

        assert!(coinbase.is_coinbase());
        assert_eq!(coinbase.outputs().len(), 1);
        assert_eq!(coinbase.outputs()[0].value, profile.params().init_block_value + 1000);
        assert_eq!(coinbase.outputs()[0].pubkey(), Some(&[0x02; 33][..]));
    }

    #[test]
    fn test_fees_are_not_claimable_on_ppcoin() {
        let profile: Arc<dyn ConsensusProfile> = Arc::new(PPCoinProfile::new());
        let processor = CoinbaseProcessor::new(profile.clone());
        let bits = profile.params().max_target.to_compact();
        let with_fees = processor.block_reward(1, &Hash::zeroed(), bits, 5_000).unwrap();
        let without = processor.block_reward(1, &Hash::zeroed(), bits, 0).unwrap();
        assert_eq!(with_fees, without);
        assert!(without > 0);
    }
}
