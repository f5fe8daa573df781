//! Contextual validation for consensus
//!
//! Rules that need confirmed chain state: spent outputs, fees, the coinbase
//! allowance and the coinstake reward.

use super::transaction_validator::{min_fee, FeeMode, TransactionValidator};
use crate::consensus::profile::ConsensusProfile;
use crate::consensus::stake::check_coinstake_reward;
use crate::consensus::storage::ChainView;
use consensus_core::constants::{COINBASE_TRANSACTION_INDEX, COINSTAKE_TRANSACTION_INDEX};
use consensus_core::errors::ConsensusResult;
use consensus_core::{Block, ConsensusError, Hash, Transaction};
use std::collections::HashSet;
use std::sync::Arc;

/// Contextual validator for consensus rules
pub struct ContextualValidator {
    profile: Arc<dyn ConsensusProfile>,
    transaction_validator: TransactionValidator,
}

impl ContextualValidator {
    pub fn new(profile: Arc<dyn ConsensusProfile>) -> Self {
        let transaction_validator = TransactionValidator::new(profile.params());
        Self { profile, transaction_validator }
    }

    /// Inputs of a loose transaction against the chain tip, including the
    /// relay fee. Returns the fee paid.
    pub fn validate_transaction(&self, chain: &ChainView, tx: &Transaction) -> ConsensusResult<i64> {
        self.transaction_validator.validate_transaction(tx)?;
        if tx.is_coinbase() || tx.is_coinstake() {
            return Err(ConsensusError::BadCoinbase);
        }
        let spend_height = chain.best_height().map_or(0, |h| h + 1);
        let fee = self.transaction_validator.validate_transaction_with_chain(chain, tx, spend_height)?;
        let required = min_fee(self.profile.as_ref(), tx, 1, self.profile.allow_free_txes(), FeeMode::Relay);
        if fee < required {
            return Err(ConsensusError::InsufficientFee { paid: fee, required });
        }
        Ok(fee)
    }

    /// Validates every transaction of `block` against `chain`, whose tip is
    /// the block's parent, and the value its coinbase or coinstake claims.
    /// Returns the total fees.
    pub fn validate_block_in_context(&self, chain: &ChainView, block: &Block, height: u64) -> ConsensusResult<i64> {
        let params = self.profile.params();
        let codec = params.codec();
        let enforce_fee = !self.profile.allow_free_txes();

        let mut spent = HashSet::new();
        let mut fees: i64 = 0;
        for tx in block.transactions().iter().skip(COINBASE_TRANSACTION_INDEX + 1) {
            for (index, input) in tx.inputs().iter().enumerate() {
                if !spent.insert(input.prev_out) {
                    return Err(ConsensusError::DoubleSpend { tx: tx.id(&codec), index: index as u32 });
                }
            }
            let fee = self.transaction_validator.validate_transaction_with_chain(chain, tx, height)?;
            if enforce_fee && !tx.is_coinstake() {
                let required = min_fee(self.profile.as_ref(), tx, 1, false, FeeMode::Block);
                if fee < required {
                    return Err(ConsensusError::InsufficientFee { paid: fee, required });
                }
            }
            fees = fees.checked_add(fee).ok_or(ConsensusError::MoneyOutOfRange(i64::MAX))?;
            params.check_money_range(fees)?;
        }

        if self.profile.is_proof_of_stake() && block.is_proof_of_stake() {
            check_coinstake_reward(chain, self.profile.as_ref(), &block.transactions()[COINSTAKE_TRANSACTION_INDEX])?;
        } else {
            self.validate_coinbase_value(block, height, fees)?;
        }
        Ok(fees)
    }

    fn validate_coinbase_value(&self, block: &Block, height: u64, fees: i64) -> ConsensusResult<()> {
        let params = self.profile.params();
        let target = consensus_core::Target::from_compact(block.header().bits)?;
        let subsidy = self.profile.subsidy(height, &block.header().prev_block, params.difficulty(target));
        let allowed = self.profile.coinbase_allowance(subsidy, fees);
        let claimed = block.transactions()[COINBASE_TRANSACTION_INDEX]
            .value_out()
            .ok_or(ConsensusError::MoneyOutOfRange(i64::MAX))?;
        if claimed > allowed {
            return Err(ConsensusError::BadCoinbaseValue { claimed, allowed });
        }
        Ok(())
    }

    /// Ids of the outputs `block` spends, in block order
    pub fn spent_outputs(block: &Block) -> Vec<(Hash, u32)> {
        block
            .transactions()
            .iter()
            .filter(|tx| !tx.is_coinbase())
            .flat_map(|tx| tx.inputs().iter().map(|i| (i.prev_out.tx_hash, i.prev_out.index)))
            .collect()
    }
}
