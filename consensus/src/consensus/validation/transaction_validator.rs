//! Transaction validation for consensus
//!
//! This module validates transactions including:
//! - Input/output structure
//! - Amount ranges
//! - Spent-output state and coinbase maturity
//! - Minimum fee calculation

use crate::consensus::profile::ConsensusProfile;
use crate::consensus::storage::ChainView;
use consensus_core::constants::{FREE_TX_SIZE_LIMIT, MAX_BLOCK_SIZE};
use consensus_core::errors::ConsensusResult;
use consensus_core::{ChainCodec, ChainParams, ConsensusError, Transaction, TxFormat};
use std::collections::HashSet;

/// Block size at which fees start to rise
pub const MAX_BLOCK_SIZE_GEN: usize = MAX_BLOCK_SIZE / 2;

/// Blocks below this size may include free transactions
const FREE_BLOCK_SIZE_LIMIT: usize = 27_000;

/// Which base fee a minimum-fee calculation uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeMode {
    /// Inclusion in a block, priced by `min_tx_fee`
    Block,
    /// Relay to peers, priced by the profile's relay fee
    Relay,
}

/// Minimum fee `tx` owes when added to a block currently `block_size`
/// bytes large (1 for an empty block). Saturates to `max_money`.
pub fn min_fee(profile: &dyn ConsensusProfile, tx: &Transaction, block_size: usize, allow_free: bool, mode: FeeMode) -> i64 {
    let params = profile.params();
    let base_fee = match mode {
        FeeMode::Block => params.min_tx_fee,
        FeeMode::Relay => profile.min_relay_fee(),
    };
    let bytes = tx.serialized_size(params.tx_format);
    let new_block_size = block_size + bytes;
    let mut fee = (1 + (bytes / 1000) as i64).saturating_mul(base_fee);

    if allow_free {
        if block_size == 1 {
            if bytes < FREE_TX_SIZE_LIMIT {
                fee = 0;
            }
        } else if new_block_size < FREE_BLOCK_SIZE_LIMIT {
            fee = 0;
        }
    }

    fee = profile.fee_for_tx_outputs(fee, base_fee, tx);

    if block_size != 1 && new_block_size >= MAX_BLOCK_SIZE_GEN / 2 {
        if new_block_size >= MAX_BLOCK_SIZE_GEN {
            return params.max_money;
        }
        fee = fee.saturating_mul((MAX_BLOCK_SIZE_GEN / (MAX_BLOCK_SIZE_GEN - new_block_size)) as i64);
    }

    if fee < 0 || fee > params.max_money {
        params.max_money
    } else {
        fee
    }
}

/// Sum of the outputs spent by `tx`; zero for a coinbase
pub fn value_in(chain: &ChainView, tx: &Transaction) -> ConsensusResult<i64> {
    if tx.is_coinbase() {
        return Ok(0);
    }
    let mut total: i64 = 0;
    for input in tx.inputs() {
        let loc = chain.find_tx(&input.prev_out.tx_hash)?;
        let output = loc
            .tx()
            .outputs()
            .get(input.prev_out.index as usize)
            .ok_or(ConsensusError::MissingOutput { tx: input.prev_out.tx_hash, index: input.prev_out.index })?;
        total = total.checked_add(output.value).ok_or(ConsensusError::MoneyOutOfRange(i64::MAX))?;
    }
    Ok(total)
}

/// Transaction validator for consensus rules
pub struct TransactionValidator {
    max_money: i64,
    coinbase_maturity: u32,
    codec: ChainCodec,
}

impl TransactionValidator {
    pub fn new(params: &ChainParams) -> Self {
        Self { max_money: params.max_money, coinbase_maturity: params.coinbase_maturity, codec: params.codec() }
    }

    fn check_money(&self, value: i64) -> ConsensusResult<i64> {
        if value < 0 || value > self.max_money {
            return Err(ConsensusError::MoneyOutOfRange(value));
        }
        Ok(value)
    }

    /// Validate transaction with context-free checks
    pub fn validate_transaction(&self, tx: &Transaction) -> ConsensusResult<()> {
        if tx.inputs().is_empty() {
            return Err(ConsensusError::EmptyTxInputs);
        }
        if tx.outputs().is_empty() {
            return Err(ConsensusError::EmptyTxOutputs);
        }

        let mut total: i64 = 0;
        for output in tx.outputs() {
            self.check_money(output.value)?;
            total = total.checked_add(output.value).ok_or(ConsensusError::MoneyOutOfRange(i64::MAX))?;
            self.check_money(total)?;
        }

        let mut seen = HashSet::with_capacity(tx.inputs().len());
        for (index, input) in tx.inputs().iter().enumerate() {
            if !seen.insert(input.prev_out) {
                return Err(ConsensusError::DoubleSpend { tx: tx.id(&self.codec), index: index as u32 });
            }
        }

        if tx.is_coinbase() {
            let script_len = tx.inputs()[0].script_sig.len();
            if !(2..=100).contains(&script_len) {
                return Err(ConsensusError::BadCoinbase);
            }
        } else if let Some(index) = tx.inputs().iter().position(|i| i.prev_out.is_null()) {
            return Err(ConsensusError::MissingOutput { tx: tx.id(&self.codec), index: index as u32 });
        }
        Ok(())
    }

    /// Validate transaction inputs against confirmed chain state. Returns the
    /// fee paid; a coinstake pays none.
    pub fn validate_transaction_with_chain(&self, chain: &ChainView, tx: &Transaction, spend_height: u64) -> ConsensusResult<i64> {
        if tx.is_coinbase() {
            return Ok(0);
        }
        let mut total_in: i64 = 0;
        for input in tx.inputs() {
            let prev_hash = input.prev_out.tx_hash;
            let index = input.prev_out.index;
            let loc = chain.find_tx(&prev_hash)?;
            let prev = loc.tx();
            let output = prev.outputs().get(index as usize).ok_or(ConsensusError::MissingOutput { tx: prev_hash, index })?;

            if let Some(coins) = chain.store().coins_by_tx_hash(&prev_hash)? {
                if coins.get(index as usize) == Some(&false) {
                    return Err(ConsensusError::DoubleSpend { tx: prev_hash, index });
                }
            }

            if prev.is_coinbase() || prev.is_coinstake() {
                let depth = spend_height.saturating_sub(loc.height());
                if depth < self.coinbase_maturity as u64 {
                    return Err(ConsensusError::PrematureCoinbaseSpend { depth, required: self.coinbase_maturity });
                }
            }

            if self.codec.tx_format == TxFormat::Timestamped && tx.time() < prev.time() {
                return Err(ConsensusError::TimestampViolation);
            }

            self.check_money(output.value)?;
            total_in = total_in.checked_add(output.value).ok_or(ConsensusError::MoneyOutOfRange(i64::MAX))?;
            self.check_money(total_in)?;
        }

        if tx.is_coinstake() {
            return Ok(0);
        }
        let total_out = tx.value_out().ok_or(ConsensusError::MoneyOutOfRange(i64::MAX))?;
        if total_in < total_out {
            return Err(ConsensusError::ValueInBelowOut { value_in: total_in, value_out: total_out });
        }
        self.check_money(total_in - total_out)
    }
}
