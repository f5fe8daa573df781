use crate::errors::{ConsensusError, ConsensusResult};
use crate::target::Target;
use crate::{Hash, HashAlgo};
use serde::{Deserialize, Serialize};

/// Transaction layout on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxFormat {
    #[default]
    Plain,
    /// A 32-bit timestamp follows the version field (proof-of-stake chains)
    Timestamped,
}

/// Everything needed to serialize and identify chain objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChainCodec {
    pub tx_format: TxFormat,
    /// Digest for transaction ids, merkle nodes and signed messages
    pub message_hash: HashAlgo,
    /// Digest for block ids and proof-of-work
    pub block_hash: HashAlgo,
}

/// Per-currency consensus constants.
///
/// One instance per currency, built by its profile and never mutated after
/// the registry hands it out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainParams {
    pub name: String,
    pub symbol: String,
    pub genesis: Hash,
    /// Target spacing between blocks, in seconds
    pub block_span: u32,
    /// Base units in one coin
    pub coin_value: i64,
    pub max_money: i64,
    pub min_tx_fee: i64,
    pub init_block_value: i64,
    /// Blocks between subsidy halvings
    pub half_life: u64,
    pub coinbase_maturity: u32,
    pub annual_percentage_rate: i64,
    /// Work target ceiling
    pub max_target: Target,
    /// Stake target ceiling
    pub max_target_stake: Target,
    /// Target used until enough same-type history exists
    pub init_target: Target,
    /// Upper bound of the adaptive work spacing, in seconds
    pub target_spacing_work_max: u32,
    pub pow_of_difficulty_to_half_subsidy: f64,
    /// Number of ancestors used for the median-time-past rule
    pub median_time_span: usize,
    pub message_hash: HashAlgo,
    pub block_hash: HashAlgo,
    pub tx_format: TxFormat,
    /// Hex encoded SEC1 public key signing checkpoint announcements
    #[serde(default)]
    pub checkpoint_master_pubkey: String,
}

impl ChainParams {
    pub fn codec(&self) -> ChainCodec {
        ChainCodec { tx_format: self.tx_format, message_hash: self.message_hash, block_hash: self.block_hash }
    }

    /// Value of one cent
    pub fn cent(&self) -> i64 {
        self.coin_value / 100
    }

    /// Difficulty of `target` relative to the work ceiling
    pub fn difficulty(&self, target: Target) -> f64 {
        let t = target.to_f64();
        if t == 0.0 {
            return 0.0;
        }
        self.max_target.to_f64() / t
    }

    pub fn check_money_range(&self, value: i64) -> ConsensusResult<i64> {
        if value < 0 || value > self.max_money {
            return Err(ConsensusError::MoneyOutOfRange(value));
        }
        Ok(value)
    }

    pub fn checkpoint_master_key(&self) -> Option<Vec<u8>> {
        if self.checkpoint_master_pubkey.is_empty() {
            return None;
        }
        hex::decode(&self.checkpoint_master_pubkey).ok()
    }
}
