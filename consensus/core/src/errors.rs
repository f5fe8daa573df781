use crate::Hash;
use thiserror::Error;

/// Reasons a block, transaction or message is refused.
///
/// Everything except [`ConsensusError::Internal`] is an ordinary rejection:
/// the offending object is dropped and processing continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("Spending transaction is timestamped before the output it spends")]
    TimestampViolation,

    #[error("Coinstake claims {claimed} but at most {allowed} is allowed")]
    StakeRewardExceeded { claimed: i64, allowed: i64 },

    #[error("Coinstake transaction at index {0}, only index 1 is allowed")]
    CoinstakeInWrongPosition(usize),

    #[error("Block timestamp is too far ahead of the coinbase timestamp")]
    CoinbaseTimestampTooEarly,

    #[error("Staked coins are too recent")]
    CoinsAreTooRecent,

    #[error("Coinstake kernel does not meet the target")]
    CoinstakeCheckTargetFailed,

    #[error("Bad block signature")]
    BadBlockSignature,

    #[error("Checkpoint signature verification failed")]
    CheckpointVerifySignatureFailed,

    #[error("Transaction {0} not found")]
    TxNotFound(Hash),

    #[error("Unknown currency {0}")]
    UnknownCurrency(String),

    #[error("Amount {0} is out of money range")]
    MoneyOutOfRange(i64),

    #[error("Invalid merkle root")]
    BadMerkleRoot,

    #[error("Empty transaction list")]
    EmptyTransactionList,

    #[error("First transaction must be the only coinbase")]
    BadCoinbase,

    #[error("Transaction has no inputs")]
    EmptyTxInputs,

    #[error("Transaction has no outputs")]
    EmptyTxOutputs,

    #[error("Block size {0} exceeds the maximum")]
    OversizedBlock(usize),

    #[error("Difficulty bits {found:#010x} do not match required {expected:#010x}")]
    BadDifficultyBits { expected: u32, found: u32 },

    #[error("Invalid proof of work")]
    InvalidProofOfWork,

    #[error("Output {index} of {tx} is already spent")]
    DoubleSpend { tx: Hash, index: u32 },

    #[error("Output {index} of {tx} does not exist")]
    MissingOutput { tx: Hash, index: u32 },

    #[error("Coinbase spent at depth {depth}, maturity is {required}")]
    PrematureCoinbaseSpend { depth: u64, required: u32 },

    #[error("Fee {paid} is below the required {required}")]
    InsufficientFee { paid: i64, required: i64 },

    #[error("Coinbase pays {claimed} but at most {allowed} is allowed")]
    BadCoinbaseValue { claimed: i64, allowed: i64 },

    #[error("Previous block {0} not found")]
    PrevBlockNotFound(Hash),

    #[error("Block {0} is already known")]
    DuplicateBlock(Hash),

    #[error("Block {0} is not this chain's genesis")]
    BadGenesis(Hash),

    #[error("Inputs total {value_in} is below outputs total {value_out}")]
    ValueInBelowOut { value_in: i64, value_out: i64 },

    #[error("Script verification failed for input {0}")]
    ScriptVerifyFailed(usize),

    #[error("Bad compact target {0:#010x}")]
    BadTargetBits(u32),

    #[error("Block timestamp is not after the median time past")]
    TimeTooOld,

    #[error("Block timestamp is too far in the future")]
    TimeTooNew,

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Internal error: {0}")]
    Internal(#[from] InternalError),
}

/// Broken invariants in chain data the engine already trusted.
///
/// These are not rejections of the object under validation; the caller
/// should stop and alert an operator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InternalError {
    #[error("Stake modifier selection round {round} has no candidate")]
    EmptyModifierSelectionRound { round: usize },

    #[error("No stake modifier found down to the genesis block")]
    MissingGenesisModifier,

    #[error("Ancestor of {0} is missing from storage")]
    BrokenAncestry(Hash),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type ConsensusResult<T> = Result<T, ConsensusError>;

/// Increment applied to a peer that sent a malformed message
pub const MALFORMED_MESSAGE_SCORE: u32 = 10;

impl ConsensusError {
    pub fn is_internal(&self) -> bool {
        matches!(self, ConsensusError::Internal(_))
    }

    /// Misbehavior increment the network layer should apply to the peer
    /// that relayed the rejected object.
    pub fn misbehavior_score(&self) -> u32 {
        use ConsensusError::*;
        match self {
            BadBlockSignature
            | StakeRewardExceeded { .. }
            | MoneyOutOfRange(_)
            | CoinstakeInWrongPosition(_)
            | BadMerkleRoot
            | BadCoinbase
            | EmptyTransactionList
            | EmptyTxInputs
            | EmptyTxOutputs
            | OversizedBlock(_)
            | BadDifficultyBits { .. }
            | InvalidProofOfWork
            | BadCoinbaseValue { .. }
            | CheckpointVerifySignatureFailed
            | ValueInBelowOut { .. }
            | ScriptVerifyFailed(_)
            | BadTargetBits(_) => 100,
            TimestampViolation | CoinbaseTimestampTooEarly | TimeTooOld => 50,
            DoubleSpend { .. } | MissingOutput { .. } | PrematureCoinbaseSpend { .. } => 10,
            Encoding(_) => MALFORMED_MESSAGE_SCORE,
            CoinstakeCheckTargetFailed | CoinsAreTooRecent => 1,
            TxNotFound(_)
            | PrevBlockNotFound(_)
            | DuplicateBlock(_)
            | BadGenesis(_)
            | UnknownCurrency(_)
            | InsufficientFee { .. }
            | TimeTooNew
            | Internal(_) => 0,
        }
    }
}

impl From<std::io::Error> for ConsensusError {
    fn from(e: std::io::Error) -> Self {
        ConsensusError::Encoding(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_are_flagged() {
        let e: ConsensusError = InternalError::MissingGenesisModifier.into();
        assert!(e.is_internal());
        assert_eq!(e.misbehavior_score(), 0);
        assert!(!ConsensusError::BadBlockSignature.is_internal());
    }

    #[test]
    fn scores() {
        assert_eq!(ConsensusError::BadBlockSignature.misbehavior_score(), 100);
        assert_eq!(ConsensusError::TimestampViolation.misbehavior_score(), 50);
        assert_eq!(ConsensusError::CoinstakeCheckTargetFailed.misbehavior_score(), 1);
        assert_eq!(ConsensusError::TxNotFound(Hash::zeroed()).misbehavior_score(), 0);
        assert_eq!(ConsensusError::Encoding("eof".into()).misbehavior_score(), MALFORMED_MESSAGE_SCORE);
    }
}
