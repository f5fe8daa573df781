//! Consensus data model shared by every supported currency.
//!
//! Holds the chain primitives (blocks, transactions, compact targets),
//! their consensus serialization, per-currency chain parameters and the
//! error taxonomy used by the validation engine.

pub mod block;
pub mod checkpoint;
pub mod config;
pub mod constants;
pub mod encoding;
pub mod errors;
pub mod stake;
pub mod target;
pub mod tx;

pub use crypto_hashes::{Hash, HashAlgo};

pub use block::{Block, Header, ProofType};
pub use config::params::{ChainCodec, ChainParams, TxFormat};
pub use errors::{ConsensusError, ConsensusResult, InternalError};
pub use stake::StakeRecord;
pub use target::Target;
pub use tx::{OutPoint, Transaction, TxIn, TxOut};

/// Zero hash, used as the previous-block reference of a genesis block
pub const ZERO_HASH: Hash = Hash::zeroed();
