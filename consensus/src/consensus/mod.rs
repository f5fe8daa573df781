//! Consensus rules shared by every supported currency
//!
//! This module implements difficulty retargeting, the proof-of-stake
//! kernel and modifier, block and transaction validation, and the
//! per-currency profiles that parameterize them.

pub mod difficulty;
pub mod profile;
pub mod stake;
pub mod storage;
pub mod types;
pub mod validation;

pub use difficulty::{AveragingSchedule, RetargetRule};
pub use profile::{register_all_profiles, register_all_profiles_with, ConsensusProfile, ProfileRegistry};
pub use storage::{BlockEntry, ChainStore, ChainView, MemoryChainStore, TxLocation};
pub use types::{BlockAcceptance, ChainExtension, InboundMessage, MessageOutcome};
pub use validation::{
    BlockValidator, ContextualValidator, HeaderValidator, ScriptVerifier, SignatureVerifier, TransactionValidator,
};
