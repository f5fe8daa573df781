//! Multi-currency blockchain validation engine
//!
//! This library implements hybrid proof-of-work / proof-of-stake consensus:
//! difficulty retargeting, the stake kernel and modifier, block and
//! transaction validation, and per-currency profiles selected by name.

pub mod config;
pub mod consensus;
pub mod pipeline;
pub mod process;

#[cfg(test)]
pub mod test_utils;

// Re-export key types for easier access
pub use config::{ConfigError, EngineConfig, ParamOverrides};
pub use consensus::profile::{
    register_all_profiles, register_all_profiles_with, BitcoinProfile, ConsensusProfile, DevCoinProfile,
    MaxCoinProfile, PPCoinProfile, ProfileRegistry,
};
pub use consensus::stake::{BlockVariant, PPCoinBlock, StandardPosBlock};
pub use consensus::storage::{BlockEntry, ChainStore, ChainView, MemoryChainStore, TxLocation};
pub use consensus::types::{BlockAcceptance, ChainExtension, InboundMessage, MessageOutcome};
pub use consensus::validation::{
    AdvisoryCheckpoint, BlockValidator, ContextualValidator, HeaderValidator, NoScriptChecks, ScriptVerifier,
    Secp256k1Signer, Secp256k1Verifier, SignatureVerifier, TransactionValidator,
};
pub use consensus_core::{ConsensusError, ConsensusResult, Hash, InternalError};

// Re-export pipeline and process types
pub use pipeline::ConsensusEngine;
pub use process::{test_and_submit, CpuNonceSource, NonceSource, WorkItem};
