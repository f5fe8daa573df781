//! Validation module for consensus
//!
//! This module provides validation for blocks, headers, and transactions,
//! including context-free validation and contextual validation against
//! confirmed chain state.

pub mod block_validator;
pub mod checkpoint;
pub mod contextual;
pub mod header_validator;
pub mod signature;
pub mod transaction_validator;

pub use block_validator::BlockValidator;
pub use checkpoint::{verify_checkpoint, AdvisoryCheckpoint};
pub use contextual::ContextualValidator;
pub use header_validator::HeaderValidator;
pub use signature::{NoScriptChecks, ScriptVerifier, Secp256k1Signer, Secp256k1Verifier, SignatureVerifier};
pub use transaction_validator::{min_fee, FeeMode, TransactionValidator};
