//! Block production support
//!
//! This module assembles work items for external hash-search backends and
//! submits solved work back through the engine.

pub mod coinbase;
pub mod mining;

pub use coinbase::CoinbaseProcessor;
pub use mining::{test_and_submit, BlockSigner, CpuNonceSource, MiningError, NonceSource, WorkItem};
