//! Block processing pipeline for consensus
//!
//! This module provides the engine that orchestrates validation,
//! stake-modifier generation and state updates for incoming blocks.

pub mod engine;

pub use engine::ConsensusEngine;
