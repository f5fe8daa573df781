//! Consensus-specific types
//!
//! This module defines the results and messages exchanged with the engine.

use consensus_core::{Block, ConsensusError, Hash, Transaction};

/// Where an accepted block landed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainExtension {
    /// Block became the new best block
    ExtendsBest,
    /// Block is stored on a side chain
    SideChain,
}

/// Block processing result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockAcceptance {
    pub hash: Hash,
    pub height: u64,
    pub extension: ChainExtension,
}

impl BlockAcceptance {
    pub fn extends_best(&self) -> bool {
        self.extension == ChainExtension::ExtendsBest
    }
}

/// Message delivered by the network collaborator
#[derive(Debug, Clone)]
pub enum InboundMessage {
    Block(Block),
    Tx(Transaction),
    /// Raw checkpoint payload, decoded by the engine
    Checkpoint(Vec<u8>),
}

/// Outcome reported back to the network collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    Accepted,
    /// Ordinary rejection with the misbehavior increment for the sender
    Rejected { reason: ConsensusError, misbehavior: u32 },
    /// Broken chain data; stop and alert an operator
    Fatal(ConsensusError),
}

impl MessageOutcome {
    pub fn from_error(error: ConsensusError) -> Self {
        if error.is_internal() {
            MessageOutcome::Fatal(error)
        } else {
            let misbehavior = error.misbehavior_score();
            MessageOutcome::Rejected { reason: error, misbehavior }
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, MessageOutcome::Accepted)
    }
}
