use super::signature::SignatureVerifier;
use crate::consensus::profile::ConsensusProfile;
use consensus_core::checkpoint::CheckpointMessage;
use consensus_core::errors::ConsensusResult;
use consensus_core::{ConsensusError, Hash};

/// A checkpoint accepted on the master key's authority. Recorded only;
/// the chain is never reorganized to honour it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvisoryCheckpoint {
    pub version: i32,
    pub block_hash: Hash,
}

/// Verifies a checkpoint announcement against the currency's master key
pub fn verify_checkpoint(
    profile: &dyn ConsensusProfile,
    verifier: &dyn SignatureVerifier,
    message: &CheckpointMessage,
) -> ConsensusResult<AdvisoryCheckpoint> {
    let key = profile.params().checkpoint_master_key().ok_or(ConsensusError::CheckpointVerifySignatureFailed)?;
    let digest = profile.hash_for_message(&message.msg);
    if !verifier.verify(&key, &digest, &message.sig) {
        return Err(ConsensusError::CheckpointVerifySignatureFailed);
    }
    Ok(AdvisoryCheckpoint { version: message.version, block_hash: message.block_hash })
}
