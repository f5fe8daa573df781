//! Signed checkpoint announcements.
//!
//! On the wire a checkpoint is two blobs: the signed message and a detached
//! signature. The message itself holds the announcement version and the
//! checkpointed block hash.

use crate::encoding::{write_blob, Reader};
use crate::errors::{ConsensusError, ConsensusResult};
use crate::Hash;

pub const CHECKPOINT_VERSION: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointMessage {
    pub version: i32,
    pub block_hash: Hash,
    /// Signed bytes, kept verbatim so the signature is checked against
    /// exactly what the sender signed
    pub msg: Vec<u8>,
    pub sig: Vec<u8>,
}

impl CheckpointMessage {
    /// Builds an unsigned announcement for `block_hash`
    pub fn new(block_hash: Hash) -> Self {
        let mut msg = Vec::with_capacity(36);
        msg.extend_from_slice(&CHECKPOINT_VERSION.to_le_bytes());
        msg.extend_from_slice(block_hash.as_bytes());
        Self { version: CHECKPOINT_VERSION, block_hash, msg, sig: Vec::new() }
    }

    pub fn with_signature(mut self, sig: Vec<u8>) -> Self {
        self.sig = sig;
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.msg.len() + self.sig.len() + 2);
        // writing into a Vec cannot fail
        let _ = write_blob(&mut buf, &self.msg).and_then(|_| write_blob(&mut buf, &self.sig));
        buf
    }

    pub fn decode(payload: &[u8]) -> ConsensusResult<Self> {
        let mut r = Reader::new(payload);
        let msg = r.read_blob()?;
        let sig = r.read_blob()?;
        let mut inner = Reader::new(&msg);
        let version = inner.read_i32()?;
        let block_hash = inner.read_hash()?;
        if !r.is_empty() {
            return Err(ConsensusError::Encoding(format!("{} trailing bytes after checkpoint", r.remaining())));
        }
        Ok(Self { version, block_hash, msg, sig })
    }
}
