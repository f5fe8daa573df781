//! Signature and script capabilities consumed by validation.

use consensus_core::constants::{COINBASE_TRANSACTION_INDEX, COINSTAKE_TRANSACTION_INDEX};
use consensus_core::errors::ConsensusResult;
use consensus_core::{Block, ConsensusError, Hash, Transaction};
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, VerifyOnly};

/// Opaque signature check over a 32-byte digest
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, pubkey: &[u8], digest: &Hash, signature: &[u8]) -> bool;
}

/// Script evaluation of one transaction input against the output it spends
pub trait ScriptVerifier: Send + Sync {
    fn verify_input(&self, prev_tx: &Transaction, tx: &Transaction, input: usize) -> bool;
}

/// Accepts every input script; script evaluation happens elsewhere
#[derive(Debug, Clone, Copy, Default)]
pub struct NoScriptChecks;

impl ScriptVerifier for NoScriptChecks {
    fn verify_input(&self, _prev_tx: &Transaction, _tx: &Transaction, _input: usize) -> bool {
        true
    }
}

/// ECDSA over secp256k1 with DER encoded signatures
pub struct Secp256k1Verifier {
    secp: Secp256k1<VerifyOnly>,
}

impl Secp256k1Verifier {
    pub fn new() -> Self {
        Self { secp: Secp256k1::verification_only() }
    }
}

impl Default for Secp256k1Verifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureVerifier for Secp256k1Verifier {
    fn verify(&self, pubkey: &[u8], digest: &Hash, signature: &[u8]) -> bool {
        let Ok(pubkey) = PublicKey::from_slice(pubkey) else {
            return false;
        };
        let Ok(mut sig) = Signature::from_der(signature).or_else(|_| Signature::from_der_lax(signature)) else {
            return false;
        };
        sig.normalize_s();
        let Ok(message) = Message::from_slice(digest.as_bytes()) else {
            return false;
        };
        self.secp.verify_ecdsa(&message, &sig, &pubkey).is_ok()
    }
}

/// Signs block ids with a single secp256k1 key
pub struct Secp256k1Signer {
    secp: Secp256k1<secp256k1::All>,
    secret: SecretKey,
}

impl Secp256k1Signer {
    pub fn from_secret_bytes(secret: &[u8]) -> Result<Self, secp256k1::Error> {
        Ok(Self { secp: Secp256k1::new(), secret: SecretKey::from_slice(secret)? })
    }

    /// Compressed SEC1 public key
    pub fn public_key(&self) -> Vec<u8> {
        PublicKey::from_secret_key(&self.secp, &self.secret).serialize().to_vec()
    }

    /// DER signature over `digest`
    pub fn sign(&self, digest: &Hash) -> Result<Vec<u8>, secp256k1::Error> {
        let message = Message::from_slice(digest.as_bytes())?;
        Ok(self.secp.sign_ecdsa(&message, &self.secret).serialize_der().to_vec())
    }
}

/// Verifies the block signature against the key paid by the coinstake
/// (stake blocks) or the coinbase (work blocks). The genesis block is exempt.
pub fn check_block_signature(verifier: &dyn SignatureVerifier, block: &Block, block_id: &Hash) -> ConsensusResult<()> {
    if block.header().is_genesis() {
        return Ok(());
    }
    let (tx_index, out_index) = if block.is_proof_of_stake() {
        (COINSTAKE_TRANSACTION_INDEX, 1)
    } else {
        (COINBASE_TRANSACTION_INDEX, 0)
    };
    let pubkey = block
        .transactions()
        .get(tx_index)
        .and_then(|tx| tx.outputs().get(out_index))
        .and_then(|out| out.pubkey())
        .ok_or(ConsensusError::BadBlockSignature)?;
    if block.signature().is_empty() || !verifier.verify(pubkey, block_id, block.signature()) {
        return Err(ConsensusError::BadBlockSignature);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let signer = Secp256k1Signer::from_secret_bytes(&[0x11; 32]).unwrap();
        let digest = Hash::from_le_u64([1, 2, 3, 4]);
        let sig = signer.sign(&digest).unwrap();
        let verifier = Secp256k1Verifier::new();
        assert!(verifier.verify(&signer.public_key(), &digest, &sig));

        let other = Hash::from_le_u64([4, 3, 2, 1]);
        assert!(!verifier.verify(&signer.public_key(), &other, &sig));
        assert!(!verifier.verify(&[0x02; 33], &digest, &sig));
        assert!(!verifier.verify(&signer.public_key(), &digest, &[0x30, 0x00]));
    }
}
