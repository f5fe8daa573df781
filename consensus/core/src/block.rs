use crate::config::params::ChainCodec;
use crate::constants::COINSTAKE_TRANSACTION_INDEX;
use crate::encoding::{varint_size, write_varint, Reader};
use crate::errors::ConsensusResult;
use crate::tx::Transaction;
use crate::Hash;
use crypto_hashes::merkle_root;
use once_cell::sync::OnceCell;
use std::io::{self, Write};

/// Serialized header length
pub const HEADER_SIZE: usize = 80;

/// Block header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub version: i32,
    pub prev_block: Hash,
    pub merkle_root: Hash,
    pub timestamp: u32,
    /// Compact difficulty target
    pub bits: u32,
    pub nonce: u32,
}

impl Header {
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.version.to_le_bytes());
        out[4..36].copy_from_slice(self.prev_block.as_bytes());
        out[36..68].copy_from_slice(self.merkle_root.as_bytes());
        out[68..72].copy_from_slice(&self.timestamp.to_le_bytes());
        out[72..76].copy_from_slice(&self.bits.to_le_bytes());
        out[76..80].copy_from_slice(&self.nonce.to_le_bytes());
        out
    }

    pub fn decode(r: &mut Reader) -> ConsensusResult<Self> {
        Ok(Self {
            version: r.read_i32()?,
            prev_block: r.read_hash()?,
            merkle_root: r.read_hash()?,
            timestamp: r.read_u32()?,
            bits: r.read_u32()?,
            nonce: r.read_u32()?,
        })
    }

    /// Header digest under the chain's block hash
    pub fn hash(&self, codec: &ChainCodec) -> Hash {
        codec.block_hash.digest(&self.encode())
    }

    pub fn is_genesis(&self) -> bool {
        self.prev_block.is_zero()
    }
}

/// Proof a block carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProofType {
    Work,
    Stake,
}

/// A complete block: header, ordered transactions and, on chains that sign
/// blocks, the signature over the block id.
///
/// The id and the proof-of-stake hash are memoized, so header and
/// transactions are fixed at construction. Rebuild the block through
/// [`Block::into_parts`] and [`Block::new`] to change them.
#[derive(Debug, Clone)]
pub struct Block {
    header: Header,
    transactions: Vec<Transaction>,
    signature: Vec<u8>,
    id: OnceCell<Hash>,
    proof_of_stake_hash: OnceCell<Hash>,
}

impl Block {
    pub fn new(header: Header, transactions: Vec<Transaction>, signature: Vec<u8>) -> Self {
        Self { header, transactions, signature, id: OnceCell::new(), proof_of_stake_hash: OnceCell::new() }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Replaces the signature. Neither memoized hash covers it, so both
    /// carry over.
    pub fn with_signature(mut self, signature: Vec<u8>) -> Self {
        self.signature = signature;
        self
    }

    /// Header, transactions and signature by value, dropping the memoized
    /// hashes
    pub fn into_parts(self) -> (Header, Vec<Transaction>, Vec<u8>) {
        (self.header, self.transactions, self.signature)
    }

    /// Block id, memoized after the first call
    pub fn id(&self, codec: &ChainCodec) -> Hash {
        *self.id.get_or_init(|| self.header.hash(codec))
    }

    /// A block is stake-typed when its second transaction is a coinstake
    pub fn proof_type(&self) -> ProofType {
        match self.transactions.get(COINSTAKE_TRANSACTION_INDEX) {
            Some(tx) if tx.is_coinstake() => ProofType::Stake,
            _ => ProofType::Work,
        }
    }

    pub fn is_proof_of_stake(&self) -> bool {
        self.proof_type() == ProofType::Stake
    }

    pub fn compute_merkle_root(&self, codec: &ChainCodec) -> Hash {
        let ids: Vec<Hash> = self.transactions.iter().map(|tx| tx.id(codec)).collect();
        merkle_root(codec.message_hash, &ids)
    }

    /// Returns the memoized proof-of-stake hash, computing it with `compute` once
    pub fn proof_of_stake_hash_with<F>(&self, compute: F) -> ConsensusResult<Hash>
    where
        F: FnOnce() -> ConsensusResult<Hash>,
    {
        self.proof_of_stake_hash.get_or_try_init(compute).copied()
    }

    pub fn cached_proof_of_stake_hash(&self) -> Option<Hash> {
        self.proof_of_stake_hash.get().copied()
    }

    /// Byte offset of transaction `tx_id` inside the serialized block
    /// (header, transaction count, then every preceding transaction).
    pub fn tx_offset(&self, tx_id: &Hash, codec: &ChainCodec) -> Option<u32> {
        let mut offset = HEADER_SIZE + varint_size(self.transactions.len() as u64);
        for tx in &self.transactions {
            if tx.id(codec) == *tx_id {
                return Some(offset as u32);
            }
            offset += tx.serialized_size(codec.tx_format);
        }
        None
    }

    pub fn serialized_size(&self, codec: &ChainCodec) -> usize {
        HEADER_SIZE
            + varint_size(self.transactions.len() as u64)
            + self.transactions.iter().map(|tx| tx.serialized_size(codec.tx_format)).sum::<usize>()
    }

    /// Header and transactions; the signature is carried separately
    pub fn encode_into<W: Write>(&self, w: &mut W, codec: &ChainCodec) -> io::Result<()> {
        w.write_all(&self.header.encode())?;
        write_varint(w, self.transactions.len() as u64)?;
        for tx in &self.transactions {
            tx.encode_into(w, codec.tx_format)?;
        }
        Ok(())
    }

    pub fn decode(r: &mut Reader, codec: &ChainCodec) -> ConsensusResult<Self> {
        let header = Header::decode(r)?;
        let n = r.read_len()?;
        let mut transactions = Vec::with_capacity(n);
        for _ in 0..n {
            transactions.push(Transaction::decode(r, codec.tx_format)?);
        }
        Ok(Self::new(header, transactions, Vec::new()))
    }
}
