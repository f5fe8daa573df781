//!
//! # Transaction
//!
//! Consensus [`Transaction`] structure, its inputs and outputs and their
//! wire encoding.
//!

use crate::config::params::{ChainCodec, TxFormat};
use crate::encoding::{varint_size, write_blob, write_varint, Reader};
use crate::errors::ConsensusResult;
use crate::Hash;
use once_cell::sync::OnceCell;
use std::io::{self, Write};

/// Script opcode closing a pay-to-pubkey output
pub const OP_CHECKSIG: u8 = 0xac;

/// Reference to a previous transaction output
#[derive(Eq, Default, Hash, PartialEq, Debug, Copy, Clone, PartialOrd, Ord)]
pub struct OutPoint {
    pub tx_hash: Hash,
    pub index: u32,
}

impl OutPoint {
    pub fn new(tx_hash: Hash, index: u32) -> Self {
        Self { tx_hash, index }
    }

    /// The outpoint carried by a coinbase input
    pub fn null() -> Self {
        Self { tx_hash: Hash::zeroed(), index: u32::MAX }
    }

    pub fn is_null(&self) -> bool {
        self.tx_hash.is_zero() && self.index == u32::MAX
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIn {
    pub prev_out: OutPoint,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

impl TxIn {
    pub fn new(prev_out: OutPoint, script_sig: Vec<u8>) -> Self {
        Self { prev_out, script_sig, sequence: u32::MAX }
    }

    fn encode_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(self.prev_out.tx_hash.as_bytes())?;
        w.write_all(&self.prev_out.index.to_le_bytes())?;
        write_blob(w, &self.script_sig)?;
        w.write_all(&self.sequence.to_le_bytes())
    }

    fn decode(r: &mut Reader) -> ConsensusResult<Self> {
        let tx_hash = r.read_hash()?;
        let index = r.read_u32()?;
        let script_sig = r.read_blob()?;
        let sequence = r.read_u32()?;
        Ok(Self { prev_out: OutPoint::new(tx_hash, index), script_sig, sequence })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOut {
    pub value: i64,
    pub script_pubkey: Vec<u8>,
}

impl TxOut {
    pub fn new(value: i64, script_pubkey: Vec<u8>) -> Self {
        Self { value, script_pubkey }
    }

    /// The zero-value, empty-script output that marks a coinstake
    pub fn empty() -> Self {
        Self { value: 0, script_pubkey: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.value == 0 && self.script_pubkey.is_empty()
    }

    /// `<pubkey> OP_CHECKSIG`
    pub fn pay_to_pubkey(value: i64, pubkey: &[u8]) -> Self {
        let mut script = Vec::with_capacity(pubkey.len() + 2);
        script.push(pubkey.len() as u8);
        script.extend_from_slice(pubkey);
        script.push(OP_CHECKSIG);
        Self { value, script_pubkey: script }
    }

    /// Public key of a pay-to-pubkey output with a 33 or 65 byte key
    pub fn pubkey(&self) -> Option<&[u8]> {
        let s = &self.script_pubkey;
        let len = *s.first()? as usize;
        if (len == 33 || len == 65) && s.len() == len + 2 && s[len + 1] == OP_CHECKSIG {
            Some(&s[1..=len])
        } else {
            None
        }
    }

    fn encode_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.value.to_le_bytes())?;
        write_blob(w, &self.script_pubkey)
    }

    fn decode(r: &mut Reader) -> ConsensusResult<Self> {
        let value = r.read_i64()?;
        let script_pubkey = r.read_blob()?;
        Ok(Self { value, script_pubkey })
    }
}

/// A chain transaction.
///
/// The id and the coin age are memoized on first access; both are pure
/// functions of the contents (and, for coin age, of confirmed chain
/// history). Contents are fixed at construction and only readable through
/// accessors; build a new transaction to change them.
#[derive(Debug, Clone)]
pub struct Transaction {
    version: i32,
    /// Only encoded by [`TxFormat::Timestamped`] chains
    time: u32,
    inputs: Vec<TxIn>,
    outputs: Vec<TxOut>,
    lock_time: u32,
    id: OnceCell<Hash>,
    coin_age: OnceCell<u64>,
}

impl Transaction {
    pub fn new(version: i32, time: u32, inputs: Vec<TxIn>, outputs: Vec<TxOut>, lock_time: u32) -> Self {
        Self { version, time, inputs, outputs, lock_time, id: OnceCell::new(), coin_age: OnceCell::new() }
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn time(&self) -> u32 {
        self.time
    }

    pub fn inputs(&self) -> &[TxIn] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TxOut] {
        &self.outputs
    }

    pub fn lock_time(&self) -> u32 {
        self.lock_time
    }

    /// Contents by value, dropping the memoized id and coin age
    pub fn into_parts(self) -> (i32, u32, Vec<TxIn>, Vec<TxOut>, u32) {
        (self.version, self.time, self.inputs, self.outputs, self.lock_time)
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prev_out.is_null()
    }

    /// A coinstake spends real inputs and opens with an empty output
    pub fn is_coinstake(&self) -> bool {
        !self.inputs.is_empty()
            && !self.inputs[0].prev_out.is_null()
            && self.outputs.len() >= 2
            && self.outputs[0].is_empty()
    }

    /// Transaction id. The first codec seen wins; a transaction belongs to
    /// exactly one chain.
    pub fn id(&self, codec: &ChainCodec) -> Hash {
        *self.id.get_or_init(|| codec.message_hash.digest(&self.encode(codec.tx_format)))
    }

    /// Returns the memoized coin age, computing it with `compute` once.
    pub fn coin_age_with<F>(&self, compute: F) -> ConsensusResult<u64>
    where
        F: FnOnce() -> ConsensusResult<u64>,
    {
        self.coin_age.get_or_try_init(compute).copied()
    }

    pub fn cached_coin_age(&self) -> Option<u64> {
        self.coin_age.get().copied()
    }

    /// Sum of output values; `None` on overflow
    pub fn value_out(&self) -> Option<i64> {
        self.outputs.iter().try_fold(0i64, |acc, o| acc.checked_add(o.value))
    }

    pub fn encode_into<W: Write>(&self, w: &mut W, format: TxFormat) -> io::Result<()> {
        w.write_all(&self.version.to_le_bytes())?;
        if format == TxFormat::Timestamped {
            w.write_all(&self.time.to_le_bytes())?;
        }
        write_varint(w, self.inputs.len() as u64)?;
        for input in &self.inputs {
            input.encode_into(w)?;
        }
        write_varint(w, self.outputs.len() as u64)?;
        for output in &self.outputs {
            output.encode_into(w)?;
        }
        w.write_all(&self.lock_time.to_le_bytes())
    }

    pub fn encode(&self, format: TxFormat) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_size(format));
        // writing into a Vec cannot fail
        let _ = self.encode_into(&mut buf, format);
        buf
    }

    pub fn serialized_size(&self, format: TxFormat) -> usize {
        let mut size = 4 + 4 + varint_size(self.inputs.len() as u64) + varint_size(self.outputs.len() as u64);
        if format == TxFormat::Timestamped {
            size += 4;
        }
        for input in &self.inputs {
            size += 32 + 4 + varint_size(input.script_sig.len() as u64) + input.script_sig.len() + 4;
        }
        for output in &self.outputs {
            size += 8 + varint_size(output.script_pubkey.len() as u64) + output.script_pubkey.len();
        }
        size
    }

    pub fn decode(r: &mut Reader, format: TxFormat) -> ConsensusResult<Self> {
        let version = r.read_i32()?;
        let time = if format == TxFormat::Timestamped { r.read_u32()? } else { 0 };
        let n_in = r.read_len()?;
        let mut inputs = Vec::with_capacity(n_in);
        for _ in 0..n_in {
            inputs.push(TxIn::decode(r)?);
        }
        let n_out = r.read_len()?;
        let mut outputs = Vec::with_capacity(n_out);
        for _ in 0..n_out {
            outputs.push(TxOut::decode(r)?);
        }
        let lock_time = r.read_u32()?;
        Ok(Self::new(version, time, inputs, outputs, lock_time))
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.time == other.time
            && self.inputs == other.inputs
            && self.outputs == other.outputs
            && self.lock_time == other.lock_time
    }
}

impl Eq for Transaction {}
