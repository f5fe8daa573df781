//! Bitcoin-style consensus serialization.
//!
//! Integers are little-endian, collection lengths and blobs use the
//! CompactSize var-int prefix.

use crate::errors::{ConsensusError, ConsensusResult};
use crate::Hash;
use std::io::{self, Write};

pub fn write_varint<W: Write>(w: &mut W, n: u64) -> io::Result<()> {
    match n {
        0..=0xfc => w.write_all(&[n as u8]),
        0xfd..=0xffff => {
            w.write_all(&[0xfd])?;
            w.write_all(&(n as u16).to_le_bytes())
        }
        0x1_0000..=0xffff_ffff => {
            w.write_all(&[0xfe])?;
            w.write_all(&(n as u32).to_le_bytes())
        }
        _ => {
            w.write_all(&[0xff])?;
            w.write_all(&n.to_le_bytes())
        }
    }
}

pub fn varint_size(n: u64) -> usize {
    match n {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

pub fn write_blob<W: Write>(w: &mut W, data: &[u8]) -> io::Result<()> {
    write_varint(w, data.len() as u64)?;
    w.write_all(data)
}

/// Cursor over a byte slice with typed reads
pub struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn read_bytes(&mut self, n: usize) -> ConsensusResult<&'a [u8]> {
        if self.buf.len() < n {
            return Err(ConsensusError::Encoding(format!("need {} bytes, {} left", n, self.buf.len())));
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn read_array<const N: usize>(&mut self) -> ConsensusResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> ConsensusResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> ConsensusResult<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> ConsensusResult<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> ConsensusResult<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> ConsensusResult<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> ConsensusResult<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    pub fn read_hash(&mut self) -> ConsensusResult<Hash> {
        Ok(Hash::from_bytes(self.read_array()?))
    }

    pub fn read_varint(&mut self) -> ConsensusResult<u64> {
        match self.read_u8()? {
            0xfd => Ok(self.read_u16()? as u64),
            0xfe => Ok(self.read_u32()? as u64),
            0xff => self.read_u64(),
            n => Ok(n as u64),
        }
    }

    /// Reads a length prefix, refusing lengths longer than the remaining input
    pub fn read_len(&mut self) -> ConsensusResult<usize> {
        let n = self.read_varint()?;
        if n > self.buf.len() as u64 {
            return Err(ConsensusError::Encoding(format!("length {} exceeds input", n)));
        }
        Ok(n as usize)
    }

    pub fn read_blob(&mut self) -> ConsensusResult<Vec<u8>> {
        let n = self.read_len()?;
        Ok(self.read_bytes(n)?.to_vec())
    }
}
