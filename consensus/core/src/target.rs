//! Compact difficulty targets.
//!
//! A target is a 256-bit threshold; a proof hash read as a little-endian
//! integer must not exceed it. Headers carry it in the 32-bit "compact"
//! form: one exponent byte (size in bytes) and a 23-bit mantissa with a
//! sign bit.

use crate::errors::{ConsensusError, ConsensusResult};
use crate::Hash;
use primitive_types::U256;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Target(U256);

impl Target {
    /// The hardest representable target
    pub const HARDEST: Target = Target(U256([1, 0, 0, 0]));

    pub const fn from_u256(value: U256) -> Self {
        Self(value)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    /// Expands compact bits.
    ///
    /// Negative, zero and overflowing encodings are rejected with
    /// [`ConsensusError::BadTargetBits`].
    pub fn from_compact(bits: u32) -> ConsensusResult<Self> {
        let size = bits >> 24;
        let word = bits & 0x007f_ffff;
        let negative = word != 0 && (bits & 0x0080_0000) != 0;
        let overflow = word != 0 && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32));
        if negative || overflow {
            return Err(ConsensusError::BadTargetBits(bits));
        }
        let value = if size <= 3 {
            U256::from(word >> (8 * (3 - size)))
        } else {
            U256::from(word) << (8 * (size - 3)) as usize
        };
        if value.is_zero() {
            return Err(ConsensusError::BadTargetBits(bits));
        }
        Ok(Self(value))
    }

    /// Compresses to compact bits, dropping precision below the mantissa.
    pub fn to_compact(&self) -> u32 {
        let mut size = (self.0.bits() as u32 + 7) / 8;
        let mut compact = if size <= 3 {
            self.0.low_u32() << (8 * (3 - size))
        } else {
            (self.0 >> (8 * (size - 3)) as usize).low_u32()
        };
        // keep the mantissa positive
        if compact & 0x0080_0000 != 0 {
            compact >>= 8;
            size += 1;
        }
        compact | (size << 24)
    }

    /// Returns whether `hash`, read as a little-endian integer, meets this target
    pub fn is_met_by(&self, hash: &Hash) -> bool {
        U256::from_little_endian(hash.as_bytes()) <= self.0
    }

    /// Bounds the target to `[HARDEST, ceiling]`
    pub fn clamp_to(self, ceiling: Target) -> Self {
        self.max(Self::HARDEST).min(ceiling)
    }

    pub fn to_f64(&self) -> f64 {
        chain_math::to_f64(self.0)
    }
}

impl From<U256> for Target {
    fn from(v: U256) -> Self {
        Self(v)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({:#010x})", self.to_compact())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.to_compact())
    }
}

// Serialized in compact form so parameter files read like chain documentation.
impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.to_compact())
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Target::from_compact(bits).map_err(de::Error::custom)
    }
}
