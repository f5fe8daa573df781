//! Wide integer helpers shared by the retarget and kernel code.
//!
//! Targets live in 256 bits, but the intermediate products of a retarget
//! (`target * timespan`) or of a kernel bound (`target * coin_day_weight`)
//! can overflow that width, so those steps are carried out in 512 bits and
//! narrowed back afterwards.

use std::cmp::Ordering;

pub use primitive_types::{U256, U512};

/// Zero-extends a 256-bit value.
pub fn widen(v: U256) -> U512 {
    let mut bytes = [0u8; 64];
    v.to_little_endian(&mut bytes[..32]);
    U512::from_little_endian(&bytes)
}

/// Narrows a 512-bit value, saturating at `U256::MAX`.
pub fn narrow_saturating(v: U512) -> U256 {
    let mut bytes = [0u8; 64];
    v.to_little_endian(&mut bytes);
    if bytes[32..].iter().any(|b| *b != 0) {
        return U256::MAX;
    }
    U256::from_little_endian(&bytes[..32])
}

/// Computes `floor(value * num / den)` without intermediate overflow.
///
/// Returns `None` when `den` is zero.
pub fn mul_div_floor(value: U256, num: u64, den: u64) -> Option<U256> {
    if den == 0 {
        return None;
    }
    let product = widen(value) * U512::from(num);
    Some(narrow_saturating(product / U512::from(den)))
}

/// `value * factor` evaluated in 512 bits.
pub fn mul_wide(value: U256, factor: u64) -> U512 {
    widen(value) * U512::from(factor)
}

/// One step of the running average used by gravity-well style retargeting:
/// `prev + (cur - prev) / count`, with the signed difference truncated
/// toward zero.
pub fn running_average_step(prev: U256, cur: U256, count: u64) -> U256 {
    if count == 0 {
        return prev;
    }
    match cur.cmp(&prev) {
        Ordering::Equal => prev,
        Ordering::Greater => prev + (cur - prev) / U256::from(count),
        Ordering::Less => prev - (prev - cur) / U256::from(count),
    }
}

/// Lossy conversion used for logging and difficulty ratios.
pub fn to_f64(v: U256) -> f64 {
    let mut out = 0f64;
    for limb in v.0.iter().rev() {
        out = out * 18446744073709551616.0 + *limb as f64;
    }
    out
}
