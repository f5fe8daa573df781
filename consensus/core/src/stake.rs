use crate::Hash;
use std::io::{Read, Write};

/// Flag: a proof-of-stake hash follows
pub const FLAG_PROOF_OF_STAKE: u8 = 0x01;
/// Flag reserved for the stake entropy bit; never written, ignored on read
pub const FLAG_ENTROPY_BIT: u8 = 0x02;
/// Flag: a stake modifier follows
pub const FLAG_STAKE_MODIFIER: u8 = 0x04;

/// Stake data persisted with every block of a proof-of-stake chain.
///
/// Layout: one flags byte, then the 32-byte proof-of-stake hash when
/// `FLAG_PROOF_OF_STAKE` is set, then the little-endian 64-bit modifier
/// when `FLAG_STAKE_MODIFIER` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StakeRecord {
    pub proof_of_stake_hash: Option<Hash>,
    pub stake_modifier: Option<u64>,
}

impl StakeRecord {
    pub fn new(proof_of_stake_hash: Option<Hash>, stake_modifier: Option<u64>) -> Self {
        Self { proof_of_stake_hash, stake_modifier }
    }

    pub fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.proof_of_stake_hash.is_some() {
            flags |= FLAG_PROOF_OF_STAKE;
        }
        if self.stake_modifier.is_some() {
            flags |= FLAG_STAKE_MODIFIER;
        }
        flags
    }
}

impl borsh::BorshSerialize for StakeRecord {
    fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&[self.flags()])?;
        if let Some(hash) = &self.proof_of_stake_hash {
            writer.write_all(hash.as_bytes())?;
        }
        if let Some(modifier) = self.stake_modifier {
            writer.write_all(&modifier.to_le_bytes())?;
        }
        Ok(())
    }
}

impl borsh::BorshDeserialize for StakeRecord {
    fn deserialize(buf: &mut &[u8]) -> std::io::Result<Self> {
        let mut flags = [0u8; 1];
        buf.read_exact(&mut flags)?;

        let proof_of_stake_hash = if flags[0] & FLAG_PROOF_OF_STAKE != 0 {
            let mut hash = [0u8; 32];
            buf.read_exact(&mut hash)?;
            Some(Hash::from_bytes(hash))
        } else {
            None
        };

        let stake_modifier = if flags[0] & FLAG_STAKE_MODIFIER != 0 {
            let mut modifier = [0u8; 8];
            buf.read_exact(&mut modifier)?;
            Some(u64::from_le_bytes(modifier))
        } else {
            None
        };

        Ok(StakeRecord { proof_of_stake_hash, stake_modifier })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use borsh::{BorshDeserialize, BorshSerialize};

    #[test]
    fn layout_with_both_fields() {
        let record = StakeRecord::new(Some(Hash::from_le_u64([1, 2, 3, 4])), Some(0x0102030405060708));
        let bytes = record.try_to_vec().unwrap();
        assert_eq!(bytes.len(), 1 + 32 + 8);
        assert_eq!(bytes[0], 0x05);
        assert_eq!(&bytes[1..9], &1u64.to_le_bytes());
        assert_eq!(&bytes[33..], &[8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(StakeRecord::try_from_slice(&bytes).unwrap(), record);
    }

    #[test]
    fn each_field_is_optional() {
        for record in [
            StakeRecord::default(),
            StakeRecord::new(Some(Hash::from_le_u64([9, 0, 0, 0])), None),
            StakeRecord::new(None, Some(0)),
        ] {
            let bytes = record.try_to_vec().unwrap();
            assert_eq!(bytes[0], record.flags());
            assert_eq!(StakeRecord::try_from_slice(&bytes).unwrap(), record);
        }
        assert_eq!(StakeRecord::default().try_to_vec().unwrap(), vec![0]);
    }

    #[test]
    fn entropy_flag_is_ignored() {
        let record = StakeRecord::try_from_slice(&[FLAG_ENTROPY_BIT]).unwrap();
        assert_eq!(record, StakeRecord::default());
    }

    #[test]
    fn truncated_record_fails() {
        assert!(StakeRecord::try_from_slice(&[FLAG_STAKE_MODIFIER, 1, 2]).is_err());
    }
}
