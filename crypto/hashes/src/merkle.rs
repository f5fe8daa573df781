use crate::{HashAlgo, Hash};

/// Computes the merkle root over transaction ids.
///
/// Each level hashes concatenated pairs with `algo`; a level with an odd
/// count pairs its last node with itself. An empty list yields the zero
/// hash.
pub fn merkle_root(algo: HashAlgo, leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return Hash::zeroed();
    }
    let mut level: Vec<Hash> = leaves.to_vec();
    let mut buf = [0u8; 64];
    while level.len() > 1 {
        let mut next = Vec::with_capacity((level.len() + 1) / 2);
        for chunk in level.chunks(2) {
            let (left, right) = match chunk {
                [l, r] => (l, r),
                [single] => (single, single),
                _ => unreachable!(),
            };
            buf[..32].copy_from_slice(left.as_bytes());
            buf[32..].copy_from_slice(right.as_bytes());
            next.push(algo.digest(&buf));
        }
        level = next;
    }
    level[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::double_sha256;
    use hex_literal::hex;

    #[test]
    fn test_empty_tree() {
        assert_eq!(merkle_root(HashAlgo::Sha256d, &[]), Hash::zeroed());
    }

    #[test]
    fn test_single_leaf() {
        let hash = Hash::from(hex!("0000000000000000000000000000000000000000000000000000000000000001"));
        assert_eq!(merkle_root(HashAlgo::Sha256d, &[hash]), hash);
    }

    #[test]
    fn test_odd_level_duplicates_last() {
        let a = Hash::from_le_u64([1, 0, 0, 0]);
        let b = Hash::from_le_u64([2, 0, 0, 0]);
        let c = Hash::from_le_u64([3, 0, 0, 0]);

        let pair = |l: &Hash, r: &Hash| {
            let mut v = l.as_bytes().to_vec();
            v.extend_from_slice(r.as_bytes());
            Hash::from(double_sha256(&v))
        };
        let expected = pair(&pair(&a, &b), &pair(&c, &c));
        assert_eq!(merkle_root(HashAlgo::Sha256d, &[a, b, c]), expected);
    }
}
