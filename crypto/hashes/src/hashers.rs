use serde::{Deserialize, Serialize};

pub trait HasherBase {
    fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self;
}

pub trait Hasher: HasherBase + Clone + Default {
    fn finalize(self) -> crate::Hash;
    fn reset(&mut self);
    #[inline(always)]
    fn hash<A: AsRef<[u8]>>(data: A) -> crate::Hash {
        let mut hasher = Self::default();
        hasher.update(data);
        hasher.finalize()
    }
}

digest_hasher! {
    struct Sha256 => sha2::Sha256, rounds 1,
    struct Sha256d => sha2::Sha256, rounds 2,
    struct Keccak256 => sha3::Keccak256, rounds 1,
}

/// Digest selector carried by chain parameters.
///
/// Chains differ in which function identifies a block and which one is
/// applied to signed messages, so both are configured per currency.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgo {
    #[default]
    Sha256d,
    Sha256,
    Keccak256,
}

impl HashAlgo {
    pub fn digest(&self, data: &[u8]) -> crate::Hash {
        match self {
            HashAlgo::Sha256d => Sha256d::hash(data),
            HashAlgo::Sha256 => Sha256::hash(data),
            HashAlgo::Keccak256 => Keccak256::hash(data),
        }
    }
}

macro_rules! digest_hasher {
    ($(struct $name:ident => $inner:ty, rounds $rounds:literal),+ $(,)? ) => {$(
        #[derive(Clone)]
        pub struct $name($inner);

        impl $name {
            #[inline]
            pub fn new() -> Self {
                Self(<$inner as sha2::Digest>::new())
            }

            pub fn write<A: AsRef<[u8]>>(&mut self, data: A) {
                sha2::Digest::update(&mut self.0, data.as_ref());
            }

            #[inline(always)]
            pub fn finalize(self) -> crate::Hash {
                let mut out = [0u8; 32];
                out.copy_from_slice(sha2::Digest::finalize(self.0).as_slice());
                for _ in 1..$rounds {
                    let again = <$inner as sha2::Digest>::digest(out);
                    out.copy_from_slice(again.as_slice());
                }
                crate::Hash::from_bytes(out)
            }
        }
    impl_hasher!{ struct $name }
    )*};
}

macro_rules! impl_hasher {
    (struct $name:ident) => {
        impl HasherBase for $name {
            #[inline(always)]
            fn update<A: AsRef<[u8]>>(&mut self, data: A) -> &mut Self {
                self.write(data);
                self
            }
        }
        impl Hasher for $name {
            #[inline(always)]
            fn finalize(self) -> crate::Hash {
                $name::finalize(self)
            }
            #[inline(always)]
            fn reset(&mut self) {
                *self = Self::new();
            }
        }
        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

use {digest_hasher, impl_hasher};
