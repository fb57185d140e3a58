//! Seeded 32-bit hashing of byte sequences.
//!
//! The map reduces every key to bytes (see [`encode`](crate::encode)) and
//! then to a `u32` through a [`ByteHasher`]. Bucket indices are
//! `hash % capacity`, so the seed and the 32-bit width are part of the
//! contract; the algorithm itself is pluggable.

const C1: u32 = 0xcc9e_2d51;
const C2: u32 = 0x1b87_3593;

/// Hashes a byte sequence under a seed.
///
/// Implementations must be pure: the same bytes and seed always produce the
/// same output for the life of the process.
pub trait ByteHasher {
    /// Reduces `bytes` to a 32-bit hash, mixing in `seed`.
    fn hash_bytes(&self, bytes: &[u8], seed: u32) -> u32;
}

impl<H: ByteHasher + ?Sized> ByteHasher for &H {
    #[inline]
    fn hash_bytes(&self, bytes: &[u8], seed: u32) -> u32 {
        (**self).hash_bytes(bytes, seed)
    }
}

/// The 32-bit x86 variant of MurmurHash3.
///
/// This is the default hasher of [`HashMap`](crate::HashMap). Output matches
/// the reference `MurmurHash3_x86_32` bit-for-bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Murmur3;

impl ByteHasher for Murmur3 {
    #[inline]
    fn hash_bytes(&self, bytes: &[u8], seed: u32) -> u32 {
        murmur3_32(bytes, seed)
    }
}

#[inline(always)]
fn mix_block(k: u32) -> u32 {
    k.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2)
}

#[inline(always)]
fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

/// Computes `MurmurHash3_x86_32` of `bytes` with the given `seed`.
///
/// # Examples
///
/// ```rust
/// use chain_map::hash::murmur3_32;
///
/// assert_eq!(murmur3_32(b"", 0), 0);
/// assert_eq!(murmur3_32(&[0x21, 0x43, 0x65, 0x87], 0), 0xF55B_516B);
/// ```
pub fn murmur3_32(bytes: &[u8], seed: u32) -> u32 {
    let mut h = seed;

    let mut blocks = bytes.chunks_exact(4);
    for block in &mut blocks {
        let k = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        h ^= mix_block(k);
        h = h.rotate_left(13).wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = blocks.remainder();
    if !tail.is_empty() {
        let mut k = 0u32;
        for (shift, byte) in tail.iter().enumerate() {
            k ^= u32::from(*byte) << (8 * shift);
        }
        h ^= mix_block(k);
    }

    // Lengths beyond u32::MAX are folded, matching the 32-bit reference.
    h ^= bytes.len() as u32;
    fmix32(h)
}

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// A [`ByteHasher`] backed by foldhash's fast hasher.
        ///
        /// The seed selects a `FixedState`, and the 64-bit result is folded
        /// down to 32 bits. Not compatible with [`Murmur3`] output.
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct FoldHash;

        impl ByteHasher for FoldHash {
            #[inline]
            fn hash_bytes(&self, bytes: &[u8], seed: u32) -> u32 {
                use core::hash::BuildHasher;

                let state = foldhash::fast::FixedState::with_seed(u64::from(seed));
                fold(state.hash_one(bytes))
            }
        }
    }
}

#[allow(dead_code)]
#[inline(always)]
fn fold(h: u64) -> u32 {
    (h ^ (h >> 32)) as u32
}

/// Seed used when no entropy source is compiled in.
pub const FALLBACK_SEED: u32 = 0x9747_b28c;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// Returns a fresh random seed for a new map.
        ///
        /// Drawn from foldhash's per-process randomness, so each call differs.
        pub fn random_seed() -> u32 {
            use core::hash::BuildHasher;

            fold(foldhash::fast::RandomState::default().hash_one(FALLBACK_SEED))
        }
    } else if #[cfg(feature = "std")] {
        /// Returns a fresh random seed for a new map.
        ///
        /// Drawn from the standard library's randomly keyed SipHash state.
        pub fn random_seed() -> u32 {
            use core::hash::BuildHasher;

            fold(std::hash::RandomState::new().hash_one(FALLBACK_SEED))
        }
    } else {
        /// Returns the seed for a new map.
        ///
        /// Without `std` or `foldhash` there is no entropy source, so this is
        /// always [`FALLBACK_SEED`]. Pass an explicit seed to
        /// [`HashMap::with_capacity_seed_and_hasher`](crate::HashMap::with_capacity_seed_and_hasher)
        /// when hashing untrusted keys.
        pub fn random_seed() -> u32 {
            FALLBACK_SEED
        }
    }
}
