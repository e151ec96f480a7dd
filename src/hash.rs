// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use xxhash_rust::xxh32::xxh32;

/// Seed of the hash that selects the home slot
pub const PRIMARY_SEED: u32 = 0;

/// Seed of the hash that derives the probe step
pub const STEP_SEED: u32 = 1;

/// Both hashes of a blob, independent of any table length.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BlobHash {
    pub primary: u32,
    pub step_seed: u32,
}

impl BlobHash {
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self {
            primary: hash32(bytes, PRIMARY_SEED),
            step_seed: hash32(bytes, STEP_SEED),
        }
    }

    /// Home slot in a table of `len` slots.
    ///
    /// `len` must not be zero.
    #[must_use]
    pub fn home(&self, len: u32) -> u32 {
        self.primary % len
    }

    /// Probe step in a table of `len` slots, always odd.
    ///
    /// For power-of-two lengths an odd step is coprime with `len`, so
    /// the probe sequence visits every slot exactly once per cycle.
    ///
    /// `len` must not be zero.
    #[must_use]
    pub fn step(&self, len: u32) -> u32 {
        // NOTE: 0 -> 1, even -> +1
        (self.step_seed % len) | 1
    }
}

pub fn hash32(bytes: &[u8], seed: u32) -> u32 {
    xxh32(bytes, seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn hash_seeds_differ() {
        let hash = BlobHash::of(b"foo");
        assert_ne!(hash.primary, hash.step_seed);
        assert_eq!(hash, BlobHash::of(b"foo"));
    }

    #[test]
    fn hash_xxh32_stable() {
        // NOTE: Hashes need to be consistent across machines and compilations
        assert_eq!(0x02CC_5D05, hash32(b"", PRIMARY_SEED));
        assert_ne!(hash32(b"", PRIMARY_SEED), hash32(b"", STEP_SEED));
    }

    #[test]
    fn hash_step_is_odd() {
        for key in [&b"a"[..], b"b", b"item0", b"item1", b"", b"\0\0\0\0"] {
            let hash = BlobHash::of(key);

            for len in [2, 4, 8, 1_024, 1 << 31] {
                let step = hash.step(len);
                assert_eq!(1, step % 2);
                assert!(step < len);
                assert!(hash.home(len) < len);
            }
        }
    }

    #[test]
    fn hash_step_single_slot() {
        let hash = BlobHash::of(b"abc");
        assert_eq!(0, hash.home(1));
        assert_eq!(1, hash.step(1));
    }

    #[test]
    fn hash_step_zero_seed() {
        let hash = BlobHash {
            primary: 0,
            step_seed: 16,
        };
        assert_eq!(1, hash.step(16));
        assert_eq!(1, hash.step(8));
        assert_eq!(17, hash.step(32));
    }
}
