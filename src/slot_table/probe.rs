// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{hash::BlobHash, key::BlobKey};

/// Outcome of probing the slot table for a blob
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Probe {
    /// An equal blob is already stored
    Found(BlobKey),

    /// The blob is not stored; the slot at this index is the insertion point
    Vacant(u32),

    /// Every slot was visited without finding the blob or a vacant slot
    Exhausted,
}

/// Double hashing probe sequence
///
/// Yields `home, home + step, home + 2 * step, ...` (mod table length)
/// and ends once it would return to `home`.
pub struct ProbeSequence {
    next: Option<u32>,
    start: u32,
    step: u32,
    len: u32,
}

impl ProbeSequence {
    pub fn new(hash: &BlobHash, len: u32) -> Self {
        if len == 0 {
            return Self {
                next: None,
                start: 0,
                step: 1,
                len,
            };
        }

        let start = hash.home(len);

        Self {
            next: Some(start),
            start,
            step: hash.step(len),
            len,
        }
    }
}

impl Iterator for ProbeSequence {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next?;

        // NOTE: idx < len <= 2^31 and step <= len, so this can not overflow
        let next = (idx + self.step) % self.len;
        self.next = (next != self.start).then_some(next);

        Some(idx)
    }
}
