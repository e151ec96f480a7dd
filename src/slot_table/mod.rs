// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

mod probe;

pub use probe::Probe;

use probe::ProbeSequence;

use crate::{data_buffer::DataBuffer, hash::BlobHash, key::BlobKey};

/// Largest slot table length
///
/// Table lengths are powers of two that fit a `u32` slot index.
pub const MAX_TABLE_LEN: u32 = 1 << 31;

/// A slot is either empty or references a stored blob
pub type Slot = Option<BlobKey>;

/// Open addressing hash table over blob keys
///
/// The table only stores `(offset, size)` pairs; blob bytes live in the
/// [`DataBuffer`], which has to be passed in for equality checks.
#[derive(Debug, Default)]
pub struct SlotTable {
    slots: Box<[Slot]>,
    len: u32,
}

impl SlotTable {
    /// Allocates a table of `len` empty slots.
    ///
    /// # Errors
    ///
    /// Returns error if the allocation failed.
    pub fn with_len(len: u32) -> crate::Result<Self> {
        debug_assert!(len == 0 || len.is_power_of_two());
        debug_assert!(len <= MAX_TABLE_LEN);

        let mut slots = Vec::new();
        slots.try_reserve_exact(len as usize)?;
        slots.resize(len as usize, None);

        Ok(Self {
            slots: slots.into_boxed_slice(),
            len,
        })
    }

    /// Number of slots
    #[must_use]
    pub fn len(&self) -> u32 {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn slot(&self, idx: u32) -> Slot {
        self.slots.get(idx as usize).copied().flatten()
    }

    #[must_use]
    fn probe(&self, hash: &BlobHash) -> ProbeSequence {
        ProbeSequence::new(hash, self.len)
    }

    /// Walks the probe sequence of `bytes`, comparing stored blobs by size
    /// and content.
    #[must_use]
    pub fn find(&self, hash: &BlobHash, bytes: &[u8], data: &DataBuffer) -> Probe {
        for idx in self.probe(hash) {
            match self.slot(idx) {
                None => return Probe::Vacant(idx),
                Some(key) if data.matches(key, bytes) => return Probe::Found(key),
                Some(_) => {}
            }
        }

        Probe::Exhausted
    }

    /// Returns the first vacant slot in the probe sequence, without
    /// comparing any stored blobs.
    #[must_use]
    pub fn find_vacant(&self, hash: &BlobHash) -> Option<u32> {
        self.probe(hash).find(|&idx| self.slot(idx).is_none())
    }

    /// Stores `key` in the vacant slot at `idx`.
    ///
    /// Returns `false` if the slot does not exist or is already occupied.
    pub fn claim(&mut self, idx: u32, key: BlobKey) -> bool {
        match self.slots.get_mut(idx as usize) {
            Some(slot) if slot.is_none() => {
                *slot = Some(key);
                true
            }
            _ => false,
        }
    }

    /// Raw slots, in table order.
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Iterates over occupied slots, in table order.
    pub fn iter(&self) -> impl Iterator<Item = BlobKey> + '_ {
        self.slots.iter().flatten().copied()
    }
}
