// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{data_buffer::DataBuffer, slot_table::Slot, Offset};

/// Iterator over the blobs of a [`Pool`](crate::Pool)
///
/// Yields `(offset, bytes)` in slot table order, which is neither
/// insertion order nor sorted by content.
pub struct Iter<'a> {
    slots: std::slice::Iter<'a, Slot>,
    data: &'a DataBuffer,
    remaining: usize,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(slots: &'a [Slot], data: &'a DataBuffer, len: usize) -> Self {
        Self {
            slots: slots.iter(),
            data,
            remaining: len,
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (Offset, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        for key in self.slots.by_ref().flatten() {
            if let Some(bytes) = self.data.get(*key) {
                self.remaining = self.remaining.saturating_sub(1);
                return Some((key.offset, bytes));
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl std::iter::FusedIterator for Iter<'_> {}
