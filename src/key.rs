// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::Offset;

/// Location of a blob in the data buffer
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct BlobKey {
    /// Start of the blob in the data buffer
    pub offset: Offset,

    /// Blob length in bytes
    pub size: u32,
}

#[cfg_attr(coverage_nightly, coverage(off))]
impl std::fmt::Debug for BlobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}+{}", self.offset, self.size)
    }
}

impl BlobKey {
    #[must_use]
    pub fn new(offset: Offset, size: u32) -> Self {
        Self { offset, size }
    }

    /// Byte range of the blob in the data buffer.
    #[must_use]
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = self.offset as usize;
        start..(start + self.size as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn blob_key_range() {
        assert_eq!(3..6, BlobKey::new(3, 3).range());
        assert_eq!(7..7, BlobKey::new(7, 0).range());
    }

    #[test]
    fn blob_key_debug() {
        assert_eq!("10+4", format!("{:?}", BlobKey::new(10, 4)));
    }
}
