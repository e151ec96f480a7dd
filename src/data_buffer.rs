// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{key::BlobKey, Error, NULL_OFFSET};

/// Upper bound of the data buffer length.
///
/// Every offset is smaller than the buffer length after its append,
/// so no blob can ever be stored at [`NULL_OFFSET`].
pub const MAX_DATA_LEN: usize = NULL_OFFSET as usize - 1;

/// Append-only byte store
///
/// Blobs are never moved or rewritten once appended, so a [`BlobKey`]
/// stays valid for the lifetime of the buffer, even if the backing
/// allocation is grown.
#[derive(Debug)]
pub struct DataBuffer {
    buf: Vec<u8>,

    /// Length the buffer may never exceed, at most [`MAX_DATA_LEN`]
    max_len: usize,
}

impl Default for DataBuffer {
    fn default() -> Self {
        Self {
            buf: Vec::new(),
            max_len: MAX_DATA_LEN,
        }
    }
}

impl DataBuffer {
    /// Creates a buffer holding at most `max_len` bytes, with up to
    /// `capacity` bytes preallocated.
    pub fn new(capacity: usize, max_len: usize) -> crate::Result<Self> {
        let max_len = max_len.min(MAX_DATA_LEN);

        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity.min(max_len))?;

        Ok(Self { buf, max_len })
    }

    /// Number of bytes stored
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Appends a blob, returning where it was stored.
    ///
    /// The empty blob occupies one padding byte, so its offset is not shared
    /// with the blob appended after it.
    ///
    /// # Errors
    ///
    /// Returns error if the buffer could not grow, in which case it is left unchanged.
    pub fn append(&mut self, bytes: &[u8]) -> crate::Result<BlobKey> {
        let len = self.buf.len();
        let footprint = bytes.len().max(1);

        let overflow = || Error::DataOverflow {
            len,
            size: bytes.len(),
        };

        if len.checked_add(footprint).is_none_or(|end| end > self.max_len) {
            return Err(overflow());
        }

        let offset = u32::try_from(len).map_err(|_| overflow())?;
        let size = u32::try_from(bytes.len()).map_err(|_| overflow())?;

        self.buf.try_reserve(footprint)?;

        if bytes.is_empty() {
            self.buf.push(0);
        } else {
            self.buf.extend_from_slice(bytes);
        }

        Ok(BlobKey::new(offset, size))
    }

    /// Resolves a blob key to its bytes.
    #[must_use]
    pub fn get(&self, key: BlobKey) -> Option<&[u8]> {
        self.buf.get(key.range())
    }

    /// Returns `true` if the blob at `key` equals `bytes`.
    #[must_use]
    pub fn matches(&self, key: BlobKey, bytes: &[u8]) -> bool {
        key.size as usize == bytes.len() && self.get(key) == Some(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn data_buffer_append() -> crate::Result<()> {
        let mut buf = DataBuffer::default();

        assert_eq!(BlobKey::new(0, 3), buf.append(b"foo")?);
        assert_eq!(BlobKey::new(3, 3), buf.append(b"bar")?);
        assert_eq!(BlobKey::new(6, 3), buf.append(b"foo")?);

        assert_eq!(b"foobarfoo", buf.as_slice());
        assert_eq!(Some(&b"bar"[..]), buf.get(BlobKey::new(3, 3)));

        Ok(())
    }

    #[test]
    fn data_buffer_empty_blob_padding() -> crate::Result<()> {
        let mut buf = DataBuffer::default();

        let empty = buf.append(b"")?;
        let next = buf.append(b"a")?;

        assert_eq!(BlobKey::new(0, 0), empty);
        assert_eq!(BlobKey::new(1, 1), next);
        assert_eq!(Some(&b""[..]), buf.get(empty));
        assert_eq!(2, buf.len());

        Ok(())
    }

    #[test]
    fn data_buffer_matches() -> crate::Result<()> {
        let mut buf = DataBuffer::new(64, MAX_DATA_LEN)?;
        let key = buf.append(b"hello")?;

        assert!(buf.matches(key, b"hello"));
        assert!(!buf.matches(key, b"hellO"));
        assert!(!buf.matches(key, b"hell"));
        assert!(!buf.matches(BlobKey::new(3, 5), b"lo\0\0\0"));

        Ok(())
    }

    #[test]
    fn data_buffer_max_len() -> crate::Result<()> {
        let mut buf = DataBuffer::new(0, 8)?;

        buf.append(b"foobar")?;

        assert!(matches!(
            buf.append(b"xyz"),
            Err(Error::DataOverflow { len: 6, size: 3 }),
        ));
        assert_eq!(b"foobar", buf.as_slice());

        // NOTE: Filling the buffer up to the limit is fine
        assert_eq!(BlobKey::new(6, 2), buf.append(b"ab")?);
        assert_eq!(8, buf.len());

        // NOTE: The empty blob still needs its padding byte
        assert!(matches!(
            buf.append(b""),
            Err(Error::DataOverflow { len: 8, size: 0 }),
        ));
        assert_eq!(8, buf.len());

        Ok(())
    }

    #[test]
    fn data_buffer_max_len_clamped() -> crate::Result<()> {
        let buf = DataBuffer::new(0, usize::MAX)?;
        assert_eq!(MAX_DATA_LEN, buf.max_len);
        Ok(())
    }

    #[test]
    fn data_buffer_out_of_bounds() {
        let buf = DataBuffer::default();
        assert_eq!(None, buf.get(BlobKey::new(0, 1)));
        assert_eq!(Some(&b""[..]), buf.get(BlobKey::new(0, 0)));
    }
}
