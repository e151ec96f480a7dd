// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

mod iter;


pub use iter::Iter;

use crate::{
    config::{Config, DEFAULT_MAX_LOAD_FACTOR},
    data_buffer::DataBuffer,
    hash::BlobHash,
    key::BlobKey,
    slot_table::{Probe, SlotTable, MAX_TABLE_LEN},
    Error, Offset,
};

#[cfg(feature = "metrics")]
use crate::metrics::Metrics;

/// Result of [`Pool::insert`]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Insertion {
    /// Offset of the blob in the data buffer
    pub offset: Offset,

    /// `true` if the blob was not stored before
    pub is_new: bool,
}

/// A deduplicating blob interning pool
///
/// Every distinct byte sequence is stored exactly once in an append-only
/// data buffer. Its offset in that buffer identifies it for the whole
/// lifetime of the pool, so interning the same bytes again returns the
/// same offset.
///
/// Lookups use an open addressing hash table with double hashing. The
/// table stores `(offset, size)` pairs only, so growing it never touches
/// the stored bytes.
///
/// # Examples
///
/// ```
/// use upool::Pool;
///
/// let mut pool = Pool::new(8)?;
///
/// let foo = pool.insert("foo")?;
/// assert_eq!(0, foo.offset);
/// assert!(foo.is_new);
///
/// let bar = pool.insert("bar")?;
/// assert_eq!(3, bar.offset);
///
/// let again = pool.insert("foo")?;
/// assert_eq!(0, again.offset);
/// assert!(!again.is_new);
///
/// assert_eq!(2, pool.len());
/// assert_eq!(Some(3), pool.lookup("bar"));
/// assert_eq!(None, pool.lookup("baz"));
/// #
/// # Ok::<(), upool::Error>(())
/// ```
pub struct Pool {
    data: DataBuffer,
    table: SlotTable,

    /// Number of occupied slots
    occupied: u32,

    max_load_factor: f32,

    /// Largest slot table length
    max_capacity: u32,

    #[cfg(feature = "metrics")]
    metrics: Metrics,
}

impl Default for Pool {
    /// Creates a pool without any allocation.
    ///
    /// The slot table is allocated on the first insert.
    fn default() -> Self {
        Self {
            data: DataBuffer::default(),
            table: SlotTable::default(),
            occupied: 0,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            max_capacity: MAX_TABLE_LEN,

            #[cfg(feature = "metrics")]
            metrics: Metrics::default(),
        }
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("len", &self.occupied)
            .field("capacity", &self.table.len())
            .field("data_len", &self.data.len())
            .finish_non_exhaustive()
    }
}

impl<'a> IntoIterator for &'a Pool {
    type Item = (Offset, &'a [u8]);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Rounds a requested slot count up to a valid table length.
fn table_len_for(capacity: u32, max_len: u32) -> crate::Result<u32> {
    if capacity == 0 {
        return Ok(0);
    }

    capacity
        .checked_next_power_of_two()
        .filter(|&len| len <= max_len)
        .ok_or(Error::CapacityOverflow(max_len))
}

/// Builds a table of twice the length of `table`, holding the same blobs.
///
/// The data buffer is not touched, so offsets stay valid.
fn grown(table: &SlotTable, data: &DataBuffer, max_len: u32) -> crate::Result<SlotTable> {
    let new_len = match table.len() {
        0 => 1,
        len if len >= max_len => return Err(Error::CapacityOverflow(max_len)),
        len => len * 2,
    };

    let mut grown = SlotTable::with_len(new_len)?;

    for key in table.iter() {
        let Some(bytes) = data.get(key) else {
            unreachable!("slot {key:?} should reference stored bytes");
        };

        // NOTE: The step depends on the table length, so both hashes are
        // mapped onto the new table again
        let hash = BlobHash::of(bytes);

        // NOTE: Stored blobs are distinct, so no equality checks are needed
        let Some(idx) = grown.find_vacant(&hash) else {
            unreachable!("grown table should have a vacant slot");
        };

        let claimed = grown.claim(idx, key);
        debug_assert!(claimed, "probed slot should be vacant");
    }

    Ok(grown)
}

impl Pool {
    /// Creates a pool with room for `capacity` slots.
    ///
    /// The capacity is rounded up to the next power of two.
    /// A capacity of 0 is valid; the first insert then grows the table.
    ///
    /// # Errors
    ///
    /// Returns error if the capacity is too large, or the allocation failed.
    pub fn new(capacity: u32) -> crate::Result<Self> {
        Config::new().initial_capacity(capacity).build()
    }

    pub(crate) fn with_config(config: Config) -> crate::Result<Self> {
        let len = table_len_for(config.initial_capacity, config.max_capacity)?;

        log::trace!(
            "Creating pool with {len} slots, max load factor {}",
            config.max_load_factor,
        );

        Ok(Self {
            data: DataBuffer::new(config.data_capacity, config.max_data_len)?,
            table: SlotTable::with_len(len)?,
            occupied: 0,
            max_load_factor: config.max_load_factor,
            max_capacity: config.max_capacity,

            #[cfg(feature = "metrics")]
            metrics: Metrics::default(),
        })
    }

    /// Destroys the pool, releasing the data buffer and the slot table.
    ///
    /// Equivalent to dropping it.
    pub fn destroy(self) {
        log::trace!(
            "Destroying pool ({} blobs, {} data bytes)",
            self.occupied,
            self.data.len()
        );
    }

    /// Returns the number of distinct blobs stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.occupied as usize
    }

    /// Returns `true` if no blob is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Returns the number of slots in the slot table.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.table.len() as usize
    }

    /// Returns the number of bytes stored in the data buffer.
    #[must_use]
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// Returns the whole data buffer.
    ///
    /// Offsets returned by [`Pool::insert`] index into this buffer.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    /// Returns the ratio of occupied slots (0.0 - 1.0).
    #[must_use]
    pub fn load_factor(&self) -> f64 {
        if self.table.is_empty() {
            return 0.0;
        }
        f64::from(self.occupied) / f64::from(self.table.len())
    }

    /// Returns the pool counters.
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Resolves `size` bytes starting at `offset`.
    ///
    /// Returns `None` if the range is out of bounds.
    #[must_use]
    pub fn get(&self, offset: Offset, size: u32) -> Option<&[u8]> {
        self.data.get(BlobKey::new(offset, size))
    }

    /// Returns the offset of the blob equal to `bytes`, if it is stored.
    ///
    /// Never modifies the pool.
    #[must_use]
    pub fn lookup<B: AsRef<[u8]>>(&self, bytes: B) -> Option<Offset> {
        let bytes = bytes.as_ref();

        #[cfg(feature = "metrics")]
        Metrics::record(&self.metrics.lookups);

        if self.table.is_empty() {
            return None;
        }

        match self.table.find(&BlobHash::of(bytes), bytes, &self.data) {
            Probe::Found(key) => {
                #[cfg(feature = "metrics")]
                Metrics::record(&self.metrics.lookup_hits);

                Some(key.offset)
            }
            Probe::Vacant(_) | Probe::Exhausted => None,
        }
    }

    /// Returns `true` if a blob equal to `bytes` is stored.
    #[must_use]
    pub fn contains<B: AsRef<[u8]>>(&self, bytes: B) -> bool {
        self.lookup(bytes).is_some()
    }

    /// Interns a blob.
    ///
    /// If an equal blob is already stored, its offset is returned and
    /// nothing is copied. Otherwise the bytes are appended to the data
    /// buffer.
    ///
    /// # Errors
    ///
    /// Returns error if the data buffer or the slot table could not grow,
    /// or would grow past the configured limits.
    /// In that case the pool is left unchanged.
    pub fn insert<B: AsRef<[u8]>>(&mut self, bytes: B) -> crate::Result<Insertion> {
        let bytes = bytes.as_ref();

        #[cfg(feature = "metrics")]
        Metrics::record(&self.metrics.inserts);

        // NOTE: A grown table is only swapped in once the insert can no longer fail.
        // At the max capacity the load factor is exceeded instead, until the table is full
        let mut staged = if self.needs_resize() && self.table.len() < self.max_capacity {
            Some(grown(&self.table, &self.data, self.max_capacity)?)
        } else {
            None
        };

        let hash = BlobHash::of(bytes);

        loop {
            let table = staged.as_ref().unwrap_or(&self.table);

            match table.find(&hash, bytes, &self.data) {
                Probe::Found(key) => {
                    self.commit(staged);

                    #[cfg(feature = "metrics")]
                    Metrics::record(&self.metrics.insert_hits);

                    return Ok(Insertion {
                        offset: key.offset,
                        is_new: false,
                    });
                }
                Probe::Vacant(idx) => {
                    let key = self.data.append(bytes)?;

                    self.commit(staged);

                    let claimed = self.table.claim(idx, key);
                    debug_assert!(claimed, "probed slot should be vacant");

                    self.occupied += 1;

                    return Ok(Insertion {
                        offset: key.offset,
                        is_new: true,
                    });
                }
                Probe::Exhausted => {
                    log::trace!(
                        "No vacant slot in probe sequence of {} slots, growing",
                        table.len(),
                    );

                    #[cfg(feature = "metrics")]
                    Metrics::record(&self.metrics.exhausted_probes);

                    let next = grown(table, &self.data, self.max_capacity)?;
                    staged = Some(next);
                }
            }
        }
    }

    /// Interns every blob, returning the number of blobs that were not stored before.
    ///
    /// # Errors
    ///
    /// Returns error if the data buffer or the slot table could not grow.
    /// Blobs interned before the failing one stay in the pool.
    pub fn insert_all<I, B>(&mut self, blobs: I) -> crate::Result<usize>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut added = 0;

        for blob in blobs {
            if self.insert(blob)?.is_new {
                added += 1;
            }
        }

        Ok(added)
    }

    /// Calls `f(size, bytes)` for every stored blob, in slot table order.
    pub fn for_each<F: FnMut(u32, &[u8])>(&self, mut f: F) {
        for key in self.table.iter() {
            if let Some(bytes) = self.data.get(key) {
                f(key.size, bytes);
            }
        }
    }

    /// Iterates over `(offset, bytes)` of every stored blob, in slot table order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self.table.slots(), &self.data, self.len())
    }

    fn needs_resize(&self) -> bool {
        self.table.is_empty()
            || f64::from(self.occupied)
                > f64::from(self.max_load_factor) * f64::from(self.table.len())
    }

    /// Replaces the slot table with a grown one, if any.
    fn commit(&mut self, staged: Option<SlotTable>) {
        let Some(table) = staged else {
            return;
        };

        log::debug!(
            "Grew slot table from {} to {} slots ({} blobs, {} data bytes)",
            self.table.len(),
            table.len(),
            self.occupied,
            self.data.len(),
        );

        self.table = table;

        #[cfg(feature = "metrics")]
        Metrics::record(&self.metrics.resizes);
    }
}
