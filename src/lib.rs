// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! A deduplicating binary blob interning pool.
//!
//! ##### About
//!
//! This crate exports a [`Pool`] that stores every distinct byte sequence exactly once
//! in a contiguous, append-only data buffer, and hands out the blob's offset in that
//! buffer as its identifier.
//!
//! Interning byte-identical data again returns the same offset without copying anything,
//! which makes the pool useful to canonicalize many repeated fragments
//! (strings, serialized records, asset chunks).
//!
//! Lookups and inserts are _O(1)_ expected time: an open addressing hash table using
//! double hashing (two seeded XXH32 hashes) maps blob contents to `(offset, size)` pairs.
//! The table is doubled when it becomes too full; because it only stores offsets, the
//! data buffer is never rewritten, and offsets stay valid for the lifetime of the pool.
//!
//! Blobs can not be removed. The pool is not synchronized; wrap it in a lock to share
//! it between threads.
//!
//! Blobs are limited to `2^32 - 2` bytes in total.
//!
//! ```
//! use upool::{Config, Pool};
//!
//! let mut pool = Config::new().initial_capacity(64).build()?;
//!
//! let a = pool.insert(b"asset chunk")?;
//! let b = pool.insert(b"asset chunk")?;
//! assert_eq!(a.offset, b.offset);
//! assert!(!b.is_new);
//!
//! for (offset, bytes) in &pool {
//!     assert_eq!(Some(bytes), pool.get(offset, bytes.len() as u32));
//! }
//! #
//! # Ok::<(), upool::Error>(())
//! ```

#![deny(clippy::all, missing_docs, clippy::cargo)]
#![allow(clippy::cargo_common_metadata)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::indexing_slicing)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![warn(clippy::multiple_crate_versions)]
#![allow(clippy::option_if_let_else)]
#![warn(clippy::redundant_feature_names)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

/// Configuration
pub mod config;

mod data_buffer;

mod error;

mod hash;

mod key;

#[cfg(feature = "metrics")]
pub(crate) mod metrics;

mod pool;

mod slot_table;

/// Offset of a blob in the data buffer of a [`Pool`]
pub type Offset = u32;

/// Reserved offset that no blob is ever stored at
///
/// Useful to encode a lookup miss as a flat `u32`:
///
/// ```
/// # let pool = upool::Pool::default();
/// let offset = pool.lookup("missing").unwrap_or(upool::NULL_OFFSET);
/// assert_eq!(upool::NULL_OFFSET, offset);
/// ```
pub const NULL_OFFSET: Offset = Offset::MAX;

pub use {
    config::Config,
    error::{Error, Result},
    pool::{Insertion, Iter, Pool},
};

#[cfg(feature = "metrics")]
pub use metrics::Metrics;
