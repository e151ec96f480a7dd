// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{data_buffer::MAX_DATA_LEN, slot_table::MAX_TABLE_LEN, Pool};

/// Default number of slots of a new pool
pub const DEFAULT_INITIAL_CAPACITY: u32 = 16;

/// Default ratio of occupied slots that triggers growing the slot table
pub const DEFAULT_MAX_LOAD_FACTOR: f32 = 0.75;

/// Pool configuration builder
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Number of slots allocated up front
    #[doc(hidden)]
    pub initial_capacity: u32,

    /// Load factor above which the slot table is doubled before inserting
    #[doc(hidden)]
    pub max_load_factor: f32,

    /// Bytes reserved up front in the data buffer
    #[doc(hidden)]
    pub data_capacity: usize,

    /// Number of slots the slot table may never grow past
    #[doc(hidden)]
    pub max_capacity: u32,

    /// Number of bytes the data buffer may never grow past
    #[doc(hidden)]
    pub max_data_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            data_capacity: 0,
            max_capacity: MAX_TABLE_LEN,
            max_data_len: MAX_DATA_LEN,
        }
    }
}

impl Config {
    /// Initializes a new config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of slots allocated when the pool is built.
    ///
    /// The capacity is rounded up to the next power of two, so the probe
    /// sequence of every blob covers the whole table.
    /// A capacity of 0 allocates nothing; the first insert grows the table.
    ///
    /// Defaults to 16.
    #[must_use]
    pub fn initial_capacity(mut self, slots: u32) -> Self {
        self.initial_capacity = slots;
        self
    }

    /// Sets the maximum load factor.
    ///
    /// Before inserting, the slot table is doubled if more than
    /// `max_load_factor * capacity` slots are occupied.
    /// A lower value shortens probe sequences at the cost of memory.
    ///
    /// Defaults to 0.75.
    ///
    /// # Panics
    ///
    /// Panics if the ratio is not in `(0.0, 1.0]`.
    #[must_use]
    pub fn max_load_factor(mut self, ratio: f32) -> Self {
        assert!(
            ratio > 0.0 && ratio <= 1.0,
            "max load factor should be in (0.0, 1.0]",
        );
        self.max_load_factor = ratio;
        self
    }

    /// Sets the number of bytes reserved in the data buffer up front.
    ///
    /// Defaults to 0.
    #[must_use]
    pub fn data_capacity(mut self, bytes: usize) -> Self {
        self.data_capacity = bytes;
        self
    }

    /// Sets the largest slot table length.
    ///
    /// Growing the table past this length fails with
    /// [`Error::CapacityOverflow`](crate::Error::CapacityOverflow).
    ///
    /// Defaults to `2^31`, the largest possible table.
    ///
    /// # Panics
    ///
    /// Panics if `slots` is not a power of two, or larger than `2^31`.
    #[must_use]
    pub fn max_capacity(mut self, slots: u32) -> Self {
        assert!(
            slots.is_power_of_two() && slots <= MAX_TABLE_LEN,
            "max capacity should be a power of two up to 2^31",
        );
        self.max_capacity = slots;
        self
    }

    /// Sets the largest number of bytes the data buffer may hold.
    ///
    /// Interning a blob that does not fit anymore fails with
    /// [`Error::DataOverflow`](crate::Error::DataOverflow).
    ///
    /// Defaults to (and is clamped to) `2^32 - 2`.
    #[must_use]
    pub fn max_data_len(mut self, bytes: usize) -> Self {
        self.max_data_len = bytes.min(MAX_DATA_LEN);
        self
    }

    /// Builds the pool.
    ///
    /// # Errors
    ///
    /// Returns error if the initial capacity is too large,
    /// or the initial allocation failed.
    pub fn build(self) -> crate::Result<Pool> {
        Pool::with_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn config_defaults() {
        let config = Config::new();
        assert_eq!(DEFAULT_INITIAL_CAPACITY, config.initial_capacity);
        assert!((config.max_load_factor - 0.75).abs() < f32::EPSILON);
        assert_eq!(0, config.data_capacity);
        assert_eq!(MAX_TABLE_LEN, config.max_capacity);
        assert_eq!(MAX_DATA_LEN, config.max_data_len);
    }

    #[test]
    fn config_builder() {
        let config = Config::new()
            .initial_capacity(100)
            .max_load_factor(0.5)
            .data_capacity(4_096)
            .max_capacity(1_024)
            .max_data_len(usize::MAX);

        assert_eq!(100, config.initial_capacity);
        assert!((config.max_load_factor - 0.5).abs() < f32::EPSILON);
        assert_eq!(4_096, config.data_capacity);
        assert_eq!(1_024, config.max_capacity);
        assert_eq!(MAX_DATA_LEN, config.max_data_len);
    }

    #[test]
    fn config_initial_capacity_above_max() {
        let result = Config::new().initial_capacity(16).max_capacity(8).build();
        assert!(matches!(result, Err(crate::Error::CapacityOverflow(8))));
    }

    #[test]
    #[should_panic(expected = "max capacity should be a power of two up to 2^31")]
    fn config_max_capacity_not_power_of_two() {
        let _ = Config::new().max_capacity(12);
    }

    #[test]
    #[should_panic(expected = "max load factor should be in (0.0, 1.0]")]
    fn config_load_factor_zero() {
        let _ = Config::new().max_load_factor(0.0);
    }

    #[test]
    #[should_panic(expected = "max load factor should be in (0.0, 1.0]")]
    fn config_load_factor_too_large() {
        let _ = Config::new().max_load_factor(1.5);
    }
}
