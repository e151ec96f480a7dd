// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::collections::TryReserveError;

/// Represents errors that can occur in the blob pool
#[derive(Debug)]
pub enum Error {
    /// Growing the data buffer or the slot table failed
    Allocation(TryReserveError),

    /// Appending the blob would leave the addressable offset range
    DataOverflow {
        /// Bytes already stored in the data buffer
        len: usize,

        /// Size of the blob that was rejected
        size: usize,
    },

    /// The slot table can not grow past the given length
    CapacityOverflow(u32),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UpoolError: {self:?}")
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Allocation(e) => Some(e),
            Self::DataOverflow { .. } | Self::CapacityOverflow(_) => None,
        }
    }
}

impl From<TryReserveError> for Error {
    fn from(value: TryReserveError) -> Self {
        Self::Allocation(value)
    }
}

/// Pool result
pub type Result<T> = std::result::Result<T, Error>;
