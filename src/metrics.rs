// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::Relaxed;

/// Runtime counters of a pool
#[derive(Debug, Default)]
pub struct Metrics {
    /// Number of lookups that were performed
    pub(crate) lookups: AtomicUsize,

    /// Number of lookups that found their blob
    pub(crate) lookup_hits: AtomicUsize,

    /// Number of inserts that were performed
    pub(crate) inserts: AtomicUsize,

    /// Number of inserts that returned an already stored blob
    pub(crate) insert_hits: AtomicUsize,

    /// Number of times the slot table was doubled
    pub(crate) resizes: AtomicUsize,

    /// Number of probe sequences that visited every slot without finding a vacant one
    pub(crate) exhausted_probes: AtomicUsize,
}

impl Metrics {
    pub(crate) fn record(counter: &AtomicUsize) {
        counter.fetch_add(1, Relaxed);
    }
}

#[allow(clippy::cast_precision_loss)]
impl Metrics {
    /// Number of lookups that were performed.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Relaxed)
    }

    /// Number of inserts that were performed.
    pub fn inserts(&self) -> usize {
        self.inserts.load(Relaxed)
    }

    /// Number of times the slot table was doubled.
    pub fn resizes(&self) -> usize {
        self.resizes.load(Relaxed)
    }

    /// Number of inserts that had to resize because the table was full.
    pub fn exhausted_probes(&self) -> usize {
        self.exhausted_probes.load(Relaxed)
    }

    /// Ratio of lookups that found their blob (0.0 - 1.0).
    pub fn lookup_hit_rate(&self) -> f64 {
        let queries = self.lookups() as f64;
        let hits = self.lookup_hits.load(Relaxed) as f64;
        hits / queries
    }

    /// Ratio of inserts that were deduplicated (0.0 - 1.0).
    pub fn dedup_rate(&self) -> f64 {
        let inserts = self.inserts() as f64;
        let hits = self.insert_hits.load(Relaxed) as f64;
        hits / inserts
    }
}
