use rand::{rngs::StdRng, Rng, SeedableRng};

/// Deterministic generator for blobs with many repeats
pub struct BlobGen {
    rng: StdRng,
    alphabet: &'static [u8],
    max_len: usize,
}

impl BlobGen {
    #[must_use]
    pub fn new(seed: u64, alphabet: &'static [u8], max_len: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            alphabet,
            max_len,
        }
    }

    /// Returns a blob of 0 to `max_len` bytes drawn from the alphabet.
    pub fn next_blob(&mut self) -> Vec<u8> {
        let len = self.rng.random_range(0..=self.max_len);

        (0..len)
            .map(|_| {
                let idx = self.rng.random_range(0..self.alphabet.len());
                self.alphabet.get(idx).copied().unwrap_or_default()
            })
            .collect()
    }
}
