//! Progress readback.
//!
//! Workers publish how many segment bytes they have finished; anyone
//! holding the shared handle (the CLI progress bar, a monitoring thread)
//! can read a percentage without synchronizing with the sieve.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct SieveStatus {
    processed_bytes: AtomicU64,
    total_bytes: AtomicU64,
}

impl SieveStatus {
    pub fn new() -> SieveStatus {
        SieveStatus::default()
    }

    pub(crate) fn set_total(&self, bytes: u64) {
        self.total_bytes.store(bytes, Ordering::Relaxed);
        self.processed_bytes.store(0, Ordering::Relaxed);
    }

    pub(crate) fn add_processed(&self, bytes: u64) {
        self.processed_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn processed_bytes(&self) -> u64 {
        self.processed_bytes.load(Ordering::Relaxed)
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::Relaxed)
    }

    /// Percent of the interval sieved so far, in [0.0, 100.0].
    pub fn percent_done(&self) -> f64 {
        let total = self.total_bytes();
        if total == 0 {
            return 100.0;
        }
        100.0 * self.processed_bytes() as f64 / total as f64
    }
}
