//! Error kinds.
//!
//! Configuration problems are rejected synchronously before any segment
//! work; the sieve itself is deterministic and failure-free afterwards.
//! `Interrupted` is not a failure: it is the cooperative cancellation
//! sentinel a user callback raises, caught by the driver.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid interval: start ({start}) exceeds stop ({stop})")]
    InvalidInterval { start: u64, stop: u64 },

    #[error("sieve size {0} bytes out of range [8 KiB, 4096 KiB]")]
    InvalidSieveSize(usize),

    #[error("conflicting task flags: {0}")]
    InvalidFlags(&'static str),

    #[error("no {nth}th prime {direction} {start} below the sieving bound")]
    NthPrimeOutOfRange {
        nth: u64,
        direction: &'static str,
        start: u64,
    },

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when a user callback breaks out of the stream. Callers of the
    /// public API never see this variant; the driver converts it into a
    /// clean early return.
    #[error("sieving interrupted by callback")]
    Interrupted,
}
