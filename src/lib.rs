//! A segmented sieve of Eratosthenes with wheel factorization, for counting,
//! printing and streaming primes and prime k-tuplets (twins through
//! septuplets) in arbitrary intervals up to 2^64 - 1.
//!
//! Candidates live in a byte-per-30-integers bit sieve; multiples of 7..19
//! are stamped out by a precomputed pattern, and three cross-off engines
//! handle the remaining sieving primes by magnitude: unrolled mod-30
//! rotations for small primes, three-lane mod-210 stepping for medium
//! primes, and segment-indexed buckets for the large primes that rarely
//! fire. Intervals fan out across threads by partitioning into disjoint
//! sub-intervals with fully private sieve state.
//!
//! # Examples
//!
//! ```
//! assert_eq!(ksieve::count_primes(1, 100).unwrap(), 25);
//! assert_eq!(ksieve::count_twins(1, 100).unwrap(), 8);
//! assert_eq!(ksieve::nth_prime(25, 0).unwrap(), 97);
//!
//! let primes = ksieve::generate_primes(90, 100).unwrap();
//! assert_eq!(primes, vec![97]);
//! ```

mod erat;
mod error;
mod flags;
mod nth;
mod presieve;
mod scan;
mod sieving_primes;
mod status;
mod wheel;

use std::io::Write;
use std::ops::ControlFlow;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use erat::Erat;
use presieve::PreSieve;
use scan::Task;

pub use error::Error;
pub use flags::{Flags, KINDS};
pub use nth::nth_prime;
pub use status::SieveStatus;

/// Smallest accepted sieve size in bytes.
pub const MIN_SIEVE_SIZE: usize = 8 * 1024;
/// Largest accepted sieve size in bytes; the packed multiple-index field
/// relies on this bound.
pub const MAX_SIEVE_SIZE: usize = 4096 * 1024;

/// Below this interval width, thread fan-out costs more than it saves.
const MIN_THREAD_SPAN: u64 = 1 << 22;

/// A configured sieve run: set size, threads and task flags, then call
/// [`PrimeSieve::sieve`] and read the tallies back.
///
/// ```
/// use ksieve::{Flags, PrimeSieve};
///
/// let mut ps = PrimeSieve::new();
/// ps.set_flags(Flags::COUNT_PRIMES | Flags::COUNT_TWINS);
/// ps.sieve(1, 1000).unwrap();
/// assert_eq!(ps.count(0), 168);
/// assert_eq!(ps.count(1), 35);
/// ```
pub struct PrimeSieve {
    sieve_size: usize,
    threads: usize,
    flags: Flags,
    counts: [u64; KINDS],
    seconds: f64,
    status: Arc<SieveStatus>,
}

impl Default for PrimeSieve {
    fn default() -> PrimeSieve {
        PrimeSieve::new()
    }
}

impl PrimeSieve {
    /// A sieve with the default task (count primes), a sieve size matched
    /// to the L2 cache and one worker per core.
    pub fn new() -> PrimeSieve {
        PrimeSieve {
            sieve_size: default_sieve_size(),
            threads: rayon::current_num_threads(),
            flags: Flags::COUNT_PRIMES,
            counts: [0; KINDS],
            seconds: 0.0,
            status: Arc::new(SieveStatus::new()),
        }
    }

    /// Set the segment buffer size in bytes. Validated on `sieve()`; the
    /// size is rounded down to a multiple of 240 internally.
    pub fn set_sieve_size(&mut self, bytes: usize) {
        self.sieve_size = bytes;
    }

    pub fn sieve_size(&self) -> usize {
        self.sieve_size
    }

    /// Set how many sub-intervals counting work is split into. Printing and
    /// callback tasks always run on a single worker so their output stays
    /// in ascending order.
    pub fn set_num_threads(&mut self, threads: usize) {
        self.threads = threads.max(1);
    }

    pub fn num_threads(&self) -> usize {
        self.threads
    }

    pub fn set_flags(&mut self, flags: Flags) {
        self.flags = flags;
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Shared progress handle; readable while `sieve()` runs on another
    /// thread.
    pub fn status(&self) -> Arc<SieveStatus> {
        Arc::clone(&self.status)
    }

    /// Tallies of the last run, indexed by kind (0 = primes .. 6 =
    /// septuplets).
    pub fn counts(&self) -> &[u64; KINDS] {
        &self.counts
    }

    pub fn count(&self, kind: usize) -> u64 {
        self.counts[kind]
    }

    /// Wall-clock seconds of the last run.
    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    /// Sieve `[start, stop]` and record the tallies selected by the flags.
    pub fn sieve(&mut self, start: u64, stop: u64) -> Result<(), Error> {
        self.sieve_with(start, stop, None, None)
    }

    /// Like [`PrimeSieve::sieve`], but also honor the PRINT flags, writing
    /// one prime or one parenthesized k-tuplet per line in ascending order.
    /// Runs on a single worker.
    pub fn sieve_to(&mut self, start: u64, stop: u64, out: &mut dyn Write) -> Result<(), Error> {
        self.sieve_with(start, stop, None, Some(out))
    }

    fn sieve_with<'a>(
        &mut self,
        start: u64,
        stop: u64,
        callback: Option<&'a mut dyn FnMut(u64) -> ControlFlow<()>>,
        out: Option<&'a mut dyn Write>,
    ) -> Result<(), Error> {
        if start > stop {
            return Err(Error::InvalidInterval { start, stop });
        }
        if !(MIN_SIEVE_SIZE..=MAX_SIEVE_SIZE).contains(&self.sieve_size) {
            return Err(Error::InvalidSieveSize(self.sieve_size));
        }
        if self.flags.print_targets() > 1 {
            return Err(Error::InvalidFlags("at most one print target"));
        }

        let started = Instant::now();
        self.counts = [0; KINDS];
        let sieve_size = self.sieve_size / 240 * 240;
        let pre = Arc::new(PreSieve::new());
        let stop_flag = AtomicBool::new(false);

        let serial = callback.is_some()
            || out.is_some()
            || self.threads == 1
            || stop - start < MIN_THREAD_SPAN;

        if serial {
            let mut task = Task::new(self.flags, start, stop, callback, out);
            let mut worker = Erat::new(start, stop, sieve_size, pre);
            self.status.set_total(worker.total_bytes());
            match worker.run(&mut task, &self.status, &stop_flag) {
                // A callback stop is cooperative: partial tallies are
                // discarded, the caller has what its callback saw.
                Ok(()) => self.counts = task.counts,
                Err(Error::Interrupted) => {}
                Err(e) => return Err(e),
            }
        } else {
            let chunks = partition(start, stop, self.threads);
            let total = chunks
                .iter()
                .map(|&(a, b)| Erat::interval_bytes(a, b))
                .sum();
            self.status.set_total(total);
            let tallies = chunks
                .par_iter()
                .map(|&(a, b)| {
                    let mut task = Task::new(self.flags, a, b, None, None);
                    let mut worker = Erat::new(a, b, sieve_size, Arc::clone(&pre));
                    worker.run(&mut task, &self.status, &stop_flag)?;
                    Ok(task.counts)
                })
                .collect::<Result<Vec<[u64; KINDS]>, Error>>()?;
            for t in tallies {
                for (total, part) in self.counts.iter_mut().zip(t) {
                    *total += part;
                }
            }
        }

        self.seconds = started.elapsed().as_secs_f64();
        Ok(())
    }
}

/// Split `[start, stop]` into up to `parts` disjoint sub-intervals with
/// boundaries aligned to multiples of 30. Tallies are additive across any
/// such partition, so each part can be sieved independently.
fn partition(start: u64, stop: u64, parts: usize) -> Vec<(u64, u64)> {
    let span = stop as u128 - start as u128 + 1;
    let parts = parts.max(1).min((span / MIN_THREAD_SPAN as u128).max(1) as usize);
    let mut chunks = Vec::with_capacity(parts);
    let mut low = start;
    for i in 1..=parts {
        let cut = if i == parts {
            stop
        } else {
            let raw = start as u128 + span * i as u128 / parts as u128;
            let aligned = (raw - raw % 30) as u64;
            aligned.saturating_sub(1).clamp(low, stop)
        };
        if cut < low {
            continue;
        }
        chunks.push((low, cut));
        if cut == stop {
            break;
        }
        low = cut + 1;
    }
    chunks
}

fn default_sieve_size() -> usize {
    cache_size::l2_cache_size()
        .unwrap_or(256 * 1024)
        .clamp(MIN_SIEVE_SIZE, MAX_SIEVE_SIZE)
}

fn count_kind(kind: usize, start: u64, stop: u64) -> Result<u64, Error> {
    let mut ps = PrimeSieve::new();
    ps.set_flags(Flags::count(kind));
    ps.sieve(start, stop)?;
    Ok(ps.count(kind))
}

/// Count the primes in `[start, stop]`.
pub fn count_primes(start: u64, stop: u64) -> Result<u64, Error> {
    count_kind(0, start, stop)
}

/// Count the twin primes (p, p+2) with p in `[start, stop]`.
pub fn count_twins(start: u64, stop: u64) -> Result<u64, Error> {
    count_kind(1, start, stop)
}

/// Count the prime triplets with first member in `[start, stop]`.
pub fn count_triplets(start: u64, stop: u64) -> Result<u64, Error> {
    count_kind(2, start, stop)
}

/// Count the prime quadruplets with first member in `[start, stop]`.
pub fn count_quadruplets(start: u64, stop: u64) -> Result<u64, Error> {
    count_kind(3, start, stop)
}

/// Count the prime quintuplets with first member in `[start, stop]`.
pub fn count_quintuplets(start: u64, stop: u64) -> Result<u64, Error> {
    count_kind(4, start, stop)
}

/// Count the prime sextuplets with first member in `[start, stop]`.
pub fn count_sextuplets(start: u64, stop: u64) -> Result<u64, Error> {
    count_kind(5, start, stop)
}

/// Count the prime septuplets with first member in `[start, stop]`.
pub fn count_septuplets(start: u64, stop: u64) -> Result<u64, Error> {
    count_kind(6, start, stop)
}

/// Visit every prime in `[start, stop]` in ascending order. Returning
/// `ControlFlow::Break(())` stops the stream; no further invocations
/// happen after that.
pub fn for_each_prime(
    start: u64,
    stop: u64,
    mut f: impl FnMut(u64) -> ControlFlow<()>,
) -> Result<(), Error> {
    let mut ps = PrimeSieve::new();
    ps.set_flags(Flags::CALLBACK_PRIMES);
    ps.set_num_threads(1);
    let mut cb = |v: u64| f(v);
    ps.sieve_with(start, stop, Some(&mut cb), None)
}

/// Collect every prime in `[start, stop]` in ascending order.
pub fn generate_primes(start: u64, stop: u64) -> Result<Vec<u64>, Error> {
    let mut primes = Vec::new();
    for_each_prime(start, stop, |p| {
        primes.push(p);
        ControlFlow::Continue(())
    })?;
    Ok(primes)
}

/// Print every prime in `[start, stop]` to the writer, one per line.
pub fn print_primes(start: u64, stop: u64, out: &mut dyn Write) -> Result<(), Error> {
    let mut ps = PrimeSieve::new();
    ps.set_flags(Flags::PRINT_PRIMES);
    ps.sieve_to(start, stop, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors() {
        assert!(matches!(
            count_primes(10, 9),
            Err(Error::InvalidInterval { .. })
        ));
        let mut ps = PrimeSieve::new();
        ps.set_sieve_size(100);
        assert!(matches!(ps.sieve(0, 10), Err(Error::InvalidSieveSize(100))));
        let mut ps = PrimeSieve::new();
        ps.set_flags(Flags::PRINT_PRIMES | Flags::PRINT_TWINS);
        assert!(matches!(ps.sieve(0, 10), Err(Error::InvalidFlags(_))));
    }

    #[test]
    fn single_point_intervals() {
        assert_eq!(count_primes(97, 97).unwrap(), 1);
        assert_eq!(count_primes(98, 98).unwrap(), 0);
        assert_eq!(count_primes(2, 2).unwrap(), 1);
        assert_eq!(count_primes(0, 0).unwrap(), 0);
        assert_eq!(count_primes(1, 1).unwrap(), 0);
    }

    #[test]
    fn partition_covers_interval() {
        for (start, stop, parts) in
            [(0u64, 10_000_000u64, 4usize), (123, 99_999_999, 7), (0, 1 << 23, 2)]
        {
            let chunks = partition(start, stop, parts);
            assert_eq!(chunks.first().unwrap().0, start);
            assert_eq!(chunks.last().unwrap().1, stop);
            for w in chunks.windows(2) {
                assert_eq!(w[0].1 + 1, w[1].0);
            }
        }
    }

    #[test]
    fn callback_stop_discards_counts() {
        let mut seen = Vec::new();
        for_each_prime(1, 1000, |p| {
            seen.push(p);
            if p >= 13 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();
        assert_eq!(seen, vec![2, 3, 5, 7, 11, 13]);
    }

    #[test]
    fn print_output_is_one_value_per_line() {
        let mut buf = Vec::new();
        print_primes(1, 30, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "2\n3\n5\n7\n11\n13\n17\n19\n23\n29\n");
    }
}
