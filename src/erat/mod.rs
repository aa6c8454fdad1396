//! The segmented sieve proper: one worker's engines and segment loop.
//!
//! A worker owns a cache-sized segment buffer and three cross-off engines,
//! one per sieving-prime regime. Per segment it pulls the sieving primes
//! whose squares have come into reach, seeds the buffer from the pre-sieve
//! pattern, runs EratSmall, EratMedium and EratBig in that order (hot,
//! cache-resident work first; bucket draining touches outside memory last),
//! and hands the finished composite mask to the scan task.

mod big;
mod medium;
mod small;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::Error;
use crate::presieve::{PreSieve, PRE_SIEVE_LIMIT};
use crate::scan::Task;
use crate::sieving_primes::{isqrt, SievingPrimes};
use crate::status::SieveStatus;
use crate::wheel::{position_prime, WheelElement, INIT210, INIT30, RESIDUES};

use big::EratBig;
use medium::EratMedium;
use small::EratSmall;

/// Primes up to `sieve_size * ERAT_SMALL_FACTOR` go to EratSmall. Tunable;
/// measured sweet spot of the source system.
pub(crate) const ERAT_SMALL_FACTOR: f64 = 0.175;

/// Primes up to `sieve_size * ERAT_MEDIUM_FACTOR` go to EratMedium,
/// everything above to EratBig. Tunable.
pub(crate) const ERAT_MEDIUM_FACTOR: u64 = 5;

/// Widest k-tuplet span (septuplet, first to last member). Sieving runs this
/// far past `stop` so that tuplets anchored at the top of the interval can
/// be observed in full.
pub(crate) const TUPLET_SPAN: u64 = 20;

/// Fire one multiple: clear its bit, advance to the next multiple of the
/// prime with a coprime quotient, move to the next wheel state.
#[inline]
fn unset_bit(
    sieve: &mut [u8],
    prime30: usize,
    index: &mut usize,
    wheel_index: &mut usize,
    wheel: &[WheelElement],
) {
    let e = &wheel[*wheel_index];
    sieve[*index] &= e.unset_bit;
    *index += prime30 * e.next_multiple_factor as usize + e.correct as usize;
    *wheel_index = e.next as usize;
}

/// Clear the bits of all values below `bound`.
pub(crate) fn clear_below(sieve: &mut [u8], low: u64, bound: u64) {
    for (k, byte) in sieve.iter_mut().enumerate() {
        let base = low + 30 * k as u64;
        if base >= bound {
            break;
        }
        if base + 29 < bound {
            *byte = 0;
            continue;
        }
        for (bit, &r) in RESIDUES.iter().enumerate() {
            if base + (r as u64) < bound {
                *byte &= !(1 << bit);
            }
        }
    }
}

/// Clear the bits of all values above `bound`.
pub(crate) fn clear_above(sieve: &mut [u8], low: u64, bound: u64) {
    if bound < low {
        sieve.iter_mut().for_each(|b| *b = 0);
        return;
    }
    let d = bound - low;
    if d / 30 >= sieve.len() as u64 {
        return;
    }
    for (k, byte) in sieve.iter_mut().enumerate().skip((d / 30) as usize) {
        let base = 30 * k as u64;
        if base > d {
            *byte = 0;
            continue;
        }
        for (bit, &r) in RESIDUES.iter().enumerate() {
            if base + r as u64 > d {
                *byte &= !(1 << bit);
            }
        }
    }
}

/// One worker's sieve over an interval `[start, stop]`.
pub(crate) struct Erat {
    start: u64,
    /// Sieving bound: `stop` plus the tuplet lookahead, saturating.
    limit: u64,
    /// Low bound of the current segment, always a multiple of 30.
    low: u64,
    sieve_size: usize,
    bytes_left: u64,
    sieve: Vec<u8>,
    pre: Arc<PreSieve>,
    small: EratSmall,
    medium: EratMedium,
    big: EratBig,
    sieving_primes: SievingPrimes,
    pending_prime: Option<u64>,
    max_small: u64,
    max_medium: u64,
}

impl Erat {
    /// Segment bytes needed to sieve `[start, stop]`, including the tuplet
    /// lookahead past `stop`.
    pub fn interval_bytes(start: u64, stop: u64) -> u64 {
        let limit = stop.saturating_add(TUPLET_SPAN);
        let low = start - start % 30;
        limit / 30 - low / 30 + 1
    }

    pub fn new(start: u64, stop: u64, sieve_size: usize, pre: Arc<PreSieve>) -> Erat {
        let limit = stop.saturating_add(TUPLET_SPAN);
        let low = start - start % 30;
        let total_bytes = Erat::interval_bytes(start, stop);
        let sieve_size = sieve_size.min(total_bytes as usize).max(1);
        let total_segments = total_bytes.div_ceil(sieve_size as u64);
        let max_prime = isqrt(limit);
        Erat {
            start,
            limit,
            low,
            sieve_size,
            bytes_left: total_bytes,
            sieve: vec![0; sieve_size],
            pre,
            small: EratSmall::new(),
            medium: EratMedium::new(),
            big: EratBig::new(sieve_size, max_prime, total_segments),
            sieving_primes: SievingPrimes::new(max_prime),
            pending_prime: None,
            max_small: (sieve_size as f64 * ERAT_SMALL_FACTOR) as u64,
            max_medium: sieve_size as u64 * ERAT_MEDIUM_FACTOR,
        }
    }

    /// Total number of segment bytes this worker will process.
    pub fn total_bytes(&self) -> u64 {
        self.bytes_left
    }

    fn dispatch(&mut self, p: u64) {
        if p <= PRE_SIEVE_LIMIT {
            return;
        }
        let prime30 = (p / 30) as u32;
        if p <= self.max_small {
            if let Some((index, wheel)) = position_prime(p, self.low, self.limit, 30, &INIT30, 8) {
                self.small.store(prime30, index as u32, wheel);
            }
        } else if p <= self.max_medium {
            if let Some((index, wheel)) = position_prime(p, self.low, self.limit, 210, &INIT210, 48)
            {
                self.medium.store(prime30, index as u32, wheel);
            }
        } else if let Some((index, wheel)) =
            position_prime(p, self.low, self.limit, 210, &INIT210, 48)
        {
            self.big.store(prime30, index, wheel);
        }
    }

    /// Sieve every segment of the interval, feeding each finished segment to
    /// the task. `stop_flag` is polled between segments for cooperative
    /// cancellation across workers.
    pub fn run(
        &mut self,
        task: &mut Task<'_>,
        status: &SieveStatus,
        stop_flag: &AtomicBool,
    ) -> Result<(), Error> {
        task.small_constellations()?;
        while self.bytes_left > 0 {
            let len = self.sieve_size.min(self.bytes_left as usize);
            let high = self.low.saturating_add(30 * len as u64 - 1);

            loop {
                let p = match self.pending_prime.take() {
                    Some(p) => p,
                    None => match self.sieving_primes.next() {
                        Some(p) => p,
                        None => break,
                    },
                };
                if (p as u128) * (p as u128) > high as u128 {
                    self.pending_prime = Some(p);
                    break;
                }
                self.dispatch(p);
            }

            let (pre, sieve) = (&self.pre, &mut self.sieve);
            pre.apply(&mut sieve[..len], self.low);
            if self.low < self.start.max(2) {
                clear_below(&mut self.sieve[..len], self.low, self.start.max(2));
            }
            clear_above(&mut self.sieve[..len], self.low, self.limit);

            self.small.cross_off(&mut self.sieve[..len]);
            self.medium.cross_off(&mut self.sieve[..len]);
            self.big.cross_off(&mut self.sieve[..len]);

            task.scan_segment(&mut self.sieve[..len], self.low)?;

            self.bytes_left -= len as u64;
            self.low = self.low.saturating_add(30 * len as u64);
            status.add_processed(len as u64);
            if stop_flag.load(Ordering::Relaxed) {
                return Err(Error::Interrupted);
            }
        }
        task.finish()
    }
}
