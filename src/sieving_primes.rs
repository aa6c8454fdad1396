//! Generation of the sieving primes.
//!
//! The main sieve needs every prime up to the square root of its stop bound,
//! in ascending order and on demand. This is itself a (much smaller) sieving
//! problem, so it runs as a two-level sieve: a bitmap over [0, limit^(1/2)]
//! supplies the base primes, and fixed-size bitmap segments cover the rest of
//! [0, limit]. With stop < 2^64 the limit never exceeds 2^32, so the base
//! level stays under 64 KiB and each segment is a 32 KiB bitmap.

use bitvec::prelude::*;

/// Numbers per inner segment.
const SEGMENT_SPAN: u64 = 1 << 18;

/// Integer square root, exact over the full u64 range.
pub(crate) fn isqrt(n: u64) -> u64 {
    let mut r = (n as f64).sqrt() as u64;
    while r > 0 && r.checked_mul(r).map_or(true, |sq| sq > n) {
        r -= 1;
    }
    while (r + 1).checked_mul(r + 1).is_some_and(|sq| sq <= n) {
        r += 1;
    }
    r
}

/// An iterator over all primes in [2, limit], ascending.
pub struct SievingPrimes {
    limit: u64,
    sqrt_limit: u64,
    base_primes: Vec<u32>,
    state: State,
}

enum State {
    Base(usize),
    Segmented {
        segment_start: u64,
        segment: BitVec<u64, Lsb0>,
        pos: usize,
    },
}

impl SievingPrimes {
    pub fn new(limit: u64) -> SievingPrimes {
        let sqrt_limit = isqrt(limit);

        let mut base_sieve = bitvec![u8, Lsb0; 1; (sqrt_limit + 2) as usize];
        base_sieve.set(0, false);
        base_sieve.set(1, false);
        for i in 2..=isqrt(sqrt_limit) {
            if base_sieve[i as usize] {
                for j in (i * i..=sqrt_limit).step_by(i as usize) {
                    base_sieve.set(j as usize, false);
                }
            }
        }
        let base_primes: Vec<u32> = base_sieve
            .iter_ones()
            .map(|i| i as u32)
            .take_while(|&p| p as u64 <= sqrt_limit)
            .collect();

        SievingPrimes {
            limit,
            sqrt_limit,
            base_primes,
            state: State::Base(0),
        }
    }

    /// Sieve [start, end) against the base primes; a set bit marks a composite.
    fn sieve_segment(start: u64, end: u64, base_primes: &[u32]) -> BitVec<u64, Lsb0> {
        let mut segment = bitvec![u64, Lsb0; 0; (end - start) as usize];
        for &p in base_primes {
            let p = p as u64;
            if p * p >= end {
                break;
            }
            let mut m = p * p;
            if m < start {
                m = (start + p - 1) / p * p;
            }
            while m < end {
                segment.set((m - start) as usize, true);
                m += p;
            }
        }
        segment
    }
}

impl Iterator for SievingPrimes {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        loop {
            match &mut self.state {
                State::Base(index) => {
                    if *index < self.base_primes.len() {
                        let prime = self.base_primes[*index] as u64;
                        *index += 1;
                        if prime > self.limit {
                            return None;
                        }
                        return Some(prime);
                    }
                    let segment_start = self.sqrt_limit + 1;
                    if segment_start > self.limit {
                        return None;
                    }
                    let end = (segment_start + SEGMENT_SPAN).min(self.limit + 1);
                    self.state = State::Segmented {
                        segment_start,
                        segment: Self::sieve_segment(segment_start, end, &self.base_primes),
                        pos: 0,
                    };
                }
                State::Segmented { segment_start, segment, pos } => {
                    while *pos < segment.len() {
                        if !segment[*pos] {
                            let prime = *segment_start + *pos as u64;
                            *pos += 1;
                            return Some(prime);
                        }
                        *pos += 1;
                    }
                    let start = *segment_start + segment.len() as u64;
                    if start > self.limit {
                        return None;
                    }
                    let end = (start + SEGMENT_SPAN).min(self.limit + 1);
                    *segment = Self::sieve_segment(start, end, &self.base_primes);
                    *segment_start = start;
                    *pos = 0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isqrt_is_exact() {
        for n in [0u64, 1, 2, 3, 4, 24, 25, 26, 10_000, u32::MAX as u64] {
            let r = isqrt(n);
            assert!(r * r <= n);
            assert!((r + 1).checked_mul(r + 1).map_or(true, |sq| sq > n));
        }
        assert_eq!(isqrt(u64::MAX), u32::MAX as u64);
        assert_eq!(
            isqrt(((1u128 << 32) * (1u128 << 32) - 1) as u64),
            (1u64 << 32) - 1
        );
    }

    #[test]
    fn primes_up_to_100() {
        let primes: Vec<u64> = SievingPrimes::new(100).collect();
        assert_eq!(
            primes,
            vec![
                2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73,
                79, 83, 89, 97
            ]
        );
    }

    #[test]
    fn crosses_inner_segment_boundaries() {
        // 10^6 > SEGMENT_SPAN, so this exercises several segment refills.
        assert_eq!(SievingPrimes::new(1_000_000).count(), 78_498);
    }

    #[test]
    fn tiny_limits() {
        assert_eq!(SievingPrimes::new(0).count(), 0);
        assert_eq!(SievingPrimes::new(1).count(), 0);
        assert_eq!(SievingPrimes::new(2).collect::<Vec<_>>(), vec![2]);
        assert_eq!(SievingPrimes::new(6).collect::<Vec<_>>(), vec![2, 3, 5]);
    }
}
