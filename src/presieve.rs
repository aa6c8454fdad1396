//! Pre-sieving of the smallest wheel-external primes.
//!
//! Multiples of 7, 11, 13, 17 and 19 are crossed off once into a periodic
//! pattern; seeding a fresh segment is then a cyclic copy instead of five
//! wheel walks. The pattern period is 7*11*13*17*19 = 323323 bytes, the
//! smallest length after which the composite mask repeats byte-for-byte.
//!
//! The pattern clears the first occurrence of each pre-sieved prime as well
//! (position 7 in period zero is the prime 7 itself, but the same byte in
//! every later period is a true multiple). The segment driver credits the
//! primes below 19 and the k-tuplets touching them through a fixed
//! constellation table instead; see `scan::SMALL_CONSTELLATIONS`.

use crate::wheel::{RES_TO_BIT, WHEEL30};

/// Largest prime handled by the pre-sieve pattern.
pub const PRE_SIEVE_LIMIT: u64 = 19;

const PRE_SIEVE_PRIMES: [u64; 5] = [7, 11, 13, 17, 19];
const PATTERN_BYTES: usize = 7 * 11 * 13 * 17 * 19;

pub struct PreSieve {
    pattern: Vec<u8>,
}

impl PreSieve {
    pub fn new() -> PreSieve {
        let mut pattern = vec![0xffu8; PATTERN_BYTES];
        for &p in &PRE_SIEVE_PRIMES {
            // Start the walk at p*1: quotient 1 is spoke 0 of p's sub-wheel.
            let class = RES_TO_BIT[(p % 30) as usize] as usize;
            let mut index = (p / 30) as usize;
            let mut wi = class * 8;
            while index < PATTERN_BYTES {
                let e = &WHEEL30[wi];
                pattern[index] &= e.unset_bit;
                index += (p / 30) as usize * e.next_multiple_factor as usize + e.correct as usize;
                wi = e.next as usize;
            }
        }
        PreSieve { pattern }
    }

    /// Seed a segment starting at `segment_low` (a multiple of 30) with the
    /// pre-sieved composite mask.
    pub fn apply(&self, sieve: &mut [u8], segment_low: u64) {
        let mut src = ((segment_low / 30) % PATTERN_BYTES as u64) as usize;
        let mut written = 0;
        while written < sieve.len() {
            let n = (sieve.len() - written).min(PATTERN_BYTES - src);
            sieve[written..written + n].copy_from_slice(&self.pattern[src..src + n]);
            written += n;
            src = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wheel::RESIDUES;

    fn naive_masked(n: u64) -> bool {
        PRE_SIEVE_PRIMES.iter().any(|&p| n % p == 0)
    }

    #[test]
    fn pattern_matches_naive_divisibility() {
        let pre = PreSieve::new();
        for byte in 0..5000usize {
            for (bit, &r) in RESIDUES.iter().enumerate() {
                let n = byte as u64 * 30 + r as u64;
                let set = pre.pattern[byte] & (1 << bit) != 0;
                assert_eq!(set, !naive_masked(n), "n = {n}");
            }
        }
    }

    #[test]
    fn pattern_matches_naive_at_the_far_end() {
        let pre = PreSieve::new();
        for byte in PATTERN_BYTES - 64..PATTERN_BYTES {
            for (bit, &r) in RESIDUES.iter().enumerate() {
                let n = byte as u64 * 30 + r as u64;
                let set = pre.pattern[byte] & (1 << bit) != 0;
                assert_eq!(set, !naive_masked(n));
            }
        }
    }

    #[test]
    fn apply_wraps_cyclically() {
        let pre = PreSieve::new();
        let low = (PATTERN_BYTES as u64 - 10) * 30;
        let mut seg = vec![0u8; 64];
        pre.apply(&mut seg, low);
        for (k, &b) in seg.iter().enumerate() {
            for (bit, &r) in RESIDUES.iter().enumerate() {
                let n = low + k as u64 * 30 + r as u64;
                assert_eq!(b & (1 << bit) != 0, !naive_masked(n), "n = {n}");
            }
        }
    }
}
