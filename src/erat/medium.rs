//! Cross-off engine for mid-range sieving primes.
//!
//! Medium primes hit a segment only a handful of times, so unrolling one
//! prime's walk buys little. Instead three primes are walked together, one
//! step each per iteration: the three dependency chains are independent, so
//! the loads, masks and index updates of the lanes overlap in the pipeline.
//! Once any lane leaves the segment the remaining lanes drain in scalar
//! tails.
//!
//! The mod-210 wheel does the stepping: 48 spokes skip multiples of 2, 3, 5
//! and 7 in the quotient, roughly halving the steps the mod-30 wheel would
//! take.
//!
//! Records are kept unpacked. At the regime boundary (p = 5 * sieve size)
//! a just-stored multiple index can reach ~2.9x the sieve size, which
//! overflows the 23-bit packed field at the 4 MiB maximum sieve.

use crate::wheel::WHEEL210;

use super::unset_bit;

struct MediumPrime {
    prime30: u32,
    index: u32,
    wheel: u16,
}

pub(crate) struct EratMedium {
    primes: Vec<MediumPrime>,
}

impl EratMedium {
    pub fn new() -> EratMedium {
        EratMedium { primes: Vec::new() }
    }

    pub fn store(&mut self, prime30: u32, multiple_index: u32, wheel_index: u16) {
        self.primes.push(MediumPrime {
            prime30,
            index: multiple_index,
            wheel: wheel_index,
        });
    }

    pub fn cross_off(&mut self, sieve: &mut [u8]) {
        let len = sieve.len();
        let n = self.primes.len();
        let mut i = 0;

        while i + 3 <= n {
            let t0 = self.primes[i].prime30 as usize;
            let t1 = self.primes[i + 1].prime30 as usize;
            let t2 = self.primes[i + 2].prime30 as usize;
            let mut i0 = self.primes[i].index as usize;
            let mut i1 = self.primes[i + 1].index as usize;
            let mut i2 = self.primes[i + 2].index as usize;
            let mut w0 = self.primes[i].wheel as usize;
            let mut w1 = self.primes[i + 1].wheel as usize;
            let mut w2 = self.primes[i + 2].wheel as usize;

            while i0 < len && i1 < len && i2 < len {
                unset_bit(sieve, t0, &mut i0, &mut w0, &WHEEL210);
                unset_bit(sieve, t1, &mut i1, &mut w1, &WHEEL210);
                unset_bit(sieve, t2, &mut i2, &mut w2, &WHEEL210);
            }
            while i0 < len {
                unset_bit(sieve, t0, &mut i0, &mut w0, &WHEEL210);
            }
            while i1 < len {
                unset_bit(sieve, t1, &mut i1, &mut w1, &WHEEL210);
            }
            while i2 < len {
                unset_bit(sieve, t2, &mut i2, &mut w2, &WHEEL210);
            }

            self.primes[i].index = (i0 - len) as u32;
            self.primes[i].wheel = w0 as u16;
            self.primes[i + 1].index = (i1 - len) as u32;
            self.primes[i + 1].wheel = w1 as u16;
            self.primes[i + 2].index = (i2 - len) as u32;
            self.primes[i + 2].wheel = w2 as u16;
            i += 3;
        }

        while i < n {
            let rec = &mut self.primes[i];
            let t = rec.prime30 as usize;
            let mut index = rec.index as usize;
            let mut wheel = rec.wheel as usize;
            while index < len {
                unset_bit(sieve, t, &mut index, &mut wheel, &WHEEL210);
            }
            rec.index = (index - len) as u32;
            rec.wheel = wheel as u16;
            i += 1;
        }
    }
}
