//! Cross-off engine for the smallest sieving primes.
//!
//! Small primes have many multiples per segment, so the cost per multiple
//! dominates. One full mod-30 wheel rotation of a prime p = 30t + r clears
//! exactly 8 bits spread over a stride of 30t + r bytes, at byte offsets and
//! with bit masks that depend only on (t, r). The inner loop therefore runs
//! the whole rotation as eight mask stores with precomputed offsets, falling
//! back to the generic wheel table to enter at an arbitrary spoke and to
//! finish the partial rotation at the segment edge.

use crate::wheel::{SievingPrime, RESIDUES, RES_TO_BIT, SPOKES30, WHEEL30};

use super::unset_bit;

pub(crate) struct EratSmall {
    primes: Vec<SievingPrime>,
}

impl EratSmall {
    pub fn new() -> EratSmall {
        EratSmall { primes: Vec::new() }
    }

    pub fn store(&mut self, prime30: u32, multiple_index: u32, wheel_index: u16) {
        self.primes.push(SievingPrime::new(prime30, multiple_index, wheel_index));
    }

    /// Cross off the multiples of every stored prime, then renormalize each
    /// record's multiple index to the next segment.
    pub fn cross_off(&mut self, sieve: &mut [u8]) {
        let len = sieve.len();
        for rec in &mut self.primes {
            let t = rec.prime30() as usize;
            let mut index = rec.multiple_index() as usize;
            let mut wi = rec.wheel_index() as usize;

            // Enter the rotation: step until spoke 0 of the sub-wheel.
            while index < len && wi & 7 != 0 {
                unset_bit(sieve, t, &mut index, &mut wi, &WHEEL30);
            }

            if index < len {
                let r = RESIDUES[wi >> 3] as usize;
                let mut offs = [0usize; 8];
                let mut masks = [0u8; 8];
                for (j, &s) in SPOKES30.iter().enumerate() {
                    let s = s as usize;
                    offs[j] = t * (s - 1) + r * s / 30;
                    masks[j] = !(1u8 << RES_TO_BIT[r * s % 30]);
                }
                let stride = t * 30 + r;

                // offs[7] is the largest offset, so the guard covers all 8.
                while index + offs[7] < len {
                    sieve[index + offs[0]] &= masks[0];
                    sieve[index + offs[1]] &= masks[1];
                    sieve[index + offs[2]] &= masks[2];
                    sieve[index + offs[3]] &= masks[3];
                    sieve[index + offs[4]] &= masks[4];
                    sieve[index + offs[5]] &= masks[5];
                    sieve[index + offs[6]] &= masks[6];
                    sieve[index + offs[7]] &= masks[7];
                    index += stride;
                }

                // Partial rotation at the segment edge.
                while index < len {
                    unset_bit(sieve, t, &mut index, &mut wi, &WHEEL30);
                }
            }

            *rec = SievingPrime::new(t as u32, (index - len) as u32, wi as u16);
        }
    }
}
