//! Cross-off engine for the largest sieving primes.
//!
//! A big prime fires in at most one segment out of many, so scanning the
//! whole prime list per segment would be almost pure waste. Every record is
//! instead filed under the segment where its next multiple lives: a ring of
//! buckets indexed by segment number modulo the ring size. Sieving a segment
//! drains exactly one bucket, fires each record once (rarely twice), and
//! refiles it into the bucket of its next multiple. Per-segment work is
//! proportional to the number of primes actually firing.
//!
//! Buckets are singly-linked lists of fixed-capacity record pages. Drained
//! pages go back on a free-list stack, so page allocation is amortized O(1)
//! and steady-state sieving does not touch the allocator.

use crate::wheel::{SievingPrime, WHEEL210};

use super::unset_bit;

/// Records per bucket page: 8 KiB of payload, at most half of an L1 slice.
const PAGE_RECORDS: usize = 1024;

struct Page {
    len: usize,
    next: Option<Box<Page>>,
    slots: [SievingPrime; PAGE_RECORDS],
}

impl Page {
    fn new() -> Box<Page> {
        Box::new(Page {
            len: 0,
            next: None,
            slots: [SievingPrime::EMPTY; PAGE_RECORDS],
        })
    }
}

pub(crate) struct EratBig {
    buckets: Vec<Option<Box<Page>>>,
    mask: usize,
    /// Ring position of the segment currently being sieved.
    cur: usize,
    free: Vec<Box<Page>>,
    sieve_size: usize,
    /// Index of the segment currently being sieved.
    segment: u64,
    total_segments: u64,
}

impl EratBig {
    pub fn new(sieve_size: usize, max_prime: u64, total_segments: u64) -> EratBig {
        // Upper bound on the byte distance a record can be filed ahead: the
        // widest mod-210 quotient gap is 10, and initial placement adds one
        // more quotient step, so 11 * p / 30 bytes plus slack covers it.
        let max_hop = (11 * max_prime / 30 / sieve_size as u64 + 3) as usize;
        let buckets = max_hop.next_power_of_two();
        EratBig {
            buckets: (0..buckets).map(|_| None).collect(),
            mask: buckets - 1,
            cur: 0,
            free: Vec::new(),
            sieve_size,
            segment: 0,
            total_segments,
        }
    }

    /// File a record under the segment containing its next multiple.
    /// `multiple_index` is the byte distance from the current segment's low
    /// bound. Records that would fire past the last segment are dropped.
    pub fn store(&mut self, prime30: u32, multiple_index: u64, wheel_index: u16) {
        let delta = multiple_index / self.sieve_size as u64;
        if self.segment + delta >= self.total_segments {
            return;
        }
        debug_assert!((delta as usize) <= self.mask);
        let slot = (self.cur + delta as usize) & self.mask;
        let rec = SievingPrime::new(
            prime30,
            (multiple_index % self.sieve_size as u64) as u32,
            wheel_index,
        );
        self.push(slot, rec);
    }

    fn push(&mut self, slot: usize, rec: SievingPrime) {
        if self.buckets[slot].as_ref().map_or(true, |p| p.len == PAGE_RECORDS) {
            let mut page = self.free.pop().unwrap_or_else(Page::new);
            page.next = self.buckets[slot].take();
            self.buckets[slot] = Some(page);
        }
        if let Some(page) = self.buckets[slot].as_deref_mut() {
            page.slots[page.len] = rec;
            page.len += 1;
        }
    }

    /// Drain the current segment's bucket: fire each record and refile it.
    pub fn cross_off(&mut self, sieve: &mut [u8]) {
        let len = sieve.len();
        let mut head = self.buckets[self.cur].take();
        while let Some(mut page) = head {
            head = page.next.take();
            for k in 0..page.len {
                let rec = page.slots[k];
                let t = rec.prime30() as usize;
                let mut index = rec.multiple_index() as usize;
                let mut wheel = rec.wheel_index() as usize;
                while index < len {
                    unset_bit(sieve, t, &mut index, &mut wheel, &WHEEL210);
                }
                self.store(rec.prime30(), index as u64, wheel as u16);
            }
            page.len = 0;
            self.free.push(page);
        }
        self.segment += 1;
        self.cur = (self.cur + 1) & self.mask;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sieving_primes::SievingPrimes;
    use crate::wheel::{position_prime, INIT210, RESIDUES};

    /// Big-regime bucketing over many small segments agrees with a naive
    /// multiple enumeration.
    #[test]
    fn bucketed_firing_matches_naive() {
        let bytes = 64usize;
        let segments = 200usize;
        let span = 30 * (bytes * segments) as u64;
        let primes: Vec<u64> = SievingPrimes::new(crate::sieving_primes::isqrt(span))
            .filter(|&p| p > 320)
            .collect();
        assert!(!primes.is_empty());

        let mut erat = EratBig::new(bytes, crate::sieving_primes::isqrt(span), segments as u64);

        // Like the segment driver, add each prime in the segment where its
        // square first becomes reachable; the bucket ring only spans the
        // distance a prime can be filed ahead from its current segment.
        let mut next = 0usize;
        let mut all = Vec::new();
        for s in 0..segments {
            let low = 30 * (s * bytes) as u64;
            let high = low + 30 * bytes as u64;
            while next < primes.len() && primes[next] * primes[next] < high {
                let p = primes[next];
                if let Some((idx, wi)) = position_prime(p, low, span, 210, &INIT210, 48) {
                    erat.store((p / 30) as u32, idx, wi);
                }
                next += 1;
            }
            let mut seg = vec![0xffu8; bytes];
            erat.cross_off(&mut seg);
            all.extend_from_slice(&seg);
        }

        for (k, &byte) in all.iter().enumerate() {
            for (bit, &r) in RESIDUES.iter().enumerate() {
                let n = k as u64 * 30 + r as u64;
                let crossed = primes.iter().any(|&p| {
                    n >= p * p
                        && n % p == 0
                        && [2u64, 3, 5, 7].iter().all(|&f| (n / p) % f != 0)
                });
                assert_eq!(byte & (1 << bit) == 0, crossed, "n = {n}");
            }
        }
    }

    #[test]
    fn pages_are_recycled() {
        // Two segments total: everything refiled after segment 1 is past the
        // end of the range and dropped, so both drained pages land on the
        // free-list.
        let mut erat = EratBig::new(64, 10_000, 2);
        for i in 0..2 * PAGE_RECORDS {
            erat.store(100 + i as u32, 64, 0);
        }
        let mut seg = vec![0xffu8; 64];
        erat.cross_off(&mut seg); // segment 0: bucket empty
        assert!(erat.free.is_empty());
        erat.cross_off(&mut seg); // segment 1: both pages drain
        assert_eq!(erat.free.len(), 2);
    }
}
