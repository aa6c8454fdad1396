//! Scanning finished segments: counting, printing, callbacks.
//!
//! Prime counting walks the segment bytes through a 256-entry popcount
//! table. k-tuplet counting matches per-kind bit patterns: a tuplet spans at
//! most 20 integers, so every occurrence fits in two adjacent sieve bytes
//! and each admissible (pattern, anchor residue) pair becomes one mask pair
//! in a compile-time table.
//!
//! A pattern anchored in a segment's last byte may need the first byte of
//! the next segment, which has not been sieved yet. The last byte is
//! therefore held back and its patterns are matched when the next segment
//! arrives (or against a zero byte once the interval ends).
//!
//! A k-tuplet is attributed to its first member: it is tallied iff that
//! anchor lies in [start, stop]. Tails may reach past stop; the driver
//! sieves a tuplet-span past it so those bits are valid.

use std::io::Write;
use std::ops::ControlFlow;

use crate::erat::clear_above;
use crate::error::Error;
use crate::flags::{Flags, KINDS};
use crate::wheel::RESIDUES;

const fn popcount_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8).count_ones() as u8;
        i += 1;
    }
    table
}

static POPCOUNT: [u8; 256] = popcount_table();

/// One admissible occurrence of a k-tuplet within the mod-30 byte encoding:
/// the bits all members occupy in the anchor byte and its successor.
struct TupletPattern {
    mask0: u8,
    mask1: u8,
    /// Bit index of the first member within the anchor byte.
    anchor_bit: u8,
    /// Gaps of all members from the anchor, for printing.
    gaps: &'static [u64],
}

const fn pat(mask0: u8, mask1: u8, anchor_bit: u8, gaps: &'static [u64]) -> TupletPattern {
    TupletPattern { mask0, mask1, anchor_bit, gaps }
}

// Anchor residues follow from the patterns: e.g. a quadruplet (0,2,6,8) only
// fits the coprime residues at 11 mod 30, bits 2..=5 of one byte.
static TWINS: [TupletPattern; 3] = [
    pat(0b0000_1100, 0, 2, &[0, 2]),
    pat(0b0011_0000, 0, 4, &[0, 2]),
    pat(0b1000_0000, 0b0000_0001, 7, &[0, 2]),
];
static TRIPLETS: [TupletPattern; 4] = [
    pat(0b0000_1110, 0, 1, &[0, 4, 6]),
    pat(0b0001_1100, 0, 2, &[0, 2, 6]),
    pat(0b0011_1000, 0, 3, &[0, 4, 6]),
    pat(0b0111_0000, 0, 4, &[0, 2, 6]),
];
static QUADRUPLETS: [TupletPattern; 1] = [pat(0b0011_1100, 0, 2, &[0, 2, 6, 8])];
static QUINTUPLETS: [TupletPattern; 2] = [
    pat(0b0011_1110, 0, 1, &[0, 4, 6, 10, 12]),
    pat(0b0111_1100, 0, 2, &[0, 2, 6, 8, 12]),
];
static SEXTUPLETS: [TupletPattern; 1] = [pat(0b0111_1110, 0, 1, &[0, 4, 6, 10, 12, 16])];
static SEPTUPLETS: [TupletPattern; 2] = [
    pat(0b1111_1100, 0b0000_0001, 2, &[0, 2, 6, 8, 12, 18, 20]),
    pat(0b1000_0000, 0b0011_1111, 7, &[0, 2, 8, 12, 14, 18, 20]),
];

static TUPLET_PATTERNS: [&[TupletPattern]; 6] =
    [&TWINS, &TRIPLETS, &QUADRUPLETS, &QUINTUPLETS, &SEXTUPLETS, &SEPTUPLETS];

/// Primes and k-tuplets with a member below the pre-sieve limit. Their bits
/// are permanently cleared by the pre-sieve pattern (2, 3 and 5 have no bit
/// at all), so they are credited from this table instead of the scan.
struct SmallConstellation {
    kind: usize,
    members: &'static [u64],
}

const fn sc(kind: usize, members: &'static [u64]) -> SmallConstellation {
    SmallConstellation { kind, members }
}

static SMALL_CONSTELLATIONS: [SmallConstellation; 24] = [
    sc(0, &[2]),
    sc(0, &[3]),
    sc(0, &[5]),
    sc(0, &[7]),
    sc(0, &[11]),
    sc(0, &[13]),
    sc(0, &[17]),
    sc(0, &[19]),
    sc(1, &[3, 5]),
    sc(1, &[5, 7]),
    sc(1, &[11, 13]),
    sc(1, &[17, 19]),
    sc(2, &[5, 7, 11]),
    sc(2, &[7, 11, 13]),
    sc(2, &[11, 13, 17]),
    sc(2, &[13, 17, 19]),
    sc(2, &[17, 19, 23]),
    sc(3, &[5, 7, 11, 13]),
    sc(3, &[11, 13, 17, 19]),
    sc(4, &[5, 7, 11, 13, 17]),
    sc(4, &[7, 11, 13, 17, 19]),
    sc(4, &[11, 13, 17, 19, 23]),
    sc(5, &[7, 11, 13, 17, 19, 23]),
    sc(6, &[11, 13, 17, 19, 23, 29, 31]),
];

/// What to do with each finished segment, and the tallies so far.
pub(crate) struct Task<'a> {
    flags: Flags,
    start: u64,
    stop: u64,
    pub counts: [u64; KINDS],
    callback: Option<&'a mut dyn FnMut(u64) -> ControlFlow<()>>,
    out: Option<&'a mut dyn Write>,
    /// Last byte of the previous segment and the value of its residue 0.
    pending: Option<(u64, u8)>,
}

impl<'a> Task<'a> {
    pub fn new(
        flags: Flags,
        start: u64,
        stop: u64,
        callback: Option<&'a mut dyn FnMut(u64) -> ControlFlow<()>>,
        out: Option<&'a mut dyn Write>,
    ) -> Task<'a> {
        Task {
            flags,
            start,
            stop,
            counts: [0; KINDS],
            callback,
            out,
            pending: None,
        }
    }

    /// Credit the fixed constellations below the pre-sieve limit. Called
    /// once per interval, before any segment.
    pub fn small_constellations(&mut self) -> Result<(), Error> {
        for c in &SMALL_CONSTELLATIONS {
            let anchor = c.members[0];
            if anchor < self.start || anchor > self.stop {
                continue;
            }
            if self.flags.counts_kind(c.kind) {
                self.counts[c.kind] += 1;
            }
            if self.flags.prints_kind(c.kind) {
                if let Some(out) = self.out.as_mut() {
                    if c.kind == 0 {
                        writeln!(out, "{anchor}")?;
                    } else {
                        write_tuple(&mut **out, c.members.iter().copied())?;
                    }
                }
            }
            if c.kind == 0 {
                if let Some(cb) = self.callback.as_mut() {
                    if cb(anchor).is_break() {
                        return Err(Error::Interrupted);
                    }
                }
            }
        }
        Ok(())
    }

    /// Scan one finished segment starting at `low` (a multiple of 30).
    pub fn scan_segment(&mut self, sieve: &mut [u8], low: u64) -> Result<(), Error> {
        if sieve.is_empty() {
            return Ok(());
        }

        if self.flags.wants_tuplets() {
            if let Some((base, byte)) = self.pending.take() {
                self.match_pair(byte, sieve[0], base)?;
            }
            for j in 0..sieve.len() - 1 {
                if sieve[j] != 0 {
                    self.match_pair(sieve[j], sieve[j + 1], low + 30 * j as u64)?;
                }
            }
            self.pending = Some((low + 30 * (sieve.len() as u64 - 1), sieve[sieve.len() - 1]));
        }

        // The tuplet scan above needs the lookahead bits past stop; the
        // prime scan must not see them.
        clear_above(sieve, low, self.stop);

        if self.flags.counts_kind(0) {
            self.counts[0] += sieve.iter().map(|&b| POPCOUNT[b as usize] as u64).sum::<u64>();
        }
        if self.flags.prints_kind(0) || self.callback.is_some() {
            for (j, &byte) in sieve.iter().enumerate() {
                let mut bits = byte;
                while bits != 0 {
                    let bit = bits.trailing_zeros() as usize;
                    bits &= bits - 1;
                    let value = low + 30 * j as u64 + RESIDUES[bit] as u64;
                    if self.flags.prints_kind(0) {
                        if let Some(out) = self.out.as_mut() {
                            writeln!(out, "{value}")?;
                        }
                    }
                    if let Some(cb) = self.callback.as_mut() {
                        if cb(value).is_break() {
                            return Err(Error::Interrupted);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Resolve the held-back byte once no further segment will arrive.
    pub fn finish(&mut self) -> Result<(), Error> {
        if let Some((base, byte)) = self.pending.take() {
            self.match_pair(byte, 0, base)?;
        }
        if let Some(out) = self.out.as_mut() {
            out.flush()?;
        }
        Ok(())
    }

    fn match_pair(&mut self, b0: u8, b1: u8, base: u64) -> Result<(), Error> {
        for kind in 1..KINDS {
            if !self.flags.counts_kind(kind) && !self.flags.prints_kind(kind) {
                continue;
            }
            for p in TUPLET_PATTERNS[kind - 1] {
                if b0 & p.mask0 == p.mask0 && b1 & p.mask1 == p.mask1 {
                    let anchor = base + RESIDUES[p.anchor_bit as usize] as u64;
                    if anchor < self.start || anchor > self.stop {
                        continue;
                    }
                    if self.flags.counts_kind(kind) {
                        self.counts[kind] += 1;
                    }
                    if self.flags.prints_kind(kind) {
                        if let Some(out) = self.out.as_mut() {
                            write_tuple(&mut **out, p.gaps.iter().map(|&g| anchor + g))?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn write_tuple(out: &mut dyn Write, members: impl Iterator<Item = u64>) -> Result<(), Error> {
    let mut sep = "(";
    for m in members {
        write!(out, "{sep}{m}")?;
        sep = ", ";
    }
    writeln!(out, ")")?;
    Ok(())
}
