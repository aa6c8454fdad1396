//! Locating the nth prime relative to a start offset.
//!
//! The prime number theorem gives a good window estimate: the nth prime
//! past `start` sits near `start + n * ln(start + 20n)`. Sieve-count that
//! window; if it falls short, slide and repeat with the remainder, and once
//! the target is inside the window, materialize it and index. The 20%
//! slack plus a flat pad means the loop almost always finishes in one
//! round trip.

use crate::error::Error;
use crate::{count_primes, generate_primes};

/// Find the nth prime after `start` (n > 0) or the |n|th prime at or below
/// `start` (n < 0). n = 0 is rejected: there is no zeroth prime.
pub fn nth_prime(n: i64, start: u64) -> Result<u64, Error> {
    if n == 0 {
        return Err(Error::NthPrimeOutOfRange { nth: 0, direction: "above", start });
    }
    if n > 0 {
        nth_above(n as u64, start)
    } else {
        nth_below(n.unsigned_abs(), start)
    }
}

fn window(n: u64, base: u64) -> u64 {
    let x = (base as f64 + 20.0 * n as f64).max(3.0);
    (n as f64 * x.ln() * 1.2 + 10_000.0) as u64
}

fn nth_above(n: u64, start: u64) -> Result<u64, Error> {
    let mut remaining = n;
    let mut low = start; // exclusive lower bound
    loop {
        let high = low.saturating_add(window(remaining, low));
        if high == low {
            return Err(Error::NthPrimeOutOfRange { nth: n, direction: "above", start });
        }
        let found = count_primes(low + 1, high)?;
        if found < remaining {
            if high == u64::MAX {
                return Err(Error::NthPrimeOutOfRange { nth: n, direction: "above", start });
            }
            remaining -= found;
            low = high;
            continue;
        }
        let primes = generate_primes(low + 1, high)?;
        return Ok(primes[(remaining - 1) as usize]);
    }
}

fn nth_below(n: u64, start: u64) -> Result<u64, Error> {
    let mut remaining = n;
    let mut high = start; // inclusive upper bound
    loop {
        let low = high.saturating_sub(window(remaining, high));
        let found = count_primes(low, high)?;
        if found < remaining {
            if low == 0 {
                return Err(Error::NthPrimeOutOfRange { nth: n, direction: "below", start });
            }
            remaining -= found;
            high = low - 1;
            continue;
        }
        let primes = generate_primes(low, high)?;
        return Ok(primes[primes.len() - remaining as usize]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_primes() {
        assert_eq!(nth_prime(1, 0).unwrap(), 2);
        assert_eq!(nth_prime(2, 0).unwrap(), 3);
        assert_eq!(nth_prime(25, 0).unwrap(), 97);
        assert_eq!(nth_prime(100, 0).unwrap(), 541);
    }

    #[test]
    fn relative_to_start() {
        // Primes strictly above start.
        assert_eq!(nth_prime(1, 2).unwrap(), 3);
        assert_eq!(nth_prime(1, 100).unwrap(), 101);
        assert_eq!(nth_prime(3, 100).unwrap(), 107);
    }

    #[test]
    fn negative_n_searches_downward() {
        // Primes at or below start, counting down.
        assert_eq!(nth_prime(-1, 100).unwrap(), 97);
        assert_eq!(nth_prime(-2, 100).unwrap(), 89);
        assert_eq!(nth_prime(-1, 97).unwrap(), 97);
        assert_eq!(nth_prime(-25, 100).unwrap(), 2);
    }

    #[test]
    fn out_of_range() {
        assert!(nth_prime(0, 0).is_err());
        assert!(nth_prime(-1, 1).is_err());
        assert!(nth_prime(-26, 100).is_err());
    }
}
