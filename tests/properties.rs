//! Randomized equivalence against a trial-division oracle.

use proptest::prelude::*;

fn is_prime_naive(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3u64;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

fn naive_primes(start: u64, stop: u64) -> Vec<u64> {
    (start..=stop).filter(|&n| is_prime_naive(n)).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn primes_match_trial_division(start in 0u64..10_000_000, width in 0u64..4_000) {
        let stop = start + width;
        prop_assert_eq!(ksieve::generate_primes(start, stop).unwrap(), naive_primes(start, stop));
    }

    #[test]
    fn count_matches_generate(start in 0u64..1_000_000, width in 0u64..50_000) {
        let stop = start + width;
        let count = ksieve::count_primes(start, stop).unwrap();
        prop_assert_eq!(count, ksieve::generate_primes(start, stop).unwrap().len() as u64);
    }

    #[test]
    fn twins_match_oracle(start in 0u64..1_000_000, width in 0u64..4_000) {
        let stop = start + width;
        // A twin is attributed to its first member.
        let expected = (start..=stop)
            .filter(|&p| is_prime_naive(p) && is_prime_naive(p + 2))
            .count() as u64;
        prop_assert_eq!(ksieve::count_twins(start, stop).unwrap(), expected);
    }

    #[test]
    fn partition_is_additive(start in 0u64..1_000_000, width in 60u64..100_000, cut_at in 0.0f64..1.0) {
        let stop = start + width;
        // A cut aligned to a multiple of 30 strictly inside the interval.
        let raw = start + (width as f64 * cut_at) as u64;
        let cut = (raw - raw % 30).clamp(start + 1, stop);
        let whole = ksieve::count_primes(start, stop).unwrap();
        let left = ksieve::count_primes(start, cut - 1).unwrap();
        let right = ksieve::count_primes(cut, stop).unwrap();
        prop_assert_eq!(left + right, whole);

        let whole_twins = ksieve::count_twins(start, stop).unwrap();
        let left_twins = ksieve::count_twins(start, cut - 1).unwrap();
        let right_twins = ksieve::count_twins(cut, stop).unwrap();
        prop_assert_eq!(left_twins + right_twins, whole_twins);
    }
}
