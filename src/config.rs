use clap::Parser;

/// Count, print or locate primes and prime k-tuplets with a segmented,
/// wheel-factorized sieve of Eratosthenes.
///
/// With one number, sieves [0, N]; with two, sieves [START, STOP].
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Upper bound N, or the lower bound when STOP is also given. With
    /// --nth-prime this is n (negative n searches downward).
    #[arg(allow_negative_numbers = true)]
    pub start: i128,

    /// Upper interval bound; with --nth-prime, the base offset (default 0).
    pub stop: Option<u64>,

    /// Comma-separated kinds to count: 1=primes, 2=twins, 3=triplets,
    /// 4=quadruplets, 5=quintuplets, 6=sextuplets, 7=septuplets.
    /// [default: 1]
    #[arg(short, long, value_delimiter = ',')]
    pub count: Vec<u8>,

    /// Print kind K (default 1 = primes), one item per line. Use
    /// --print=K to select a kind.
    #[arg(
        short,
        long,
        value_name = "K",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "1"
    )]
    pub print: Option<u8>,

    /// Interpret START as n: report the nth prime after the base offset
    /// (or at/below it for negative n).
    #[arg(short, long)]
    pub nth_prime: bool,

    /// Number of worker threads for counting tasks.
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Sieve segment size in KiB (8..=4096); defaults to the L2 cache size.
    #[arg(short = 's', long, value_name = "KiB")]
    pub size: Option<usize>,

    /// Show a live progress bar on stderr.
    #[arg(long)]
    pub progress: bool,

    /// Emit a machine-readable JSON summary on stdout.
    #[arg(long)]
    pub json: bool,

    /// Suppress the human-readable summary.
    #[arg(short, long)]
    pub quiet: bool,
}
