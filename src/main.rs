mod config;

use std::io::BufWriter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ksieve::{Flags, PrimeSieve, KINDS};
use serde::Serialize;

use crate::config::Config;

const KIND_LABELS: [&str; KINDS] = [
    "Primes",
    "Twin primes",
    "Prime triplets",
    "Prime quadruplets",
    "Prime quintuplets",
    "Prime sextuplets",
    "Prime septuplets",
];

#[derive(Serialize)]
struct Summary {
    start: u64,
    stop: u64,
    threads: usize,
    sieve_size_kib: usize,
    seconds: f64,
    counts: Vec<KindCount>,
}

#[derive(Serialize)]
struct KindCount {
    kind: &'static str,
    count: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    // --- Config Validation ---
    for &k in &config.count {
        if !(1..=7).contains(&k) {
            eprintln!("Error: count kind {} is not in 1..=7.", k);
            std::process::exit(1);
        }
    }
    if let Some(p) = config.print {
        if !(1..=7).contains(&p) {
            eprintln!("Error: print kind {} is not in 1..=7.", p);
            std::process::exit(1);
        }
        if config.threads.is_some_and(|t| t > 1) {
            eprintln!("Error: --print runs on one thread; drop --threads.");
            std::process::exit(1);
        }
    }

    if config.nth_prime {
        return run_nth_prime(&config);
    }

    let (start, stop) = match config.stop {
        Some(stop) => (parse_bound(config.start), stop),
        None => (0, parse_bound(config.start)),
    };

    let mut flags = Flags::NONE;
    for &k in &config.count {
        flags |= Flags::count((k - 1) as usize);
    }
    if let Some(p) = config.print {
        flags |= Flags::print((p - 1) as usize);
    } else if config.count.is_empty() {
        flags = Flags::COUNT_PRIMES;
    }

    let mut sieve = PrimeSieve::new();
    sieve.set_flags(flags);
    if let Some(threads) = config.threads {
        sieve.set_num_threads(threads);
    }
    if let Some(kib) = config.size {
        sieve.set_sieve_size(kib * 1024);
    }

    let progress = config.progress.then(|| spawn_progress_bar(&sieve));

    let result = if config.print.is_some() {
        let stdout = std::io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        sieve.sieve_to(start, stop, &mut out)
    } else {
        sieve.sieve(start, stop)
    };

    if let Some((done, handle)) = progress {
        done.store(true, Ordering::Relaxed);
        let _ = handle.join();
    }
    result?;

    let counted: Vec<usize> = if config.count.is_empty() && config.print.is_none() {
        vec![0]
    } else {
        config.count.iter().map(|&k| (k - 1) as usize).collect()
    };

    if config.json {
        let summary = Summary {
            start,
            stop,
            threads: sieve.num_threads(),
            sieve_size_kib: sieve.sieve_size() / 1024,
            seconds: sieve.seconds(),
            counts: counted
                .iter()
                .map(|&kind| KindCount {
                    kind: KIND_LABELS[kind],
                    count: sieve.count(kind),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if !config.quiet && config.print.is_none() {
        for &kind in &counted {
            println!("{}: {}", KIND_LABELS[kind], sieve.count(kind));
        }
        println!("Seconds: {:.3}", sieve.seconds());
    }

    Ok(())
}

fn run_nth_prime(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let n = i64::try_from(config.start).unwrap_or_else(|_| {
        eprintln!("Error: n {} is out of range.", config.start);
        std::process::exit(1);
    });
    let base = config.stop.unwrap_or(0);
    let prime = ksieve::nth_prime(n, base)?;
    if config.json {
        println!("{}", serde_json::json!({ "n": n, "start": base, "nth_prime": prime }));
    } else {
        println!("{prime}");
    }
    Ok(())
}

fn parse_bound(value: i128) -> u64 {
    u64::try_from(value).unwrap_or_else(|_| {
        eprintln!("Error: bound {} is not in [0, 2^64 - 1].", value);
        std::process::exit(1);
    })
}

fn spawn_progress_bar(
    sieve: &PrimeSieve,
) -> (Arc<AtomicBool>, std::thread::JoinHandle<()>) {
    let status = sieve.status();
    let done = Arc::new(AtomicBool::new(false));
    let done_flag = Arc::clone(&done);
    let handle = std::thread::spawn(move || {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        while !done_flag.load(Ordering::Relaxed) {
            bar.set_position(status.percent_done() as u64);
            std::thread::sleep(Duration::from_millis(100));
        }
        bar.finish_and_clear();
    });
    (done, handle)
}
