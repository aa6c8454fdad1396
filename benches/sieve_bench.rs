use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_count_primes_1e6(c: &mut Criterion) {
    c.bench_function("count_primes(0, 10^6)", |b| {
        b.iter(|| ksieve::count_primes(black_box(0), black_box(1_000_000)).unwrap());
    });
}

fn bench_count_primes_1e8(c: &mut Criterion) {
    let mut group = c.benchmark_group("large");
    group.sample_size(10);
    group.bench_function("count_primes(0, 10^8)", |b| {
        b.iter(|| ksieve::count_primes(black_box(0), black_box(100_000_000)).unwrap());
    });
    group.finish();
}

fn bench_high_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("high");
    group.sample_size(10);
    group.bench_function("count_primes(10^12, 10^12 + 10^6)", |b| {
        b.iter(|| {
            let base = 1_000_000_000_000u64;
            ksieve::count_primes(black_box(base), black_box(base + 1_000_000)).unwrap()
        });
    });
    group.finish();
}

fn bench_count_twins_1e7(c: &mut Criterion) {
    c.bench_function("count_twins(0, 10^7)", |b| {
        b.iter(|| ksieve::count_twins(black_box(0), black_box(10_000_000)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_count_primes_1e6,
    bench_count_primes_1e8,
    bench_high_window,
    bench_count_twins_1e7,
);
criterion_main!(benches);
