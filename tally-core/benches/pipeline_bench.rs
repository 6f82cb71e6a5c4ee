//! Benchmark: Accumulation Pipeline Throughput
//!
//! What's Measured:
//! - Bucketizing a single timestamp
//! - Qualification of a full tape
//! - Full-scan accumulation and trim vs. fused early exit
//! - Parsing a whitespace-separated trade file from memory

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Write;
use std::io::Cursor;
use tally_core::data::{parse_trades, LoadParams};
use tally_core::pipeline::{accumulate, bucketize, qualify, run, RunParams};
use tally_core::{Side, Trade};

const T0: i64 = 1_700_000_000_000_000_000;
const HIGH: i64 = 58_336_410_000;

/// Buy tape where every 10ms bucket opens at the same high print
fn synthetic_tape(n: usize, seed: u64) -> Vec<Trade> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut trades = Vec::with_capacity(n);
    let mut bucket = 0i64;

    while trades.len() < n {
        let base = T0 + bucket * 10_000_000;
        let prints = rng.gen_range(1..=9);
        for j in 0..prints {
            if trades.len() == n {
                break;
            }
            let price = if j == 0 { HIGH } else { HIGH - rng.gen_range(0..50_000) };
            let size = rng.gen_range(1_000_000..500_000_000);
            trades.push(Trade::new(base + (j + 1) * 100_000, Side::Buy, price, size));
        }
        bucket += 1;
    }
    trades
}

fn params(early_exit: bool) -> RunParams {
    RunParams {
        side: Side::Buy,
        downsample_exponent: 6,
        target_participation_rate: 0.01,
        target_notional: 10_000.0,
        fee_rate_bps: 50,
        early_exit,
    }
}

fn bench_bucketize(c: &mut Criterion) {
    c.bench_function("bucketize", |b| {
        let mut ts = T0;
        b.iter(|| {
            ts += 100_000;
            if ts % 10_000_000 > 9_000_000 {
                ts += 1_000_000;
            }
            black_box(bucketize(black_box(ts), 6).ok());
        });
    });
}

fn bench_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_stages");

    for n in [1_000usize, 10_000, 100_000] {
        let trades = synthetic_tape(n, 42);
        let qualified = qualify(&trades, Side::Buy, 6).expect("qualify");
        let accumulation = params(false).accumulation();

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("qualify", n), &trades, |b, trades| {
            b.iter(|| black_box(qualify(trades, Side::Buy, 6).expect("qualify")));
        });
        group.bench_with_input(BenchmarkId::new("accumulate", n), &qualified, |b, qualified| {
            b.iter(|| black_box(accumulate(qualified, &accumulation).expect("accumulate")));
        });
    }

    group.finish();
}

fn bench_early_exit(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_to_target");
    let trades = synthetic_tape(100_000, 7);

    for early_exit in [false, true] {
        let label = if early_exit { "fused" } else { "full_scan" };
        group.bench_function(label, |b| {
            b.iter(|| black_box(run(black_box(&trades), &params(early_exit)).expect("run")));
        });
    }

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let trades = synthetic_tape(10_000, 3);
    let mut text = String::from("timestamp_utc_nanoseconds PriceMillionths SizeBillionths Side\n");
    for t in &trades {
        let _ = writeln!(text, "{} {} {} 1", t.timestamp_ns, t.price_millionths, t.size_billionths);
    }

    let load = LoadParams {
        side: Side::Buy,
        start_ns: 0,
        row_limit: usize::MAX,
    };

    let mut group = c.benchmark_group("load");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("parse_10k", |b| {
        b.iter(|| black_box(parse_trades(Cursor::new(text.as_bytes()), &load).expect("parse")));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_bucketize,
    bench_stages,
    bench_early_exit,
    bench_parse
);
criterion_main!(benches);
