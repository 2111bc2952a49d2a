//! Benchmarks for the simulator.
//!
//! Tests:
//! - One simulated day at the default rates, indexed vs scan selection
//! - Live-row picking as the table grows
//! - Seed generation throughput

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use logistics_synth::fields::FieldTable;
use logistics_synth::reader::read_table_from;
use logistics_synth::record::{pick_one, LiveIndex, RecordSet};
use logistics_synth::seed::{generate, SeedConfig};
use logistics_synth::sim::{Selection, SimulationConfig, Simulator};
use logistics_synth::writer::table_to_bytes;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::hint::black_box;

fn seed_table(rows: usize) -> RecordSet {
    let table = generate(&SeedConfig {
        rows,
        ..Default::default()
    })
    .unwrap();
    let bytes = table_to_bytes(&table).unwrap();
    read_table_from(bytes.as_slice(), &FieldTable::logistics_activity()).unwrap()
}

/// Benchmark a full simulated day with each selection strategy
fn bench_simulate_day(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulate_day");
    group.sample_size(10);
    let input = seed_table(2000);

    for selection in [Selection::Indexed, Selection::Scan] {
        group.bench_with_input(
            BenchmarkId::new("selection", selection),
            &selection,
            |b, &selection| {
                b.iter(|| {
                    let config = SimulationConfig {
                        days: 1,
                        seed: 42,
                        selection,
                        ..Default::default()
                    };
                    let out = Simulator::new(config, input.clone())
                        .unwrap()
                        .run()
                        .unwrap();
                    black_box(out.table.len())
                })
            },
        );
    }

    group.finish();
}

/// Benchmark a single live-row pick at growing table sizes
fn bench_pick(c: &mut Criterion) {
    let mut group = c.benchmark_group("pick_live");

    for rows in [1_000usize, 10_000, 100_000] {
        let flags: Vec<bool> = (0..rows).map(|i| i % 10 == 0).collect();
        let index = LiveIndex::from_deleted_flags(flags.iter().copied());

        group.bench_with_input(BenchmarkId::new("indexed", rows), &rows, |b, _| {
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            b.iter(|| black_box(index.pick(&mut rng)))
        });
        group.bench_with_input(BenchmarkId::new("scan", rows), &rows, |b, _| {
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            b.iter(|| black_box(pick_one((0..rows).filter(|&i| !flags[i]), &mut rng)))
        });
    }

    group.finish();
}

/// Benchmark seed generation throughput
fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    for rows in [1_000u64, 10_000] {
        group.throughput(Throughput::Elements(rows));
        group.bench_with_input(BenchmarkId::new("rows", rows), &rows, |b, &rows| {
            b.iter(|| {
                let config = SeedConfig {
                    rows: rows as usize,
                    ..Default::default()
                };
                black_box(generate(&config).unwrap().len())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_simulate_day, bench_pick, bench_generate);
criterion_main!(benches);
