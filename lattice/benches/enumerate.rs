//! Benchmarks for lattice enumeration.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use gluonic_lattice::enumerate::{distributed, monolithic, rank_block, MajorOrder};
use gluonic_lattice::{decompose, locate, Coord, Dimensions, ProcessCount};

fn bench_monolithic(c: &mut Criterion) {
    let dims = Dimensions::new([16, 16, 16, 32]).unwrap();
    let mut group = c.benchmark_group("monolithic");
    group.throughput(Throughput::Elements(dims.volume() as u64));

    for order in [MajorOrder::Xyzt, MajorOrder::Tzyx] {
        group.bench_function(order.label(), |b| {
            b.iter(|| {
                monolithic(black_box(&dims), order)
                    .map(|r| r.offset)
                    .fold(0usize, usize::wrapping_add)
            });
        });
    }

    group.finish();
}

fn bench_distributed(c: &mut Criterion) {
    let dims = Dimensions::new([16, 16, 16, 32]).unwrap();
    let mut group = c.benchmark_group("distributed");
    group.throughput(Throughput::Elements(dims.volume() as u64));

    for p in [1usize, 16, 64] {
        let d = decompose(&dims, ProcessCount::new(p).unwrap()).unwrap();
        group.bench_function(format!("P={}", p), |b| {
            b.iter(|| {
                distributed(black_box(&d))
                    .map(|r| r.offset)
                    .fold(0usize, usize::wrapping_add)
            });
        });
    }

    group.finish();
}

fn bench_single_block(c: &mut Criterion) {
    let dims = Dimensions::new([48, 48, 48, 96]).unwrap();
    let d = decompose(&dims, ProcessCount::new(512).unwrap()).unwrap();
    let mut group = c.benchmark_group("rank_block");
    group.throughput(Throughput::Elements(d.sub_volume() as u64));

    group.bench_function("rank_511", |b| {
        b.iter(|| {
            rank_block(black_box(&d), 511)
                .map(|block| block.count())
                .unwrap_or(0)
        });
    });

    group.bench_function("locate", |b| {
        let site = Coord::new(47, 13, 29, 95);
        b.iter(|| locate(black_box(&site), &d));
    });

    group.finish();
}

criterion_group!(benches, bench_monolithic, bench_distributed, bench_single_block);
criterion_main!(benches);
