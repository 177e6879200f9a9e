//! Throughput of the rank/unrank/advance primitives that every phase driver
//! calls once per position in the index space.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use pushfight_core::perm::Perm;

fn bench_unrank(c: &mut Criterion) {
    c.bench_function("unrank midpoint", |b| {
        b.iter(|| Perm::unrank(black_box(200_000_000_000)));
    });
}

fn bench_rank(c: &mut Criterion) {
    let perm = Perm::unrank(200_000_000_000);
    c.bench_function("rank", |b| {
        b.iter(|| black_box(&perm).rank());
    });
}

fn bench_advance(c: &mut Criterion) {
    c.bench_function("advance 1000 steps", |b| {
        b.iter(|| {
            let mut perm = Perm::FIRST;
            for _ in 0..1000 {
                perm.advance();
            }
            black_box(perm)
        });
    });
}

criterion_group!(benches, bench_unrank, bench_rank, bench_advance);
criterion_main!(benches);
