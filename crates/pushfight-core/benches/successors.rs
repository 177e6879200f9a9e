//! Throughput of full successor enumeration, the hot loop every phase
//! driver runs once per in-progress position.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use pushfight_core::perm::Perm;
use pushfight_core::search::{generate_successors, has_winning_move};

fn bench_generate_successors(c: &mut Criterion) {
    let perm = Perm::unrank(123_456_789_012);
    c.bench_function("generate_successors, full enumeration", |b| {
        b.iter(|| {
            let mut count = 0u32;
            generate_successors(black_box(&perm), &mut |_moves, _succ, _outcome| {
                count += 1;
                true
            });
            black_box(count)
        });
    });
}

fn bench_has_winning_move(c: &mut Criterion) {
    let perm = Perm::unrank(123_456_789_012);
    c.bench_function("has_winning_move", |b| {
        b.iter(|| black_box(has_winning_move(black_box(&perm))));
    });
}

criterion_group!(benches, bench_generate_successors, bench_has_winning_move);
criterion_main!(benches);
