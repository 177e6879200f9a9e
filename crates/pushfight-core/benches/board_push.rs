//! Throughput of push validation and execution, the innermost operations of
//! successor generation.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use pushfight_core::board::{execute_push, is_valid_push};
use pushfight_core::constants::L;
use pushfight_core::perm::Perm;

fn bench_is_valid_push(c: &mut Criterion) {
    let perm = Perm::unrank(123_456_789_012);
    c.bench_function("is_valid_push over the whole board", |b| {
        b.iter(|| {
            let mut count = 0u32;
            for i in 0..L as u8 {
                for d in 0..4 {
                    if is_valid_push(black_box(&perm), i, d) {
                        count += 1;
                    }
                }
            }
            black_box(count)
        });
    });
}

fn bench_execute_push(c: &mut Criterion) {
    let perm = Perm::unrank(123_456_789_012);
    c.bench_function("execute_push over every valid push from one position", |b| {
        b.iter(|| {
            for i in 0..L as u8 {
                for d in 0..4 {
                    if is_valid_push(&perm, i, d) {
                        let mut working = perm;
                        black_box(execute_push(&mut working, i, d));
                    }
                }
            }
        });
    });
}

criterion_group!(benches, bench_is_valid_push, bench_execute_push);
criterion_main!(benches);
