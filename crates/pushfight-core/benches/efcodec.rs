//! Throughput of Elias-Fano encode/decode over a chunk-sized delta list, the
//! unit of work input generation and merging operate on.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use pushfight_core::efcodec::{decode_ef, encode_ef};

fn sample_deltas(n: usize) -> Vec<i64> {
    let mut values = Vec::with_capacity(n);
    let mut v = 0i64;
    for i in 0..n {
        v += 1 + (i as i64 * 2654435761) % 997;
        values.push(v);
    }
    values
}

fn bench_encode(c: &mut Criterion) {
    let values = sample_deltas(10_000);
    c.bench_function("encode_ef, 10k sorted deltas", |b| {
        b.iter(|| black_box(encode_ef(black_box(&values))));
    });
}

fn bench_decode(c: &mut Criterion) {
    let values = sample_deltas(10_000);
    let encoded = encode_ef(&values);
    c.bench_function("decode_ef, 10k sorted deltas", |b| {
        b.iter(|| black_box(decode_ef(black_box(&encoded)).unwrap()));
    });
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
