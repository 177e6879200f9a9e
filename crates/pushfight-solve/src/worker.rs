//! Chunk-parallel computation: dispatches the parts of one chunk across a
//! rayon scope pulling from a shared atomic counter, mirroring the original
//! `ComputeChunkThread`/`ComputeChunk` work-stealing loop.

use std::sync::atomic::{AtomicI64, Ordering};

use colored::Colorize;
use pushfight_core::constants::{NUM_PARTS, PART_SIZE};
use pushfight_core::phase::{self, ChunkStats, PriorOutcomes};
use pushfight_core::storage::rn::encode_ternary;
use pushfight_core::types::Outcome;

/// Packs a chunk-sized slice of booleans into an R0 bitmap (1 bit/position,
/// LSB of each byte first).
pub fn encode_bits(bits: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; bits.len().div_ceil(8)];
    for (i, &b) in bits.iter().enumerate() {
        if b {
            bytes[i / 8] |= 1 << (i % 8);
        }
    }
    bytes
}

/// Packs a chunk-sized slice of outcomes into an RN ternary file (5
/// digits/byte).
pub fn encode_outcomes(outcomes: &[Outcome]) -> Vec<u8> {
    assert_eq!(outcomes.len() % 5, 0, "chunk size must be a multiple of 5");
    outcomes
        .chunks_exact(5)
        .map(|c| encode_ternary([c[0], c[1], c[2], c[3], c[4]]))
        .collect()
}

/// Computes phase 0 for one chunk: `chunk_size` booleans, true where white has
/// an immediate winning move, using `num_threads` rayon workers pulling parts
/// from a shared counter.
pub fn run_phase0_chunk(chunk: i64, num_threads: usize) -> Vec<bool> {
    let base = chunk * pushfight_core::constants::CHUNK_SIZE;
    let next_part = AtomicI64::new(0);
    let mut parts: Vec<Vec<bool>> = (0..NUM_PARTS).map(|_| Vec::new()).collect();
    let slots: Vec<&mut Vec<bool>> = parts.iter_mut().collect();
    let slots = std::sync::Mutex::new(slots);

    rayon::scope(|s| {
        for worker in 0..num_threads.max(1) {
            let next_part = &next_part;
            let slots = &slots;
            s.spawn(move |_| loop {
                let part = next_part.fetch_add(1, Ordering::Relaxed);
                if worker + 1 >= num_threads {
                    print_progress(chunk, part + 1 - num_threads as i64);
                }
                if part >= NUM_PARTS {
                    break;
                }
                let start = base + part * PART_SIZE;
                let bits = phase::compute_phase0_range(start, PART_SIZE);
                *slots.lock().unwrap()[part as usize] = bits;
            });
        }
    });
    clear_progress();
    parts.into_iter().flatten().collect()
}

/// Computes an odd/even phase for one chunk, keeping already-decisive
/// positions read from `current` and recomputing ties against `prior`.
pub fn run_phase_chunk(
    chunk: i64,
    expected: Outcome,
    current: &(impl Fn(i64) -> Outcome + Sync),
    prior: &(dyn PriorOutcomes + Sync),
) -> (Vec<Outcome>, ChunkStats) {
    let base = chunk * pushfight_core::constants::CHUNK_SIZE;
    let next_part = AtomicI64::new(0);
    let num_threads = rayon::current_num_threads();
    let mut parts: Vec<Vec<Outcome>> = (0..NUM_PARTS).map(|_| Vec::new()).collect();
    let slots: Vec<&mut Vec<Outcome>> = parts.iter_mut().collect();
    let slots = std::sync::Mutex::new(slots);
    let stats = std::sync::Mutex::new(ChunkStats::default());

    rayon::scope(|s| {
        for worker in 0..num_threads {
            let next_part = &next_part;
            let slots = &slots;
            let stats = &stats;
            s.spawn(move |_| loop {
                let part = next_part.fetch_add(1, Ordering::Relaxed);
                if worker + 1 >= num_threads {
                    print_progress(chunk, part + 1 - num_threads as i64);
                }
                if part >= NUM_PARTS {
                    break;
                }
                let start = base + part * PART_SIZE;
                let (outcomes, part_stats) =
                    phase::compute_chunk_range(start, PART_SIZE, expected, current, prior);
                *slots.lock().unwrap()[part as usize] = outcomes;
                stats.lock().unwrap().merge(part_stats);
            });
        }
    });
    clear_progress();
    let outcomes = parts.into_iter().flatten().collect();
    (outcomes, stats.into_inner().unwrap())
}

fn print_progress(chunk: i64, part: i64) {
    if part >= 0 {
        eprint!(
            "\r{} chunk {chunk}: part {part}/{} ",
            "solving".green(),
            NUM_PARTS
        );
    }
}

fn clear_progress() {
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_bits_packs_lsb_first() {
        let bits = [true, false, true, false, false, false, false, false, true];
        let bytes = encode_bits(&bits);
        assert_eq!(bytes[0], 0b0000_0101);
        assert_eq!(bytes[1], 0b0000_0001);
    }

    #[test]
    fn encode_outcomes_matches_rn_ternary_packing() {
        let outcomes = [
            Outcome::Tie,
            Outcome::Loss,
            Outcome::Win,
            Outcome::Tie,
            Outcome::Tie,
        ];
        let bytes = encode_outcomes(&outcomes);
        assert_eq!(bytes.len(), 1);
        assert_eq!(bytes[0], encode_ternary(outcomes));
    }
}
