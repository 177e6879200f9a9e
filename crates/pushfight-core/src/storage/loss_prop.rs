//! The loss-propagation scratch file: a bitmap of winning indices found
//! during back-propagation, plus a bitmap of which chunks have finished.
//!
//! Same shape as an in-process atomic bitset, extended from one `u64` to an
//! arbitrarily large memory-mapped region shared across worker threads.

use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};

use memmap2::MmapMut;

use crate::constants::{NUM_CHUNKS, TOTAL_MINIMIZED};
use crate::error::StorageError;

use super::map_read_write;

fn bytes_for_bits(bits: i64) -> u64 {
    (bits as u64).div_ceil(8)
}

/// A memory-mapped, atomically-updated bitmap, split into a "found" segment
/// (one bit per minimized index) followed by a "chunk complete" segment (one
/// bit per chunk).
pub struct LossPropFile {
    mmap: MmapMut,
    chunk_segment_offset: usize,
}

impl LossPropFile {
    pub fn open(path: &Path) -> Result<LossPropFile, StorageError> {
        let found_len = bytes_for_bits(TOTAL_MINIMIZED);
        let chunk_len = bytes_for_bits(NUM_CHUNKS);
        let mmap = map_read_write(path, found_len + chunk_len)?;
        Ok(LossPropFile {
            mmap,
            chunk_segment_offset: found_len as usize,
        })
    }

    fn atomic_byte(&self, index: usize) -> &AtomicU8 {
        // SAFETY: `AtomicU8` has the same layout as `u8`; all access to this
        // byte, in this process, goes through `AtomicU8` operations, so
        // concurrent writers (one per chunk, potentially touching the same
        // byte across chunk boundaries) never race on a plain read-modify-write.
        unsafe { AtomicU8::from_ptr(self.mmap.as_ptr().add(index) as *mut u8) }
    }

    /// Atomically sets the "found" bit for minimized index `i`. Returns
    /// whether it was already set.
    pub fn mark_found(&self, i: i64) -> bool {
        let byte_index = (i / 8) as usize;
        let mask = 1u8 << (i % 8);
        let prev = self.atomic_byte(byte_index).fetch_or(mask, Ordering::AcqRel);
        prev & mask != 0
    }

    pub fn is_found(&self, i: i64) -> bool {
        let byte_index = (i / 8) as usize;
        let mask = 1u8 << (i % 8);
        self.atomic_byte(byte_index).load(Ordering::Acquire) & mask != 0
    }

    pub fn mark_chunk_complete(&self, chunk: i64) {
        let bit = self.chunk_segment_offset * 8 + chunk as usize;
        self.atomic_byte(bit / 8)
            .fetch_or(1 << (bit % 8), Ordering::AcqRel);
    }

    pub fn is_chunk_complete(&self, chunk: i64) -> bool {
        let bit = self.chunk_segment_offset * 8 + chunk as usize;
        self.atomic_byte(bit / 8).load(Ordering::Acquire) & (1 << (bit % 8)) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_sizes_cover_the_index_space() {
        assert_eq!(bytes_for_bits(1), 1);
        assert_eq!(bytes_for_bits(8), 1);
        assert_eq!(bytes_for_bits(9), 2);
    }
}
