//! The minimized index: one [`Value`](crate::types::Value) byte per
//! reachable canonical position.

use std::path::Path;

use memmap2::{Mmap, MmapMut};

use crate::constants::TOTAL_MINIMIZED;
use crate::error::StorageError;
use crate::types::Value;

use super::{map_read_write, map_readonly};

pub struct MinimizedFile {
    mmap: Mmap,
}

impl MinimizedFile {
    pub fn open(path: &Path) -> Result<MinimizedFile, StorageError> {
        Ok(MinimizedFile {
            mmap: map_readonly(path, TOTAL_MINIMIZED as u64)?,
        })
    }

    #[inline]
    pub fn read_byte(&self, i: i64) -> Value {
        Value(self.mmap[i as usize])
    }

    /// Batch-reads values at `sorted_offsets`, in the same order. Offsets
    /// need not be distinct but must be in nondecreasing order (this is a
    /// hint for sequential-access-friendly callers, not an enforced
    /// invariant: out-of-order offsets still return correct values).
    pub fn read_bytes(&self, sorted_offsets: &[i64]) -> Vec<Value> {
        sorted_offsets.iter().map(|&i| self.read_byte(i)).collect()
    }
}

/// A writable `minimized.bin`, pre-sized to [`TOTAL_MINIMIZED`] bytes and
/// zero-initialized; [`crate::minimize::minify`] only writes decisive
/// (non-`Tie`) offsets, leaving the rest at their zero-initialized `Tie`.
pub struct MinimizedFileMut {
    mmap: MmapMut,
}

impl MinimizedFileMut {
    pub fn open(path: &Path) -> Result<MinimizedFileMut, StorageError> {
        Ok(MinimizedFileMut {
            mmap: map_read_write(path, TOTAL_MINIMIZED as u64)?,
        })
    }

    #[inline]
    pub fn write(&mut self, i: i64, value: Value) {
        self.mmap[i as usize] = value.0;
    }

    pub fn flush(&self) -> std::io::Result<()> {
        self.mmap.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_wraps_raw_byte() {
        assert_eq!(Value(7).0, 7);
    }
}
