//! R0: one bit per position, `1` meaning an immediate win for the mover.

use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::constants::{CHUNK_SIZE, NUM_CHUNKS};
use crate::error::StorageError;

use super::map_readonly;

/// A single merged `r0.bin` covering the whole index space.
pub struct R0File {
    mmap: Mmap,
}

impl R0File {
    pub fn open(path: &Path) -> Result<R0File, StorageError> {
        let expected = (crate::constants::TOTAL_PERMS as u64).div_ceil(8);
        Ok(R0File {
            mmap: map_readonly(path, expected)?,
        })
    }

    #[inline]
    pub fn get(&self, i: i64) -> bool {
        let byte = self.mmap[(i / 8) as usize];
        (byte >> (i % 8)) & 1 != 0
    }
}

/// One mapped file per chunk, as produced directly by phase-0 workers before
/// merging.
pub struct ChunkedR0Accessor {
    maps: Vec<Mmap>,
}

impl ChunkedR0Accessor {
    pub fn open(dir: &Path) -> Result<ChunkedR0Accessor, StorageError> {
        let expected = (CHUNK_SIZE as u64).div_ceil(8);
        let mut maps = Vec::with_capacity(NUM_CHUNKS as usize);
        for chunk in 0..NUM_CHUNKS {
            let path: PathBuf = dir.join(crate::chunk::chunk_r0_file_name(chunk));
            maps.push(map_readonly(&path, expected)?);
        }
        Ok(ChunkedR0Accessor { maps })
    }

    #[inline]
    pub fn get(&self, i: i64) -> bool {
        let (chunk, local) = crate::chunk::chunk_of(i);
        let byte = self.maps[chunk as usize][(local / 8) as usize];
        (byte >> (local % 8)) & 1 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_extraction_matches_expected_layout() {
        // byte 0b0000_0101 has bits 0 and 2 set.
        let byte = 0b0000_0101u8;
        for i in 0..8u32 {
            let want = matches!(i, 0 | 2);
            assert_eq!((byte >> i) & 1 != 0, want);
        }
    }
}
