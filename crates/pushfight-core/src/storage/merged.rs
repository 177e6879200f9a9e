//! The merged array: one [`Value`] byte per `InProgress` permutation,
//! addressed by global rank. Produced by the merge stage before
//! minimization collapses it down to the reachable canonical index space.
//!
//! Reference: the original solver's `merge-phases.cc`.

use std::path::Path;

use memmap2::Mmap;

use crate::constants::TOTAL_PERMS;
use crate::error::StorageError;
use crate::types::Value;

use super::map_readonly;

pub struct MergedFile {
    mmap: Mmap,
}

impl MergedFile {
    pub fn open(path: &Path) -> Result<MergedFile, StorageError> {
        Ok(MergedFile {
            mmap: map_readonly(path, TOTAL_PERMS as u64)?,
        })
    }

    #[inline]
    pub fn get(&self, i: i64) -> Value {
        Value(self.mmap[i as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_wraps_raw_byte() {
        assert_eq!(Value(9).0, 9);
    }
}
