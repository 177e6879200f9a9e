//! Memory-mapped on-disk accessors.
//!
//! Reference: the original solver's `accessors.cc`. Every accessor owns its
//! mapped region and releases it on drop; accessors are move-only (ordinary
//! Rust ownership gives us that for free, unlike the C++ `unique_ptr` +
//! custom deleter this is ported from).
//!
//! File-size policy on open: if the file is shorter than expected, opening
//! fails; if longer, a warning is printed and only the expected-length
//! prefix is mapped.

pub mod loss_prop;
pub mod merged;
pub mod minimized;
pub mod r0;
pub mod rn;

use std::fs::{File, OpenOptions};
use std::path::Path;

use memmap2::{Mmap, MmapMut, MmapOptions};

use crate::error::StorageError;

fn checked_len(path: &Path, expected: u64) -> Result<File, StorageError> {
    let file = File::open(path).map_err(|e| StorageError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let actual = file
        .metadata()
        .map_err(|e| StorageError::Io {
            path: path.to_path_buf(),
            source: e,
        })?
        .len();
    if actual < expected {
        return Err(StorageError::FileTooShort {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }
    if actual > expected {
        eprintln!(
            "WARNING: file {} is longer than expected ({actual} > {expected} bytes); mapping prefix only",
            path.display()
        );
    }
    Ok(file)
}

/// Opens `path` read-only and memory-maps exactly `expected_len` bytes.
pub fn map_readonly(path: &Path, expected_len: u64) -> Result<Mmap, StorageError> {
    let file = checked_len(path, expected_len)?;
    unsafe {
        MmapOptions::new()
            .len(expected_len as usize)
            .map(&file)
            .map_err(|e| StorageError::Io {
                path: path.to_path_buf(),
                source: e,
            })
    }
}

/// Opens `path` read-write and memory-maps exactly `expected_len` bytes.
pub fn map_read_write(path: &Path, expected_len: u64) -> Result<MmapMut, StorageError> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|e| StorageError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
    let actual = file
        .metadata()
        .map_err(|e| StorageError::Io {
            path: path.to_path_buf(),
            source: e,
        })?
        .len();
    if actual < expected_len {
        return Err(StorageError::FileTooShort {
            path: path.to_path_buf(),
            expected: expected_len,
            actual,
        });
    }
    unsafe {
        MmapOptions::new()
            .len(expected_len as usize)
            .map_mut(&file)
            .map_err(|e| StorageError::Io {
                path: path.to_path_buf(),
                source: e,
            })
    }
}
