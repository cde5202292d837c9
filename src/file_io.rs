//! Sample reading for the extractor.
//!
//! Large samples are memory-mapped instead of copied; both variants expose the
//! same byte slice to the PE parser.

use crate::error::{Result, TridentError};
use memmap2::Mmap;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

/// Files larger than this are memory-mapped (zero-copy).
const MMAP_THRESHOLD: u64 = 10 * 1024 * 1024; // 10 MB

/// Sample bytes, either mapped or owned.
pub enum FileData {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl FileData {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            FileData::Mapped(mmap) => mmap,
            FileData::Owned(vec) => vec,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn io_error(path: &Path, err: std::io::Error) -> TridentError {
    match err.kind() {
        ErrorKind::NotFound => TridentError::path_not_found(path),
        ErrorKind::PermissionDenied => TridentError::permission_denied(path),
        _ => TridentError::Io(err),
    }
}

/// Read a sample, refusing anything above `max_size` bytes.
pub fn read_sample(path: &Path, max_size: u64) -> Result<FileData> {
    let metadata = std::fs::metadata(path).map_err(|e| io_error(path, e))?;
    let file_size = metadata.len();

    if file_size > max_size {
        return Err(TridentError::file_too_large(file_size, max_size));
    }

    if file_size > MMAP_THRESHOLD {
        let file = File::open(path).map_err(|e| io_error(path, e))?;
        // SAFETY: the mapping is read-only and dropped before the scan of this file ends
        let mmap = unsafe { Mmap::map(&file).map_err(|e| io_error(path, e))? };
        tracing::debug!(
            "Memory-mapped large sample ({:.2} MB): {}",
            file_size as f64 / 1024.0 / 1024.0,
            path.display()
        );
        Ok(FileData::Mapped(mmap))
    } else {
        let data = std::fs::read(path).map_err(|e| io_error(path, e))?;
        Ok(FileData::Owned(data))
    }
}
