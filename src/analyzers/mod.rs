pub mod imports;
pub mod language;
pub mod pe;
pub mod resources;

use crate::config::MAX_FILE_SIZE;
use crate::error::Result;
use crate::file_io::read_sample;
use crate::types::{FeatureRecord, Label, Schema};
use std::path::Path;

pub use imports::ImportAnalyzer;
pub use pe::PeAnalyzer;

/// Trait for per-file feature extractors
pub trait Analyzer: Send + Sync {
    /// Column layout of the records this analyzer produces
    fn schema(&self) -> Schema;

    /// Extract one record from the complete contents of a file
    fn extract(&self, name: &str, data: &[u8], label: Label) -> Result<FeatureRecord>;

    /// Files above this size are refused before reading
    fn max_file_size(&self) -> u64 {
        MAX_FILE_SIZE
    }

    /// Read a file and extract its record
    fn analyze(&self, file_path: &Path, label: Label) -> Result<FeatureRecord> {
        let data = read_sample(file_path, self.max_file_size())?;
        self.extract(&file_path.display().to_string(), data.as_slice(), label)
    }
}
