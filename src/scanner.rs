use crate::analyzers::Analyzer;
use crate::config::ScanConfig;
use crate::error::{Result, TridentError};
use crate::file_io::read_sample;
use crate::types::{check_name, FeatureRecord, Label};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Progress is logged every this many files
const PROGRESS_INTERVAL: usize = 1000;

/// Where the files of a batch come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Walked recursively
    Directory(PathBuf),
    /// One path per line; blank lines and `#` comments are ignored
    FileList(PathBuf),
}

impl InputSource {
    /// Directories are walked, anything else is read as a file list
    pub fn detect<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if path.is_dir() {
            Self::Directory(path.to_path_buf())
        } else {
            Self::FileList(path.to_path_buf())
        }
    }
}

/// What happened to one input file
#[derive(Debug)]
pub enum FileOutcome {
    Examined,
    Skipped(TridentError),
    /// Byte-identical to an earlier file of the batch
    Duplicate { original: PathBuf },
}

#[derive(Debug)]
pub struct FileResult {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

impl FileResult {
    /// Human-readable status line for the audit log on stdout
    pub fn status_line(&self) -> String {
        let path = self.path.display();
        match &self.outcome {
            FileOutcome::Examined => format!("Examined {path}"),
            FileOutcome::Skipped(e) if e.is_format_error() => e.to_string(),
            FileOutcome::Skipped(e) => format!("Problems with {path}: {e}"),
            FileOutcome::Duplicate { original } => {
                format!("Duplicate {path} of {}", original.display())
            }
        }
    }
}

/// Counters of a finished batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub examined: usize,
    pub skipped: usize,
    pub duplicates: usize,
    /// Examined records with `RaisedException` set
    pub raised: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.examined + self.skipped + self.duplicates
    }
}

/// Builder for configuring and creating Scanner instances
#[derive(Debug)]
pub struct ScannerBuilder {
    config: ScanConfig,
}

impl ScannerBuilder {
    /// Create a new scanner builder with default configuration
    pub fn new() -> Self {
        Self { config: ScanConfig::default() }
    }

    /// Set the worker thread count (0 keeps the rayon default)
    #[must_use]
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.config.jobs = jobs;
        self
    }

    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    /// Skip files whose SHA-256 was already seen in the batch
    #[must_use]
    pub fn dedupe(mut self, dedupe: bool) -> Self {
        self.config.dedupe = dedupe;
        self
    }

    /// Set maximum file size to scan
    #[must_use]
    pub fn max_file_size(mut self, max_file_size: u64) -> Self {
        self.config.max_file_size = max_file_size;
        self
    }

    /// Set whether to follow symbolic links
    #[must_use]
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.config.follow_symlinks = follow;
        self
    }

    /// Set whether to scan hidden files (dotfiles)
    #[must_use]
    pub fn scan_hidden_files(mut self, scan_hidden: bool) -> Self {
        self.config.scan_hidden_files = scan_hidden;
        self
    }

    /// Set a custom configuration (validates the config)
    pub fn config(mut self, config: ScanConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn build(self) -> Result<Scanner> {
        self.config.validate()?;
        Ok(Scanner { config: self.config })
    }
}

impl Default for ScannerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Batch feature extraction over many files
#[derive(Debug)]
pub struct Scanner {
    config: ScanConfig,
}

/// Per-file result of the parallel phase, before de-duplication
struct Extracted {
    path: PathBuf,
    digest: Option<String>,
    result: Result<FeatureRecord>,
}

impl Scanner {
    /// Create a scanner builder for fluent configuration
    #[must_use]
    pub fn builder() -> ScannerBuilder {
        ScannerBuilder::new()
    }

    /// Create a scanner with a custom configuration
    pub fn with_config(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Expand an input source into the ordered list of files to scan
    pub fn collect_inputs(&self, source: &InputSource) -> Result<Vec<PathBuf>> {
        match source {
            InputSource::Directory(dir) => Ok(self.walk_directory(dir)),
            InputSource::FileList(list) => read_file_list(list),
        }
    }

    fn walk_directory(&self, dir_path: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let walker = WalkDir::new(dir_path)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                // Hidden directories are pruned along with hidden files
                entry.depth() == 0
                    || self.config.scan_hidden_files
                    || !entry.file_name().to_string_lossy().starts_with('.')
            });

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
                Ok(_) => {}
                // Graceful degradation for directory traversal errors
                Err(e) => warn!("Failed to access directory entry: {}", e),
            }
        }

        debug!("Collected {} files under {}", files.len(), dir_path.display());
        files
    }

    fn extract_one<A: Analyzer>(&self, analyzer: &A, path: &Path, label: Label) -> Extracted {
        let name = path.display().to_string();
        if let Err(e) = check_name(&name) {
            return Extracted { path: path.to_path_buf(), digest: None, result: Err(e) };
        }
        let data = match read_sample(path, self.config.max_file_size) {
            Ok(data) => data,
            Err(e) => {
                return Extracted { path: path.to_path_buf(), digest: None, result: Err(e) };
            }
        };

        let digest = self
            .config
            .dedupe
            .then(|| hex::encode(Sha256::digest(data.as_slice())));
        let result = analyzer.extract(&name, data.as_slice(), label);

        Extracted { path: path.to_path_buf(), digest, result }
    }

    /// Extract every input with `analyzer` and write one CSV line per examined
    /// file to `out`, in input order.
    ///
    /// The header line is written first when `write_header` is set. `on_file`
    /// sees every outcome in input order. A file's failure never stops the batch;
    /// only write errors and thread pool setup abort it.
    pub fn scan<A, W, F>(
        &self,
        analyzer: &A,
        inputs: &[PathBuf],
        label: Label,
        write_header: bool,
        out: &mut W,
        mut on_file: F,
    ) -> Result<BatchSummary>
    where
        A: Analyzer,
        W: Write,
        F: FnMut(&FileResult),
    {
        let schema = analyzer.schema();
        if write_header {
            writeln!(out, "{}", schema.header_line())?;
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs)
            .build()
            .map_err(|e| TridentError::invalid_argument(format!("thread pool: {e}")))?;

        info!("Scanning {} files as {}", inputs.len(), label);

        let mut summary = BatchSummary::default();
        let mut seen: HashMap<String, PathBuf> = HashMap::new();

        for chunk in inputs.chunks(self.config.chunk_size) {
            let extracted: Vec<Extracted> = pool.install(|| {
                chunk
                    .par_iter()
                    .map(|path| self.extract_one(analyzer, path, label))
                    .collect()
            });

            for item in extracted {
                let outcome = match item.result {
                    Err(e) => {
                        if e.is_recoverable() {
                            debug!("Skipping {}: {}", item.path.display(), e);
                        } else {
                            warn!("Unexpected error on {}: {}", item.path.display(), e);
                        }
                        summary.skipped += 1;
                        FileOutcome::Skipped(e)
                    }
                    Ok(record) => {
                        let original = item
                            .digest
                            .and_then(|d| match seen.get(&d) {
                                Some(first) => Some(first.clone()),
                                None => {
                                    seen.insert(d, item.path.clone());
                                    None
                                }
                            });
                        match original {
                            Some(original) => {
                                summary.duplicates += 1;
                                FileOutcome::Duplicate { original }
                            }
                            None => {
                                writeln!(out, "{}", schema.render(&record)?)?;
                                summary.examined += 1;
                                if record.raised_exception {
                                    summary.raised += 1;
                                }
                                FileOutcome::Examined
                            }
                        }
                    }
                };

                on_file(&FileResult { path: item.path, outcome });

                if summary.total() % PROGRESS_INTERVAL == 0 {
                    info!("Finished {} {}", summary.total(), label);
                }
            }
        }

        out.flush()?;
        info!(
            "Scan completed: {} examined, {} skipped, {} duplicates",
            summary.examined, summary.skipped, summary.duplicates
        );
        Ok(summary)
    }
}

/// Paths listed in a file, one per line
pub fn read_file_list(list: &Path) -> Result<Vec<PathBuf>> {
    let text = fs::read_to_string(list).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TridentError::path_not_found(list),
        _ => TridentError::Io(e),
    })?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(PathBuf::from)
        .collect())
}
