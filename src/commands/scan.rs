//! Batch PE header feature extraction.

use anyhow::{bail, Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;
use trident::{InputSource, Label, PeAnalyzer, ScanConfig, Scanner};

pub(crate) struct ScanOptions<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub file_type: &'a str,
    pub append: bool,
    pub jobs: usize,
    pub dedupe: bool,
    pub follow_symlinks: bool,
    pub hidden: bool,
}

pub(crate) fn run(opts: &ScanOptions<'_>) -> Result<()> {
    let Some(label) = Label::from_tag(opts.file_type) else {
        bail!(
            "invalid file type '{}': expected 'malware' or 'clean'",
            opts.file_type
        );
    };

    // Appending requires an existing database; otherwise the header is written once
    let file = if opts.append {
        if !opts.output.is_file() {
            bail!(
                "cannot append: {} does not exist",
                opts.output.display()
            );
        }
        OpenOptions::new()
            .append(true)
            .open(opts.output)
            .with_context(|| format!("failed to open {}", opts.output.display()))?
    } else {
        File::create(opts.output)
            .with_context(|| format!("failed to create {}", opts.output.display()))?
    };
    let mut out = BufWriter::new(file);

    let config = ScanConfig {
        jobs: opts.jobs,
        dedupe: opts.dedupe,
        follow_symlinks: opts.follow_symlinks,
        scan_hidden_files: opts.hidden,
        ..ScanConfig::default()
    };
    let scanner = Scanner::builder().config(config.clone())?.build()?;
    let analyzer = PeAnalyzer::new().with_config(config);

    let inputs = scanner
        .collect_inputs(&InputSource::detect(opts.input))
        .with_context(|| format!("failed to read inputs from {}", opts.input.display()))?;

    let stdout = std::io::stdout();
    let mut status = stdout.lock();
    let summary = scanner.scan(&analyzer, &inputs, label, !opts.append, &mut out, |result| {
        // A closed stdout must not abort the batch
        let _ = writeln!(status, "{}", result.status_line());
    })?;
    out.flush()?;

    info!(
        "{} of {} files written to {} ({} with defaulted attributes)",
        summary.examined,
        summary.total(),
        opts.output.display(),
        summary.raised
    );
    Ok(())
}
