//! Import-symbol presence features, written to stdout.

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::warn;
use trident::scanner::{read_file_list, FileOutcome};
use trident::{ImportAnalyzer, Label, Scanner};

pub(crate) fn run(file_list: &Path, imports_list: &Path, label: &str, no_header: bool) -> Result<()> {
    let label = match label {
        "malicious" => Label::Malicious,
        "benign" => Label::Clean,
        other => bail!("invalid label '{}': expected 'malicious' or 'benign'", other),
    };

    let analyzer = ImportAnalyzer::from_list_file(imports_list)
        .with_context(|| format!("failed to read import list {}", imports_list.display()))?;
    let files = read_file_list(file_list)
        .with_context(|| format!("failed to read file list {}", file_list.display()))?;

    let scanner = Scanner::builder().build()?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    scanner.scan(&analyzer, &files, label, !no_header, &mut out, |result| {
        if !matches!(result.outcome, FileOutcome::Examined) {
            warn!("{}", result.status_line());
        }
    })?;
    out.flush()?;
    Ok(())
}
