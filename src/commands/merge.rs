use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use super::load_database;

pub(crate) fn run(database: &Path, newdata: &Path, outfile: &Path) -> Result<()> {
    let original = load_database(database)?;
    let extra = load_database(newdata)?;

    // Validate everything before the output file is touched
    let merged = original
        .merge(&extra)
        .context("the provided databases are not compatible")?;

    merged
        .save(outfile)
        .with_context(|| format!("failed to write {}", outfile.display()))?;
    info!(
        "Wrote {} records with {} columns to {}",
        merged.len(),
        merged.schema().len(),
        outfile.display()
    );
    Ok(())
}
