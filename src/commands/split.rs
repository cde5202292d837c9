//! Export seeded stratified train/test splits as CSV databases.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;
use trident::config::DEFAULT_MAX_SEED;
use trident::sampling::{gen_seeds, gen_splits};
use trident::Database;

use super::{ensure_dir, load_database};

pub(crate) struct SplitOptions<'a> {
    pub database: &'a Path,
    pub outdir: &'a Path,
    pub seed: u64,
    pub count: usize,
    pub sizes: (usize, usize),
    pub prevalence: (f64, f64),
}

fn export(db: &Database, indices: &[usize], path: &Path) -> Result<()> {
    let part = db.select(indices)?;
    part.save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!(
        "{} of {} are malicious",
        part.malicious_count()?,
        part.len()
    );
    Ok(())
}

pub(crate) fn run(opts: &SplitOptions<'_>) -> Result<()> {
    let db = load_database(opts.database)?;
    let labels = db.labels()?;

    let seeds = gen_seeds(opts.seed, opts.count, DEFAULT_MAX_SEED)?;
    debug!("Split seeds: {:?}", seeds);
    // Every split is generated before anything is written
    let splits = gen_splits(&seeds, &labels, opts.sizes, opts.prevalence)?;

    ensure_dir(opts.outdir)?;
    for (i, split) in splits.iter().enumerate() {
        export(&db, &split.train, &opts.outdir.join(format!("tr{i}.csv")))?;
        export(&db, &split.test, &opts.outdir.join(format!("te{i}.csv")))?;
    }
    Ok(())
}
