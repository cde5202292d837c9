use anyhow::{Context, Result};
use std::path::Path;
use trident::{run_trial, TrialConfig};

use super::load_database;

pub(crate) struct TrialOptions<'a> {
    pub database: &'a Path,
    pub algorithm: &'a str,
    pub seed: u64,
    pub num_samples: usize,
    pub malfrac: Option<(f64, f64)>,
    pub beta: f64,
    pub splits: usize,
    pub export: Option<&'a Path>,
    pub json: bool,
}

pub(crate) fn run(opts: &TrialOptions<'_>) -> Result<()> {
    let db = load_database(opts.database)?;

    if let Some(path) = opts.export {
        db.save(path)
            .with_context(|| format!("failed to export database to {}", path.display()))?;
    }

    let mut config = match opts.malfrac {
        Some(malfrac) => TrialConfig::new(opts.seed, opts.num_samples, malfrac),
        None => TrialConfig::unstratified(opts.seed, opts.num_samples),
    };
    config.beta = opts.beta;
    config.splits = opts.splits;

    let report = run_trial(&db, opts.algorithm, &config)?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let malfrac = match report.prevalence {
            Some((train, test)) => format!("{train},{test}"),
            None => "none".to_string(),
        };
        println!(
            "database={} algorithm={} seed={} numsamples={} malfrac={} beta={}",
            opts.database.display(),
            report.algorithm,
            report.seed,
            report.num_samples,
            malfrac,
            opts.beta
        );
        print!("{}", report.table());
    }
    Ok(())
}
