//! One small database per feature, for looking at features in isolation.

use anyhow::{Context, Result};
use std::path::Path;
use trident::types::{LABEL_COLUMN, NAME_COLUMN};

use super::{ensure_dir, load_database};

pub(crate) fn run(database: &Path, outdir: &Path) -> Result<()> {
    let db = load_database(database)?;
    let components = db.components()?;
    ensure_dir(outdir)?;

    for feature in &components.feature_names {
        let isolated = db.only_features(&[NAME_COLUMN, feature.as_str(), LABEL_COLUMN])?;
        let path = outdir.join(format!("{feature}.csv"));
        isolated
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("{}", path.display());
    }
    Ok(())
}
