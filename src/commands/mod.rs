//! Command implementations for the trident CLI.
//!
//! - **scan**: PE header feature extraction into a CSV database
//! - **imports**: import-symbol presence features on stdout
//! - **merge**, **isolate**, **names**: database utilities
//! - **split**: seeded stratified train/test exports
//! - **trial**: repeated-split classifier evaluation
//!
//! Every command returns `anyhow::Result`; an error ends the process with
//! status 1. Per-file problems during extraction are reported on stdout and
//! do not fail the command.

pub(crate) mod imports;
pub(crate) mod isolate;
pub(crate) mod merge;
pub(crate) mod names;
pub(crate) mod scan;
pub(crate) mod split;
pub(crate) mod trial;

use anyhow::{Context, Result};
use std::path::Path;
use trident::Database;

/// Load a database, naming the file in the error
pub(crate) fn load_database(path: &Path) -> Result<Database> {
    Database::load(path).with_context(|| format!("failed to load database {}", path.display()))
}

/// Create `dir` (and parents) if missing
pub(crate) fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))
}
