use anyhow::Result;
use std::io::Write;
use std::path::Path;

use super::load_database;

pub(crate) fn run(database: &Path) -> Result<()> {
    let db = load_database(database)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for name in db.names() {
        writeln!(out, "{name}")?;
    }
    Ok(())
}
