//! Import-symbol presence features.
//!
//! Each record holds one 0/1 column per symbol of a fixed symbol list, in
//! list order, telling whether any import descriptor of the image names it.

use std::collections::HashSet;
use std::path::Path;

use goblin::pe::PE;
use tracing::trace;

use crate::analyzers::Analyzer;
use crate::error::{Result, TridentError};
use crate::types::{import_schema, FeatureRecord, Label, Schema};

pub struct ImportAnalyzer {
    symbols: Vec<String>,
    schema: Schema,
}

impl ImportAnalyzer {
    /// Build an analyzer over the given symbol list. Symbols are trimmed;
    /// blank entries are dropped.
    pub fn new<S: AsRef<str>>(symbols: &[S]) -> Result<Self> {
        let symbols: Vec<String> = symbols
            .iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let schema = import_schema(&symbols)?;
        Ok(Self {
            symbols,
            schema,
        })
    }

    /// Read a symbol list file, one symbol per line
    pub fn from_list_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let lines: Vec<&str> = text.lines().collect();
        Self::new(&lines)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Imported symbol names of an in-memory image
    pub fn imported_names(name: &str, data: &[u8]) -> Result<HashSet<String>> {
        let pe = PE::parse(data).map_err(|e| TridentError::malformed_input(name, e.to_string()))?;
        Ok(pe.imports.iter().map(|imp| imp.name.to_string()).collect())
    }

    pub fn extract_bytes(&self, name: &str, data: &[u8], label: Label) -> Result<FeatureRecord> {
        let imported = Self::imported_names(name, data)?;
        trace!("{} imports {} symbols", name, imported.len());

        let features = self
            .symbols
            .iter()
            .map(|s| i64::from(imported.contains(s)))
            .collect();

        // The import layout only distinguishes malicious from everything else
        let label = match label {
            Label::Malicious => Label::Malicious,
            _ => Label::Clean,
        };
        Ok(FeatureRecord::new(name, label, features))
    }
}

impl Analyzer for ImportAnalyzer {
    fn schema(&self) -> Schema {
        self.schema.clone()
    }

    fn extract(&self, name: &str, data: &[u8], label: Label) -> Result<FeatureRecord> {
        self.extract_bytes(name, data, label)
    }
}
