//! Feature databases: CSV files with a `Name` column and integer columns.
//!
//! Lines starting with `--` are comments and blank lines are ignored. Fields
//! are separated by `,` with optional surrounding whitespace; files are
//! always written with `", "`.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{Result, TridentError};
use crate::types::{check_name, Schema, LABEL_COLUMN, NAME_COLUMN};

const COMMENT_PREFIX: &str = "--";

/// One database record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub name: String,
    /// Integer cells in the order of [`Schema::value_columns`]
    pub values: Vec<i64>,
}

/// Feature matrix view of a database, without `Name` and `isMalware`
#[derive(Debug, Clone, PartialEq)]
pub struct Components {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<i64>,
    pub names: Vec<String>,
    pub feature_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Database {
    schema: Schema,
    rows: Vec<Row>,
}

fn split_fields(line: &str) -> Vec<&str> {
    line.split(',').map(str::trim).collect()
}

impl Database {
    pub fn new(schema: Schema, rows: Vec<Row>) -> Result<Self> {
        let width = schema.len() - 1;
        for row in &rows {
            check_name(&row.name)?;
        }
        if let Some(row) = rows.iter().find(|r| r.values.len() != width) {
            return Err(TridentError::schema_mismatch(format!(
                "row {} has {} values, schema expects {}",
                row.name,
                row.values.len(),
                width
            )));
        }
        Ok(Self { schema, rows })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TridentError::path_not_found(path),
            _ => TridentError::Io(e),
        })?;
        let db = Self::from_reader(BufReader::new(file))?;
        debug!(
            "Loaded {} records with {} columns from {}",
            db.len(),
            db.schema.len(),
            path.display()
        );
        Ok(db)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut schema: Option<Schema> = None;
        let mut rows = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
                continue;
            }

            let cells = split_fields(trimmed);
            let Some(schema) = schema.as_ref() else {
                let names = cells.iter().map(|c| c.trim_matches('"').to_string());
                schema = Some(Schema::from_names(names)?);
                continue;
            };

            if cells.len() != schema.len() {
                return Err(TridentError::malformed_database(
                    line_no,
                    format!("expected {} fields, found {}", schema.len(), cells.len()),
                ));
            }

            let name_index = schema.name_index();
            let mut values = Vec::with_capacity(schema.len() - 1);
            for (pos, cell) in cells.iter().enumerate() {
                if pos == name_index {
                    continue;
                }
                let value = cell.parse::<i64>().map_err(|_| {
                    TridentError::malformed_database(
                        line_no,
                        format!("'{}' in column '{}' is not an integer", cell, schema.fields()[pos].name),
                    )
                })?;
                values.push(value);
            }

            rows.push(Row { name: cells[name_index].to_string(), values });
        }

        let schema = schema.ok_or_else(|| TridentError::malformed_database(0, "missing header line"))?;
        Ok(Self { schema, rows })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut out = BufWriter::new(File::create(path.as_ref())?);
        self.write_to(&mut out)?;
        out.flush()?;
        Ok(())
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "{}", self.schema.header_line())?;
        let name_index = self.schema.name_index();
        for row in &self.rows {
            let mut cells: Vec<String> = row.values.iter().map(i64::to_string).collect();
            cells.insert(name_index, row.name.clone());
            writeln!(out, "{}", cells.join(", "))?;
        }
        Ok(())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.name.as_str()).collect()
    }

    /// Values of one integer column
    pub fn column(&self, name: &str) -> Result<Vec<i64>> {
        let pos = self.schema.value_position(name).ok_or_else(|| {
            TridentError::schema_mismatch(format!("no integer column '{name}'"))
        })?;
        Ok(self.rows.iter().map(|r| r.values[pos]).collect())
    }

    /// The `isMalware` column
    pub fn labels(&self) -> Result<Vec<i64>> {
        self.column(LABEL_COLUMN)
    }

    /// Split into feature matrix, labels, record names and feature names
    pub fn components(&self) -> Result<Components> {
        let labels = self.labels()?;
        let keep: Vec<(usize, &str)> = self
            .schema
            .value_columns()
            .into_iter()
            .enumerate()
            .filter(|(_, name)| *name != LABEL_COLUMN)
            .collect();

        let features = self
            .rows
            .iter()
            .map(|row| keep.iter().map(|(pos, _)| row.values[*pos] as f64).collect())
            .collect();

        Ok(Components {
            features,
            labels,
            names: self.rows.iter().map(|r| r.name.clone()).collect(),
            feature_names: keep.iter().map(|(_, name)| name.to_string()).collect(),
        })
    }

    /// Keep the columns for which `keep` holds, in schema order
    fn retain_columns<F: Fn(usize, &str) -> bool>(&self, keep: F) -> Result<Self> {
        let name_index = self.schema.name_index();
        let kept: Vec<usize> = self
            .schema
            .names()
            .enumerate()
            .filter(|(pos, name)| *pos == name_index || keep(*pos, name))
            .map(|(pos, _)| pos)
            .collect();

        let schema = Schema::from_names(kept.iter().map(|&pos| self.schema.fields()[pos].name.clone()))?;

        // Positions among the integer cells of the old schema
        let value_positions: Vec<usize> = kept
            .iter()
            .filter(|&&pos| pos != name_index)
            .map(|&pos| if pos > name_index { pos - 1 } else { pos })
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| Row {
                name: row.name.clone(),
                values: value_positions.iter().map(|&p| row.values[p]).collect(),
            })
            .collect();

        Ok(Self { schema, rows })
    }

    /// Drop a column by name. Unknown names leave the database unchanged.
    pub fn without_feature(&self, name: &str) -> Result<Self> {
        if name == NAME_COLUMN {
            return Err(TridentError::schema_mismatch("the Name column cannot be removed"));
        }
        self.retain_columns(|_, column| column != name)
    }

    /// Drop a column by its position in the header
    pub fn without_feature_at(&self, index: usize) -> Result<Self> {
        if index >= self.schema.len() {
            return Err(TridentError::invalid_argument(format!(
                "column {} out of range for {} columns",
                index,
                self.schema.len()
            )));
        }
        if index == self.schema.name_index() {
            return Err(TridentError::schema_mismatch("the Name column cannot be removed"));
        }
        self.retain_columns(|pos, _| pos != index)
    }

    /// Keep only the named columns (plus `Name`), in their current order
    pub fn only_features<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let wanted: HashSet<&str> = names.iter().map(AsRef::as_ref).collect();
        if let Some(missing) = wanted.iter().find(|n| !self.schema.contains(n)) {
            return Err(TridentError::schema_mismatch(format!("no column '{missing}'")));
        }
        self.retain_columns(|_, column| wanted.contains(column))
    }

    /// Rows at `indices`, in that order
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        let rows = indices
            .iter()
            .map(|&idx| {
                self.rows.get(idx).cloned().ok_or_else(|| {
                    TridentError::invalid_argument(format!(
                        "record index {} out of range for {} records",
                        idx,
                        self.rows.len()
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { schema: self.schema.clone(), rows })
    }

    /// Append the columns of `other` this database lacks.
    ///
    /// Both databases must describe the same records in the same order; this
    /// one needs `Name` and `isMalware`.
    pub fn merge(&self, other: &Database) -> Result<Self> {
        if !self.schema.contains(LABEL_COLUMN) {
            return Err(TridentError::schema_mismatch(format!(
                "original database has no '{LABEL_COLUMN}' column"
            )));
        }
        if self.len() != other.len() {
            return Err(TridentError::schema_mismatch(format!(
                "record counts differ: {} vs {}",
                self.len(),
                other.len()
            )));
        }
        if let Some((i, (a, b))) = self
            .rows
            .iter()
            .zip(&other.rows)
            .enumerate()
            .find(|(_, (a, b))| a.name != b.name)
        {
            return Err(TridentError::schema_mismatch(format!(
                "record {} differs: '{}' vs '{}'",
                i, a.name, b.name
            )));
        }

        let added: Vec<(&str, usize)> = other
            .schema
            .value_columns()
            .into_iter()
            .enumerate()
            .filter(|(_, name)| !self.schema.contains(name))
            .map(|(pos, name)| (name, pos))
            .collect();
        debug!("Merging {} new columns", added.len());

        let schema = Schema::from_names(
            self.schema
                .names()
                .chain(added.iter().map(|(name, _)| *name))
                .map(str::to_string),
        )?;

        let rows = self
            .rows
            .iter()
            .zip(&other.rows)
            .map(|(mine, theirs)| {
                let mut values = mine.values.clone();
                values.extend(added.iter().map(|(_, pos)| theirs.values[*pos]));
                Row { name: mine.name.clone(), values }
            })
            .collect();

        Ok(Self { schema, rows })
    }

    /// Number of records labelled malicious
    pub fn malicious_count(&self) -> Result<usize> {
        Ok(self.labels()?.iter().filter(|&&l| l == 1).count())
    }
}
