//! Explicit column descriptors for feature databases

use std::collections::HashSet;

use crate::error::{Result, TridentError};

use super::record::FeatureRecord;

/// Record identifier column (file path)
pub const NAME_COLUMN: &str = "Name";
/// Class label column
pub const LABEL_COLUMN: &str = "isMalware";
/// Set when any optional structure had to be defaulted during extraction
pub const RAISED_EXCEPTION_COLUMN: &str = "RaisedException";

/// Version of the PE header feature layout below. Bump on any column change.
pub const PE_SCHEMA_VERSION: u32 = 1;

/// PE header features, in CSV order, between `Name` and `RaisedException`
pub const PE_FEATURE_NAMES: &[&str] = &[
    "NumberOfSections",
    "Year",
    "PointerToSymbolTable",
    "NumberOfSymbols",
    "BYTES_REVERSED_LO",
    "BYTES_REVERSED_HI",
    "RELOCS_STRIPPED",
    "LOCAL_SYMS_STRIPPED",
    "LINE_NUM_STRIPPED",
    "MajorLinkerVersion",
    "MinorLinkerVersion",
    "MajorOperatingSystemVersion",
    "MinorOperatingSystemVersion",
    "MajorImageVersion",
    "MinorImageVersion",
    "SizeOfCode",
    "SizeOfInitializedData",
    "SizeOfImage",
    "SizeOfHeaders",
    "SizeOfStackReserve",
    "SizeOfStackCommit",
    "SizeOfHeapReserve",
    "SizeOfHeapCommit",
    "AddressOfEntryPoint",
    "BaseOfCode",
    "BaseOfData",
    "Reserved1",
    "LoaderFlags",
    "NumberOfRvaAndSizes",
    "RawSize==0",
    "VirtualLessThanRaw",
    "VirtualWayGreaterThanRaw",
    "NumRelocation!==0",
    "NumLinenums!=0",
    "PointerToRawData==0",
    "PointerToRelocations!=0",
    "PointerToLinenumbers!=0",
    "LowEntropy",
    "HighEntropy",
    "Language=0",
    "Language>127",
    "SubLang=0",
    "SubLang=2",
    ".rsrc size",
    "sample size",
];

/// Storage kind of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

impl Field {
    pub fn new<S: Into<String>>(name: S) -> Self {
        let name = name.into();
        let kind = if name == NAME_COLUMN {
            FieldKind::Text
        } else {
            FieldKind::Integer
        };
        Self { name, kind }
    }
}

/// Ordered column layout of a feature database.
///
/// Exactly one `Name` column (text); every other column holds integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
    name_index: usize,
}

impl Schema {
    /// Build a schema from column names, validating the `Name` column and uniqueness
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<Field> = names.into_iter().map(Field::new).collect();

        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if field.name.is_empty() {
                return Err(TridentError::schema_mismatch("empty column name"));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(TridentError::schema_mismatch(format!(
                    "duplicate column '{}'",
                    field.name
                )));
            }
        }

        let name_index = fields
            .iter()
            .position(|f| f.kind == FieldKind::Text)
            .ok_or_else(|| {
                TridentError::schema_mismatch(format!("missing '{NAME_COLUMN}' column"))
            })?;

        Ok(Self { fields, name_index })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Column position among all fields
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn name_index(&self) -> usize {
        self.name_index
    }

    /// Integer column names in order (every column but `Name`)
    pub fn value_columns(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.kind == FieldKind::Integer)
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Position of a column among the integer columns
    pub fn value_position(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .filter(|f| f.kind == FieldKind::Integer)
            .position(|f| f.name == name)
    }

    /// Number of feature columns an extractor must fill: everything except
    /// `Name`, the label and the exception flag
    pub fn feature_width(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| {
                f.kind == FieldKind::Integer
                    && f.name != LABEL_COLUMN
                    && f.name != RAISED_EXCEPTION_COLUMN
            })
            .count()
    }

    /// Comma-space separated header line (no trailing newline)
    pub fn header_line(&self) -> String {
        self.names().collect::<Vec<_>>().join(", ")
    }

    /// Render one extracted record as a CSV line in this schema's column order
    pub fn render(&self, record: &FeatureRecord) -> Result<String> {
        check_name(&record.name)?;
        if record.features.len() != self.feature_width() {
            return Err(TridentError::schema_mismatch(format!(
                "record for {} has {} features, schema expects {}",
                record.name,
                record.features.len(),
                self.feature_width()
            )));
        }

        let mut features = record.features.iter();
        let mut cells = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let cell = match field.name.as_str() {
                NAME_COLUMN => record.name.clone(),
                LABEL_COLUMN => record.label.code().to_string(),
                RAISED_EXCEPTION_COLUMN => i64::from(record.raised_exception).to_string(),
                // Width was checked above
                _ => features.next().map(i64::to_string).unwrap_or_default(),
            };
            cells.push(cell);
        }

        Ok(cells.join(", "))
    }
}

/// Characters a CSV cell cannot carry
const RESERVED_NAME_CHARACTERS: [char; 3] = [',', '\n', '\r'];

/// Reject record names that would change the field count of a CSV line
pub fn check_name(name: &str) -> Result<()> {
    match name.chars().find(|c| RESERVED_NAME_CHARACTERS.contains(c)) {
        Some(character) => Err(TridentError::unsupported_name(name, character)),
        None => Ok(()),
    }
}

/// Column layout written by the PE header extractor
pub fn pe_schema() -> Schema {
    let names = std::iter::once(NAME_COLUMN)
        .chain(PE_FEATURE_NAMES.iter().copied())
        .chain([RAISED_EXCEPTION_COLUMN, LABEL_COLUMN]);
    Schema {
        fields: names.map(Field::new).collect(),
        name_index: 0,
    }
}

/// Column layout written by the import-symbol extractor: label first, then name
pub fn import_schema<S: AsRef<str>>(symbols: &[S]) -> Result<Schema> {
    let names = [LABEL_COLUMN, NAME_COLUMN]
        .into_iter()
        .map(str::to_string)
        .chain(symbols.iter().map(|s| s.as_ref().to_string()));
    Schema::from_names(names)
}
