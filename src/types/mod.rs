//! Type definitions shared by the extractor, the database utilities and the sampler
//!
//! The schema descriptor is the single source of column names and order; both the
//! CSV writer and the database loader go through it.

mod record;
mod schema;

pub use record::{FeatureRecord, Label};

pub use schema::{
    check_name, import_schema, pe_schema, Field, FieldKind, Schema, LABEL_COLUMN, NAME_COLUMN,
    PE_FEATURE_NAMES, PE_SCHEMA_VERSION, RAISED_EXCEPTION_COLUMN,
};
