use std::path::PathBuf;
use thiserror::Error;

/// Error types shared by the extractor, the sampler and the database utilities.
#[derive(Debug, Error)]
pub enum TridentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{path} is not a pefile: {message}")]
    MalformedInput { path: String, message: String },

    #[error("Missing attribute: {attribute}")]
    MissingAttribute { attribute: String },

    #[error("Unknown {what} code: {code:#x}")]
    LookupFailure { what: String, code: u32 },

    #[error("Unsupported character {character:?} in name {path}")]
    UnsupportedName { path: String, character: char },

    #[error("Insufficient data: {message}")]
    InsufficientData { message: String },

    #[error("Prevalence must be within [0, 1], got {value}")]
    InvalidPrevalence { value: f64 },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Schema mismatch: {message}")]
    SchemaMismatch { message: String },

    #[error("Malformed database at line {line}: {message}")]
    MalformedDatabase { line: usize, message: String },

    #[error("Unrecognized algorithm: {name}")]
    UnknownAlgorithm { name: String },

    #[error("File too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, TridentError>;

impl TridentError {
    pub fn malformed_input<S1: Into<String>, S2: Into<String>>(path: S1, message: S2) -> Self {
        Self::MalformedInput { path: path.into(), message: message.into() }
    }

    pub fn missing_attribute<S: Into<String>>(attribute: S) -> Self {
        Self::MissingAttribute { attribute: attribute.into() }
    }

    pub fn lookup_failure<S: Into<String>>(what: S, code: u32) -> Self {
        Self::LookupFailure { what: what.into(), code }
    }

    pub fn unsupported_name<S: Into<String>>(path: S, character: char) -> Self {
        Self::UnsupportedName { path: path.into(), character }
    }

    pub fn insufficient_data<S: Into<String>>(message: S) -> Self {
        Self::InsufficientData { message: message.into() }
    }

    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument { message: message.into() }
    }

    pub fn schema_mismatch<S: Into<String>>(message: S) -> Self {
        Self::SchemaMismatch { message: message.into() }
    }

    pub fn malformed_database<S: Into<String>>(line: usize, message: S) -> Self {
        Self::MalformedDatabase { line, message: message.into() }
    }

    pub fn unknown_algorithm<S: Into<String>>(name: S) -> Self {
        Self::UnknownAlgorithm { name: name.into() }
    }

    pub fn file_too_large(size: u64, limit: u64) -> Self {
        Self::FileTooLarge { size, limit }
    }

    pub fn path_not_found<P: Into<PathBuf>>(path: P) -> Self {
        Self::PathNotFound { path: path.into() }
    }

    pub fn permission_denied<P: Into<PathBuf>>(path: P) -> Self {
        Self::PermissionDenied { path: path.into() }
    }

    /// Returns true if the error concerns a single input file and a batch can continue
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::MalformedInput { .. }
                | Self::UnsupportedName { .. }
                | Self::FileTooLarge { .. }
                | Self::PathNotFound { .. }
                | Self::PermissionDenied { .. }
        )
    }

    /// Returns true if the error is a format problem of the input rather than an I/O failure
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::MalformedInput { .. })
    }
}
