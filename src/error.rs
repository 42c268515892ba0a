//! Error types for the tidy-assay library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum TidyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Table does not satisfy the {expected} format: missing columns {missing:?}")]
    SchemaMismatch { expected: String, missing: Vec<String> },

    #[error("Missing sample_id at row {row}")]
    NullSampleId { row: usize },

    #[error("Unrecognized table format with columns {0:?}")]
    UnrecognizedFormat(Vec<String>),

    #[error("Configuration mismatch for {what}: expected {expected}, got {actual}")]
    ConfigurationMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("Unresolved {kind} identifier '{id}' in column '{column}'")]
    UnresolvedIdentifier {
        kind: String,
        id: String,
        column: String,
    },

    #[error("Ambiguous {kind} identifier '{id}' in column '{column}'")]
    AmbiguousIdentifier {
        kind: String,
        id: String,
        column: String,
    },

    #[error("Unknown data type '{0}'")]
    UnknownDataType(String),

    #[error("Missing column '{0}'")]
    MissingColumn(String),

    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, TidyError>;
