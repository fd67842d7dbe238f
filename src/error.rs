//! Error types for the proteo-dea library.

use thiserror::Error;

/// Main error type for the library.
///
/// Data-integrity variants (`SampleMismatch`, `DuplicateProtein`) are fatal
/// and abort a stage before any computation runs. Per-protein numerical
/// failures are not errors at all: they surface as NaN fields in result rows.
#[derive(Error, Debug)]
pub enum DeaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid intensity value '{value}' at row {row}, column {col}")]
    InvalidValue {
        value: String,
        row: usize,
        col: usize,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Sample ID mismatch: {0}")]
    SampleMismatch(String),

    #[error("Duplicate protein accession '{0}'")]
    DuplicateProtein(String),

    #[error("Missing column '{0}'")]
    MissingColumn(String),

    #[error("Unknown diagnosis label '{0}'")]
    UnknownDiagnosis(String),

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

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
pub type Result<T> = std::result::Result<T, DeaError>;
