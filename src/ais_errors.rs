use thiserror::Error;

#[derive(Error, Debug)]
pub enum AisError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Analysis mode '{0}' requires the model inference framework and is not supported here")]
    UnsupportedMode(String),

    #[error("Unknown analysis mode: {0}")]
    UnknownMode(String),

    #[error("Unknown bound: {0}")]
    UnknownBound(String),

    #[error("Input file not found: {0}")]
    InputNotFound(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow_schema::ArrowError),

    #[error("Column '{0}' not found in schema")]
    MissingColumn(String),

    #[error("Column '{column}' must be {expected}")]
    InvalidColumnType {
        column: String,
        expected: &'static str,
    },

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("NPY write error: {0}")]
    NpyError(#[from] ndarray_npy::WriteNpyError),

    #[error("Grid shape mismatch: expected {expected:?}, got {got:?}")]
    GridShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("UTF-8 Path error: {0}")]
    Utf8PathError(String),
}

impl PartialEq for AisError {
    fn eq(&self, other: &Self) -> bool {
        use AisError::*;
        match (self, other) {
            (InvalidConfig(a), InvalidConfig(b)) => a == b,
            (UnsupportedMode(a), UnsupportedMode(b)) => a == b,
            (UnknownMode(a), UnknownMode(b)) => a == b,
            (UnknownBound(a), UnknownBound(b)) => a == b,
            (InputNotFound(a), InputNotFound(b)) => a == b,
            (MissingColumn(a), MissingColumn(b)) => a == b,
            (
                InvalidColumnType {
                    column: a,
                    expected: ea,
                },
                InvalidColumnType {
                    column: b,
                    expected: eb,
                },
            ) => a == b && ea == eb,
            (
                GridShapeMismatch {
                    expected: ea,
                    got: ga,
                },
                GridShapeMismatch {
                    expected: eb,
                    got: gb,
                },
            ) => ea == eb && ga == gb,
            (Utf8PathError(a), Utf8PathError(b)) => a == b,

            // Wrapped library errors are not comparable: same variant is enough
            (IoError(_), IoError(_)) => true,
            (ParquetError(_), ParquetError(_)) => true,
            (ArrowError(_), ArrowError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (JsonError(_), JsonError(_)) => true,
            (TomlError(_), TomlError(_)) => true,
            (NpyError(_), NpyError(_)) => true,

            _ => false,
        }
    }
}
