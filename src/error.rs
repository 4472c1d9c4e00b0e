//! Error types for the bracketer.

use thiserror::Error;

/// Errors raised while validating an uploaded dataset.
///
/// Any of these aborts the run; no partial results are produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("empty values found in columns: {}", .0.join(", "))]
    EmptyValues(Vec<String>),

    #[error("non-numeric value in column '{column}' at row {row}: {value}")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("invalid sex value at row {row}: {value} (must be 'male' or 'female')")]
    InvalidSex { row: usize, value: String },

    #[error("invalid timestamp at row {row}: {value}")]
    InvalidTimestamp { row: usize, value: String },
}

/// Errors raised when a reference table has no entry for a validated exercise.
///
/// These indicate a configuration defect, never a per-row condition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    #[error("no {metric} goal standard configured for {exercise} ({sex})")]
    MissingStandard {
        exercise: String,
        sex: String,
        metric: String,
    },

    #[error("unknown exercise: {0}")]
    UnknownExercise(String),
}

/// Errors that can occur when reading a dataset file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("cannot read file: {0}")]
    CannotRead(String),

    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    #[error("unsupported file type: {0} (expected .csv, .xlsx, .xlsm, .xls or .ods)")]
    UnsupportedFormat(String),
}

/// Errors returned by the end-to-end analysis pipeline.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}
