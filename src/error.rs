//! Error types for dataset loading and normalization.

use thiserror::Error;

/// A dataset could not be retrieved or is not readable as CSV.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid dataset url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV response: {0}")]
    Malformed(#[from] csv::Error),
}

/// A loaded table does not have the shape the analysis expects.
#[derive(Error, Debug, PartialEq)]
pub enum SchemaError {
    #[error("missing column {column}")]
    MissingColumn { column: String },
    #[error("column {column}, row {row}: unknown category {value:?}")]
    UnknownCategory {
        column: String,
        row: usize,
        value: String,
    },
    #[error("column {column}, row {row}: expected a count, got {value:?}")]
    InvalidCount {
        column: String,
        row: usize,
        value: String,
    },
    #[error("column {column}, row {row}: expected a date, got {value:?}")]
    InvalidDate {
        column: String,
        row: usize,
        value: String,
    },
    #[error("row {row}: repeats {key}")]
    DuplicateRow { row: usize, key: String },
    #[error("column {column}, row {row}: expected a coordinate, got {value:?}")]
    InvalidCoordinate {
        column: String,
        row: usize,
        value: String,
    },
}
