//! Error types for survey input reading.

use std::path::PathBuf;

use svy_model::ModelError;
use thiserror::Error;

/// Errors that stop a whole input from being read.
///
/// Problems limited to one respondent or one column are reported as
/// [`svy_model::Diagnostic`]s instead.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Directory not found or not readable.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === CSV Errors ===
    #[error("failed to parse CSV {path}: {source}")]
    CsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Required column not found in a CSV header.
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    // === Metadata Errors ===
    #[error("failed to parse metadata descriptor {path}: {source}")]
    MetadataParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid value in a metadata field.
    #[error("invalid {field} value '{value}' in {path}")]
    InvalidValue {
        field: String,
        value: String,
        path: PathBuf,
    },

    /// Descriptor parsed but does not form a valid registry.
    #[error("invalid metadata in {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    // === Paradata Errors ===
    #[error("malformed paradata document {path}: {reason}")]
    MalformedParadata { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, IngestError>;
