use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to serialize schema for {dataset}: {source}")]
    Schema {
        dataset: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid output delimiter {0:?}: must be a single ASCII character")]
    InvalidDelimiter(String),
}

pub type Result<T> = std::result::Result<T, OutputError>;
