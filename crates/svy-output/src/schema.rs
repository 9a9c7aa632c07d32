//! JSON schema sidecar describing a written dataset.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use svy_model::{ColumnRole, TabularDataset, VariableType};

use crate::error::{OutputError, Result};

#[derive(Debug, Serialize)]
struct SchemaDocument<'a> {
    dataset: &'a str,
    rows: usize,
    columns: Vec<SchemaColumn<'a>>,
}

#[derive(Debug, Serialize)]
struct SchemaColumn<'a> {
    name: &'a str,
    role: ColumnRole,
    #[serde(rename = "type")]
    column_type: VariableType,
}

/// Render the sidecar document for `dataset`.
pub fn schema_json(dataset: &TabularDataset) -> Result<String> {
    let document = SchemaDocument {
        dataset: &dataset.name,
        rows: dataset.row_count(),
        columns: dataset
            .schema()
            .iter()
            .map(|column| SchemaColumn {
                name: &column.name,
                role: column.role,
                column_type: column.column_type,
            })
            .collect(),
    };
    serde_json::to_string_pretty(&document).map_err(|source| OutputError::Schema {
        dataset: dataset.name.clone(),
        source,
    })
}

pub fn write_schema(path: &Path, dataset: &TabularDataset) -> Result<PathBuf> {
    let json = schema_json(dataset)?;
    fs::write(path, json).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(path.to_path_buf())
}
