//! Survey dataset writers.

pub mod csv_writer;
pub mod error;
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use svy_model::TabularDataset;

pub use csv_writer::{
    CsvWriterOptions, DEFAULT_DELIMITER, encode_cell, parse_delimiter, write_csv, write_csv_to,
};
pub use error::{OutputError, Result};
pub use schema::{schema_json, write_schema};

/// Files written for one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetOutput {
    pub dataset: String,
    pub data: PathBuf,
    pub schema: PathBuf,
}

/// Ensure an output directory exists.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Write `<name>.csv` and `<name>_schema.json` for every dataset.
pub fn write_dataset_outputs(
    output_dir: &Path,
    datasets: &[TabularDataset],
    options: &CsvWriterOptions,
) -> Result<Vec<DatasetOutput>> {
    ensure_output_dir(output_dir)?;
    let mut outputs = Vec::with_capacity(datasets.len());
    for dataset in datasets {
        let data = write_csv(&output_dir.join(format!("{}.csv", dataset.name)), dataset, options)?;
        let schema = write_schema(
            &output_dir.join(format!("{}_schema.json", dataset.name)),
            dataset,
        )?;
        outputs.push(DatasetOutput {
            dataset: dataset.name.clone(),
            data,
            schema,
        });
    }
    Ok(outputs)
}
