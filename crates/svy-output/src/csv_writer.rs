//! Delimited-text output.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use tracing::debug;

use svy_model::{TabularDataset, VariableType};

use crate::error::{OutputError, Result};

pub const DEFAULT_DELIMITER: u8 = b';';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvWriterOptions {
    pub delimiter: u8,
    /// Render booleans as `1`/`0` instead of `true`/`false`.
    pub numeric_booleans: bool,
}

impl Default for CsvWriterOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            numeric_booleans: true,
        }
    }
}

impl CsvWriterOptions {
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// Parse a configured delimiter such as `";"` or `"\t"`.
pub fn parse_delimiter(raw: &str) -> Result<u8> {
    let candidate = match raw {
        "\\t" | "tab" => "\t",
        other => other,
    };
    match candidate.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(OutputError::InvalidDelimiter(raw.to_string())),
    }
}

/// Encode one cell for output. Missing values become empty fields.
pub fn encode_cell<'a>(
    value: Option<&'a str>,
    column_type: VariableType,
    options: &CsvWriterOptions,
) -> &'a str {
    match (value, column_type) {
        (None, _) => "",
        (Some("true"), VariableType::Boolean) if options.numeric_booleans => "1",
        (Some("false"), VariableType::Boolean) if options.numeric_booleans => "0",
        (Some(text), _) => text,
    }
}

/// Write `dataset` with a header row to any writer.
pub fn write_csv_to<W: Write>(
    writer: W,
    dataset: &TabularDataset,
    options: &CsvWriterOptions,
    origin: &Path,
) -> Result<()> {
    let csv_error = |source| OutputError::Csv {
        path: origin.to_path_buf(),
        source,
    };
    let mut writer = WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);
    writer
        .write_record(dataset.schema().iter().map(|column| column.name.as_str()))
        .map_err(csv_error)?;
    for row in dataset.rows() {
        let record = row
            .iter()
            .zip(dataset.schema())
            .map(|(cell, column)| encode_cell(cell.as_deref(), column.column_type, options));
        writer.write_record(record).map_err(csv_error)?;
    }
    writer.flush().map_err(|source| OutputError::Io {
        path: origin.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Write `dataset` to `path`, replacing any existing file.
pub fn write_csv(path: &Path, dataset: &TabularDataset, options: &CsvWriterOptions) -> Result<PathBuf> {
    let file = File::create(path).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_csv_to(file, dataset, options, path)?;
    debug!(
        dataset = %dataset.name,
        path = %path.display(),
        rows = dataset.row_count(),
        "csv written"
    );
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiters() {
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert_eq!(parse_delimiter("\\t").unwrap(), b'\t');
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn booleans_follow_the_options() {
        let numeric = CsvWriterOptions::default();
        let textual = CsvWriterOptions {
            numeric_booleans: false,
            ..numeric
        };
        assert_eq!(encode_cell(Some("true"), VariableType::Boolean, &numeric), "1");
        assert_eq!(encode_cell(Some("false"), VariableType::Boolean, &numeric), "0");
        assert_eq!(encode_cell(Some("true"), VariableType::Boolean, &textual), "true");
        assert_eq!(encode_cell(Some("true"), VariableType::String, &numeric), "true");
        assert_eq!(encode_cell(None, VariableType::Integer, &numeric), "");
    }
}
