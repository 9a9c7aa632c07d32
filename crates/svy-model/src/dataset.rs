#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::metadata::VariableType;

/// Name of the respondent identifier column, always first in a dataset.
pub const ROOT_IDENTIFIER_NAME: &str = "IdUE";

/// A single cell. `None` is a missing value, distinct from `Some("")`.
pub type Cell = Option<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    Identifier,
    Measure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub role: ColumnRole,
    pub column_type: VariableType,
}

impl Column {
    pub fn identifier(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: ColumnRole::Identifier,
            column_type: VariableType::String,
        }
    }

    pub fn measure(name: impl Into<String>, column_type: VariableType) -> Self {
        Self {
            name: name.into(),
            role: ColumnRole::Measure,
            column_type,
        }
    }

    pub fn is_identifier(&self) -> bool {
        self.role == ColumnRole::Identifier
    }
}

/// Flat dataset: an ordered schema plus rows aligned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabularDataset {
    pub name: String,
    schema: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

impl TabularDataset {
    /// Create an empty dataset. Duplicate column names are rejected.
    pub fn new(name: impl Into<String>, schema: Vec<Column>) -> Result<Self> {
        for (index, column) in schema.iter().enumerate() {
            if schema[..index].iter().any(|other| other.name == column.name) {
                return Err(ModelError::DuplicateColumn {
                    name: column.name.clone(),
                });
            }
        }
        Ok(Self {
            name: name.into(),
            schema,
            rows: Vec::new(),
        })
    }

    pub fn schema(&self) -> &[Column] {
        &self.schema
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Cell>> {
        self.rows
    }

    pub fn width(&self) -> usize {
        self.schema.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.iter().position(|column| column.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.schema.iter().find(|column| column.name == name)
    }

    pub fn identifier_columns(&self) -> impl Iterator<Item = &Column> {
        self.schema.iter().filter(|column| column.is_identifier())
    }

    /// A blank row of the right width.
    pub fn empty_row(&self) -> Vec<Cell> {
        vec![None; self.schema.len()]
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.schema.len() {
            return Err(ModelError::RowLengthMismatch {
                expected: self.schema.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append every row of `other`; schemas must match by name and order.
    pub fn append(&mut self, other: TabularDataset) -> Result<()> {
        let same_layout = self.schema.len() == other.schema.len()
            && self
                .schema
                .iter()
                .zip(&other.schema)
                .all(|(left, right)| left.name == right.name);
        if !same_layout {
            return Err(ModelError::Message(format!(
                "cannot append dataset {} to {}: schemas differ",
                other.name, self.name
            )));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    /// Values of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let index = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row[index].as_deref())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_misaligned_rows() {
        let mut dataset = TabularDataset::new(
            "WEB",
            vec![
                Column::identifier(ROOT_IDENTIFIER_NAME),
                Column::measure("AGE", VariableType::Integer),
            ],
        )
        .unwrap();
        let err = dataset.push_row(vec![Some("UE1".to_string())]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::RowLengthMismatch {
                expected: 2,
                actual: 1
            }
        ));
        dataset
            .push_row(vec![Some("UE1".to_string()), None])
            .unwrap();
        assert_eq!(dataset.row_count(), 1);
    }

    #[test]
    fn rejects_duplicate_columns() {
        let result = TabularDataset::new(
            "WEB",
            vec![Column::identifier("A"), Column::identifier("A")],
        );
        assert!(result.is_err());
    }
}
