//! Multimode reconciliation: one dataset out of the per-mode datasets.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{info, warn};

use svy_model::{
    Cell, Column, ColumnRole, Diagnostic, DiagnosticKind, Diagnostics, TabularDataset,
    VariableType,
};

use crate::error::Result;

/// Column recording which mode a row came from.
pub const MODE_COLUMN: &str = "MODE";

/// Where a mode's own `MODE` variable is kept in the stacked dataset.
pub const RENAMED_MODE_COLUMN: &str = "MODE_VARIABLE";

/// Output of stacking the modes of a campaign.
#[derive(Debug, Clone)]
pub struct StackResult {
    pub dataset: TabularDataset,
    pub diagnostics: Diagnostics,
}

/// First of `MODE_VARIABLE`, `MODE_VARIABLE_2`, ... not used by any mode.
fn renamed_mode_column(modes: &[(String, TabularDataset)]) -> String {
    let taken: HashSet<&str> = modes
        .iter()
        .flat_map(|(_, dataset)| dataset.schema().iter().map(|column| column.name.as_str()))
        .collect();
    let mut candidate = RENAMED_MODE_COLUMN.to_string();
    let mut suffix = 2;
    while taken.contains(candidate.as_str()) {
        candidate = format!("{RENAMED_MODE_COLUMN}_{suffix}");
        suffix += 1;
    }
    candidate
}

/// Stack per-mode datasets under a union schema.
///
/// Identifier columns come first, then measures, each in first-seen order,
/// then [`MODE_COLUMN`]. A column whose type differs between modes is kept
/// as text. A mode that declares its own `MODE` column keeps those values
/// under [`RENAMED_MODE_COLUMN`] and gets a diagnostic.
pub fn stack_modes(name: &str, modes: &[(String, TabularDataset)]) -> Result<StackResult> {
    let renamed = renamed_mode_column(modes);
    let stacked_name = |column: &Column| -> String {
        if column.name == MODE_COLUMN {
            renamed.clone()
        } else {
            column.name.clone()
        }
    };

    let mut diagnostics = Diagnostics::new();
    let mut identifiers: IndexMap<String, Column> = IndexMap::new();
    let mut measures: IndexMap<String, Column> = IndexMap::new();
    for (mode, dataset) in modes {
        for column in dataset.schema() {
            let column_name = stacked_name(column);
            if column.name == MODE_COLUMN {
                warn!(
                    mode = %mode,
                    column = %column_name,
                    "mode declares its own MODE column, renamed in the stacked dataset"
                );
                diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::UnknownVariable,
                        format!(
                            "{MODE_COLUMN} collides with the stacked mode column, kept as {column_name}"
                        ),
                    )
                    .with_mode(mode.clone())
                    .with_variable(MODE_COLUMN),
                );
            }
            let target = match column.role {
                ColumnRole::Identifier => &mut identifiers,
                ColumnRole::Measure => &mut measures,
            };
            match target.get_mut(&column_name) {
                Some(existing) if existing.column_type != column.column_type => {
                    warn!(
                        mode = %mode,
                        column = %column_name,
                        left = %existing.column_type,
                        right = %column.column_type,
                        "column type differs between modes, kept as text"
                    );
                    existing.column_type = VariableType::String;
                }
                Some(_) => {}
                None => {
                    let mut column = column.clone();
                    column.name.clone_from(&column_name);
                    target.insert(column_name, column);
                }
            }
        }
    }

    let measures: Vec<Column> = measures
        .into_values()
        .filter(|column| !identifiers.contains_key(&column.name))
        .collect();
    let mut schema: Vec<Column> = identifiers.into_values().collect();
    schema.extend(measures);
    schema.push(Column::measure(MODE_COLUMN, VariableType::String));

    let mut stacked = TabularDataset::new(name, schema)?;
    let mode_index = stacked.width() - 1;
    for (mode, dataset) in modes {
        let positions: Vec<Option<usize>> = dataset
            .schema()
            .iter()
            .map(|column| stacked.column_index(&stacked_name(column)))
            .collect();
        for row in dataset.rows() {
            let mut aligned: Vec<Cell> = stacked.empty_row();
            for (cell, position) in row.iter().zip(&positions) {
                if let Some(position) = position {
                    aligned[*position] = cell.clone();
                }
            }
            aligned[mode_index] = Some(mode.clone());
            stacked.push_row(aligned)?;
        }
    }
    info!(
        dataset = %name,
        modes = modes.len(),
        rows = stacked.row_count(),
        columns = stacked.width(),
        "modes reconciled"
    );
    Ok(StackResult {
        dataset: stacked,
        diagnostics,
    })
}
