//! Answer-tree flattening.
//!
//! Walks each respondent's [`GroupInstance`] tree against the mode's
//! [`MetadataRegistry`] and emits rows into a [`TabularDataset`]:
//!
//! - column 0 is the respondent identifier (`IdUE`)
//! - then one identifier column per loop, carrying the instance id of the
//!   loop a row belongs to
//! - then one measure column per registered variable
//!
//! A respondent without loops yields a single row. Otherwise every loop
//! instance yields its own row carrying the values of all its ancestors;
//! sibling loops are never crossed with each other.

use std::collections::HashMap;

use tracing::{debug, warn};

use svy_model::{
    Cell, Column, Diagnostic, DiagnosticKind, Diagnostics, GroupInstance, MetadataRegistry,
    NestingMode, QuestionnaireData, ROOT_IDENTIFIER_NAME, TabularDataset, VariableType,
};

use crate::error::Result;

/// Canonical text for a stored boolean answer.
///
/// `"1"` becomes `"true"`, `"0"` becomes `"false"`, anything else is missing.
pub fn canonicalize_boolean(raw: &str) -> Option<String> {
    match raw {
        "1" => Some("true".to_string()),
        "0" => Some("false".to_string()),
        _ => None,
    }
}

/// Value as it should appear in a flattened cell for a column of `column_type`.
pub fn canonical_cell(column_type: VariableType, value: Option<&str>) -> Cell {
    let value = value?;
    match column_type {
        VariableType::Boolean => canonicalize_boolean(value),
        _ => Some(value.to_string()),
    }
}

/// Output of flattening one mode.
#[derive(Debug, Clone)]
pub struct FlattenResult {
    pub dataset: TabularDataset,
    pub diagnostics: Diagnostics,
}

/// Column layout of one mode, computed once from the registry.
///
/// The layout is derived when the flattener is built: if the registry
/// changes afterwards (for example through
/// [`MetadataRegistry::remove_variable`]), build a new flattener.
#[derive(Debug, Clone)]
pub struct Flattener {
    schema: Vec<Column>,
    variable_columns: HashMap<String, (usize, VariableType)>,
    group_columns: HashMap<String, usize>,
    nesting: NestingMode,
    schema_diagnostics: Diagnostics,
}

impl Flattener {
    pub fn new(registry: &MetadataRegistry, nesting: NestingMode) -> Self {
        let mut schema = vec![Column::identifier(ROOT_IDENTIFIER_NAME)];
        let mut group_columns = HashMap::new();
        let mut variable_columns = HashMap::new();
        let mut schema_diagnostics = Diagnostics::new();

        for group in registry.loop_groups() {
            if group.name == ROOT_IDENTIFIER_NAME {
                warn!(
                    group = %group.name,
                    "loop name collides with the respondent identifier, instance ids not recorded"
                );
                schema_diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::UnknownGroup,
                    format!(
                        "loop {} collides with the respondent identifier column",
                        group.name
                    ),
                ));
                continue;
            }
            group_columns.insert(group.name.clone(), schema.len());
            schema.push(Column::identifier(group.name.clone()));
        }
        for variable in registry.variables() {
            let taken = variable.name == ROOT_IDENTIFIER_NAME
                || group_columns.contains_key(&variable.name);
            if taken {
                warn!(
                    variable = %variable.name,
                    "variable name collides with an identifier column, skipped"
                );
                schema_diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::UnknownVariable,
                        format!(
                            "variable {} collides with an identifier column and is not flattened",
                            variable.name
                        ),
                    )
                    .with_variable(variable.name.clone()),
                );
                continue;
            }
            variable_columns.insert(
                variable.name.clone(),
                (schema.len(), variable.variable_type),
            );
            schema.push(Column::measure(
                variable.name.clone(),
                variable.variable_type,
            ));
        }
        debug!(
            groups = group_columns.len(),
            variables = variable_columns.len(),
            "flattening schema built"
        );

        Self {
            schema,
            variable_columns,
            group_columns,
            nesting,
            schema_diagnostics,
        }
    }

    pub fn schema(&self) -> &[Column] {
        &self.schema
    }

    pub fn nesting(&self) -> NestingMode {
        self.nesting
    }

    /// An empty dataset with this flattener's layout.
    pub fn empty_dataset(&self, name: &str) -> Result<TabularDataset> {
        Ok(TabularDataset::new(name, self.schema.clone())?)
    }

    /// Flatten every respondent into a fresh dataset named `name`.
    pub fn flatten(&self, name: &str, respondents: &[QuestionnaireData]) -> Result<FlattenResult> {
        let mut dataset = self.empty_dataset(name)?;
        let mut diagnostics = self.schema_diagnostics.clone();
        self.flatten_into(&mut dataset, respondents, &mut diagnostics)?;
        Ok(FlattenResult {
            dataset,
            diagnostics,
        })
    }

    /// Append the rows of `respondents` to `dataset`.
    ///
    /// `dataset` must have been created by [`Flattener::empty_dataset`].
    pub fn flatten_into(
        &self,
        dataset: &mut TabularDataset,
        respondents: &[QuestionnaireData],
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        for respondent in respondents {
            for row in self.flatten_respondent(respondent, diagnostics) {
                dataset.push_row(row)?;
            }
        }
        Ok(())
    }

    /// Rows produced by one respondent.
    pub fn flatten_respondent(
        &self,
        respondent: &QuestionnaireData,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Vec<Cell>> {
        let identifier = respondent.identifier();
        let mut row: Vec<Cell> = vec![None; self.schema.len()];
        row[0] = Some(identifier.to_string());
        self.fill_values(&mut row, respondent.answers(), identifier, diagnostics);

        let mut rows = Vec::new();
        self.emit(
            respondent.answers(),
            row,
            0,
            identifier,
            &mut rows,
            diagnostics,
        );
        rows
    }

    /// Push `row` (already holding `instance`'s values) or, when the
    /// instance has loops, one row per descendant instance.
    fn emit(
        &self,
        instance: &GroupInstance,
        row: Vec<Cell>,
        depth: usize,
        respondent: &str,
        rows: &mut Vec<Vec<Cell>>,
        diagnostics: &mut Diagnostics,
    ) {
        if !instance.has_sub_groups() {
            rows.push(row);
            return;
        }
        if self.nesting == NestingMode::SingleLevel && depth >= 1 {
            for group in instance.sub_groups() {
                debug!(
                    respondent = %respondent,
                    group = %group.name(),
                    depth,
                    "nested loop dropped in single-level mode"
                );
                diagnostics.push(
                    Diagnostic::info(
                        DiagnosticKind::UnknownGroup,
                        format!(
                            "loop {} nested under {} is not flattened in single-level mode",
                            group.name(),
                            instance.instance_id()
                        ),
                    )
                    .with_respondent(respondent),
                );
            }
            rows.push(row);
            return;
        }

        let before = rows.len();
        for group in instance.sub_groups() {
            let group_column = self.group_columns.get(group.name()).copied();
            if group_column.is_none() {
                warn!(
                    respondent = %respondent,
                    group = %group.name(),
                    "loop missing from metadata, instance ids not recorded"
                );
                diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::UnknownGroup,
                        format!("loop {} is not declared in the metadata", group.name()),
                    )
                    .with_respondent(respondent),
                );
            }
            for child in group.instances() {
                let mut child_row = row.clone();
                if let Some(index) = group_column {
                    child_row[index] = Some(child.instance_id().to_string());
                }
                self.fill_values(&mut child_row, child, respondent, diagnostics);
                self.emit(child, child_row, depth + 1, respondent, rows, diagnostics);
            }
        }
        // Loops present but all empty: keep the instance's own row.
        if rows.len() == before {
            rows.push(row);
        }
    }

    fn fill_values(
        &self,
        row: &mut [Cell],
        instance: &GroupInstance,
        respondent: &str,
        diagnostics: &mut Diagnostics,
    ) {
        for (variable, value) in instance.values() {
            match self.variable_columns.get(variable) {
                Some(&(index, column_type)) => {
                    row[index] = canonical_cell(column_type, value.as_deref());
                }
                None => {
                    warn!(
                        respondent = %respondent,
                        variable = %variable,
                        "value for unknown variable skipped"
                    );
                    diagnostics.push(
                        Diagnostic::warning(
                            DiagnosticKind::UnknownVariable,
                            format!("variable {variable} is not declared in the metadata"),
                        )
                        .with_respondent(respondent)
                        .with_variable(variable.clone()),
                    );
                }
            }
        }
    }
}

/// Flatten one mode's respondents in a single call.
pub fn flatten(
    registry: &MetadataRegistry,
    name: &str,
    respondents: &[QuestionnaireData],
    nesting: NestingMode,
) -> Result<FlattenResult> {
    Flattener::new(registry, nesting).flatten(name, respondents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_canonicalization_is_strict() {
        assert_eq!(canonicalize_boolean("1").as_deref(), Some("true"));
        assert_eq!(canonicalize_boolean("0").as_deref(), Some("false"));
        assert_eq!(canonicalize_boolean("true"), None);
        assert_eq!(canonicalize_boolean(" 1"), None);
        assert_eq!(canonicalize_boolean(""), None);
    }

    #[test]
    fn non_boolean_cells_keep_raw_text() {
        assert_eq!(
            canonical_cell(VariableType::Integer, Some("007")).as_deref(),
            Some("007")
        );
        assert_eq!(canonical_cell(VariableType::String, Some("")).as_deref(), Some(""));
        assert_eq!(canonical_cell(VariableType::String, None), None);
    }
}
