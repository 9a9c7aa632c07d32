//! CSV answer files.
//!
//! One row per respondent. Root variables use their plain name as header;
//! variables inside a loop are suffixed with the 1-based instance number of
//! their innermost loop (`PRENOM_2` is `PRENOM` in the second `INDIVIDU`).
//! Ancestor loops of a nested group are placed at their first instance.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use indexmap::IndexMap;
use tracing::{debug, warn};

use svy_model::{
    Diagnostic, DiagnosticKind, Diagnostics, MetadataRegistry, QuestionnaireData,
    ROOT_IDENTIFIER_NAME,
};

use crate::error::{IngestError, Result};

#[derive(Debug, Clone)]
pub struct AnswerReadOptions {
    pub identifier_column: String,
    pub delimiter: u8,
}

impl Default for AnswerReadOptions {
    fn default() -> Self {
        Self {
            identifier_column: ROOT_IDENTIFIER_NAME.to_string(),
            delimiter: b',',
        }
    }
}

/// Respondents read from one answer file.
#[derive(Debug, Clone, Default)]
pub struct AnswerReadResult {
    /// In first-seen order of their identifiers.
    pub respondents: Vec<QuestionnaireData>,
    pub diagnostics: Diagnostics,
}

/// Where a header column lands in the answer tree.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ColumnTarget {
    Identifier,
    Value {
        variable: String,
        path: Vec<(String, usize)>,
    },
    Unknown,
}

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

fn resolve_column(header: &str, identifier: &str, registry: &MetadataRegistry) -> ColumnTarget {
    if header == identifier {
        return ColumnTarget::Identifier;
    }
    if let Some(target) = value_target(header, 0, registry) {
        return target;
    }
    let Some((base, suffix)) = header.rsplit_once('_') else {
        return ColumnTarget::Unknown;
    };
    match suffix.parse::<usize>() {
        Ok(number) if number >= 1 => value_target(base, number - 1, registry)
            .filter(|target| {
                matches!(target, ColumnTarget::Value { path, .. } if !path.is_empty())
            })
            .unwrap_or(ColumnTarget::Unknown),
        _ => ColumnTarget::Unknown,
    }
}

fn value_target(name: &str, index: usize, registry: &MetadataRegistry) -> Option<ColumnTarget> {
    let variable = registry.variable(name)?;
    let groups = registry.group_path(&variable.group_name).ok()?;
    let last = groups.len().saturating_sub(1);
    let path = groups
        .iter()
        .enumerate()
        .map(|(position, group)| {
            let instance = if position == last { index } else { 0 };
            ((*group).to_string(), instance)
        })
        .collect();
    Some(ColumnTarget::Value {
        variable: variable.name.clone(),
        path,
    })
}

/// Read an answer file.
pub fn read_answers(
    path: &Path,
    registry: &MetadataRegistry,
    options: &AnswerReadOptions,
) -> Result<AnswerReadResult> {
    let file = File::open(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let result = read_answers_from_reader(file, registry, options, path)?;
    debug!(
        path = %path.display(),
        respondents = result.respondents.len(),
        diagnostics = result.diagnostics.len(),
        "answers read"
    );
    Ok(result)
}

/// Read answers from any reader. `origin` is only used in errors.
pub fn read_answers_from_reader<R: Read>(
    reader: R,
    registry: &MetadataRegistry,
    options: &AnswerReadOptions,
    origin: &Path,
) -> Result<AnswerReadResult> {
    let csv_error = |source| IngestError::CsvParse {
        path: origin.to_path_buf(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(options.delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(normalize_header)
        .collect();
    let targets: Vec<ColumnTarget> = headers
        .iter()
        .map(|header| resolve_column(header, &options.identifier_column, registry))
        .collect();
    let Some(identifier_index) = targets
        .iter()
        .position(|target| *target == ColumnTarget::Identifier)
    else {
        return Err(IngestError::MissingColumn {
            column: options.identifier_column.clone(),
            path: origin.to_path_buf(),
        });
    };

    let mut diagnostics = Diagnostics::new();
    for (header, target) in headers.iter().zip(&targets) {
        if *target == ColumnTarget::Unknown {
            warn!(column = %header, "answer column matches no declared variable");
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::UnknownVariable,
                    format!("column {header} matches no declared variable"),
                )
                .with_variable(header.clone()),
            );
        }
    }

    let mut respondents: IndexMap<String, QuestionnaireData> = IndexMap::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        let identifier = record
            .get(identifier_index)
            .map(str::trim)
            .unwrap_or_default();
        if identifier.is_empty() {
            diagnostics.push(Diagnostic::warning(
                DiagnosticKind::NullInput,
                format!("row {} has no respondent identifier, skipped", line + 2),
            ));
            continue;
        }
        let data = respondents
            .entry(identifier.to_string())
            .or_insert_with(|| QuestionnaireData::new(identifier));
        for (cell, target) in record.iter().zip(&targets) {
            let ColumnTarget::Value { variable, path } = target else {
                continue;
            };
            if cell.is_empty() {
                continue;
            }
            let segments: Vec<(&str, usize)> = path
                .iter()
                .map(|(group, index)| (group.as_str(), *index))
                .collect();
            data.answers_mut().put_value(variable.clone(), cell, &segments);
        }
    }

    Ok(AnswerReadResult {
        respondents: respondents.into_values().collect(),
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use svy_model::{Group, Variable, VariableType};

    fn registry() -> MetadataRegistry {
        let mut registry = MetadataRegistry::new();
        registry.put_group(Group::new("INDIVIDU", None)).unwrap();
        registry
            .put_group(Group::new("ENFANT", Some("INDIVIDU".to_string())))
            .unwrap();
        registry.put_variable(Variable::root("COMMUNE_1", VariableType::String));
        registry.put_variable(Variable::new("PRENOM", "INDIVIDU", VariableType::String));
        registry.put_variable(Variable::new("AGE", "ENFANT", VariableType::Integer));
        registry
    }

    fn target(header: &str) -> ColumnTarget {
        resolve_column(header, ROOT_IDENTIFIER_NAME, &registry())
    }

    #[test]
    fn exact_root_names_win_over_suffixes() {
        assert_eq!(
            target("COMMUNE_1"),
            ColumnTarget::Value {
                variable: "COMMUNE_1".to_string(),
                path: Vec::new()
            }
        );
    }

    #[test]
    fn suffix_selects_the_innermost_instance() {
        assert_eq!(
            target("PRENOM_3"),
            ColumnTarget::Value {
                variable: "PRENOM".to_string(),
                path: vec![("INDIVIDU".to_string(), 2)]
            }
        );
        assert_eq!(
            target("AGE_2"),
            ColumnTarget::Value {
                variable: "AGE".to_string(),
                path: vec![("INDIVIDU".to_string(), 0), ("ENFANT".to_string(), 1)]
            }
        );
    }

    #[test]
    fn bad_suffixes_are_unknown() {
        assert_eq!(target("PRENOM_0"), ColumnTarget::Unknown);
        assert_eq!(target("PRENOM_x"), ColumnTarget::Unknown);
        assert_eq!(target("COMMUNE_2"), ColumnTarget::Unknown);
        assert_eq!(target(ROOT_IDENTIFIER_NAME), ColumnTarget::Identifier);
    }
}
