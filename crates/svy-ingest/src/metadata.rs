//! Metadata descriptor loading.
//!
//! A descriptor is a JSON document listing the loops and variables of one
//! response mode:
//!
//! ```json
//! {
//!   "groups": [{ "name": "INDIVIDU", "parent": null }],
//!   "variables": [{ "name": "PRENOM", "group": "INDIVIDU", "type": "STRING", "length": "40" }]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use svy_model::{Group, MetadataRegistry, ROOT_GROUP_NAME, Variable, VariableType};

use crate::error::{IngestError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetadataDescriptor {
    pub groups: Vec<GroupEntry>,
    pub variables: Vec<VariableEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupEntry {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariableEntry {
    pub name: String,
    /// Missing or empty means root.
    #[serde(default)]
    pub group: Option<String>,
    #[serde(rename = "type")]
    pub variable_type: String,
    #[serde(default)]
    pub length: Option<String>,
}

/// Load a descriptor file into a registry.
pub fn load_metadata(path: &Path, separator: &str) -> Result<MetadataRegistry> {
    let text = fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let descriptor: MetadataDescriptor =
        serde_json::from_str(&text).map_err(|source| IngestError::MetadataParse {
            path: path.to_path_buf(),
            source,
        })?;
    build_registry(&descriptor, separator, path)
}

/// Build a registry from an already parsed descriptor.
///
/// Groups may be listed in any order; parents are checked once every group
/// is known. `origin` is only used in error messages.
pub fn build_registry(
    descriptor: &MetadataDescriptor,
    separator: &str,
    origin: &Path,
) -> Result<MetadataRegistry> {
    let model_error = |source| IngestError::Metadata {
        path: origin.to_path_buf(),
        source,
    };

    let mut registry = MetadataRegistry::new().with_separator(separator);
    for entry in &descriptor.groups {
        let parent = entry.parent.clone().filter(|parent| !parent.is_empty());
        registry
            .put_group(Group::new(entry.name.clone(), parent))
            .map_err(model_error)?;
    }
    for entry in &descriptor.variables {
        let variable_type: VariableType =
            entry
                .variable_type
                .parse()
                .map_err(|_| IngestError::InvalidValue {
                    field: format!("type of {}", entry.name),
                    value: entry.variable_type.clone(),
                    path: origin.to_path_buf(),
                })?;
        let group = entry
            .group
            .as_deref()
            .filter(|group| !group.is_empty())
            .unwrap_or(ROOT_GROUP_NAME);
        let mut variable = Variable::new(entry.name.clone(), group, variable_type);
        if let Some(length) = entry.length.as_deref().filter(|l| !l.is_empty()) {
            variable = variable.with_length(length);
        }
        registry.put_variable(variable);
    }
    registry.validate().map_err(model_error)?;

    debug!(
        path = %origin.display(),
        groups = descriptor.groups.len(),
        variables = registry.len(),
        "metadata loaded"
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use svy_model::ModelError;

    fn descriptor(json: &str) -> MetadataDescriptor {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn children_may_precede_parents() {
        let descriptor = descriptor(
            r#"{
                "groups": [
                    {"name": "ENFANT", "parent": "INDIVIDU"},
                    {"name": "INDIVIDU"}
                ],
                "variables": [
                    {"name": "AGE", "group": "ENFANT", "type": "integer"},
                    {"name": "COMMUNE", "type": "STRING", "length": "5"}
                ]
            }"#,
        );
        let registry = build_registry(&descriptor, ".", Path::new("meta.json")).unwrap();
        assert_eq!(
            registry.fully_qualified_name("AGE").unwrap(),
            "INDIVIDU.ENFANT.AGE"
        );
        let commune = registry.variable("COMMUNE").unwrap();
        assert!(commune.is_root());
        assert_eq!(commune.declared_length.as_deref(), Some("5"));
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let descriptor = descriptor(r#"{"groups": [{"name": "A", "parent": "NOPE"}]}"#);
        let err = build_registry(&descriptor, ".", Path::new("meta.json")).unwrap_err();
        assert!(matches!(
            err,
            IngestError::Metadata {
                source: ModelError::UnknownGroup { .. },
                ..
            }
        ));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let descriptor =
            descriptor(r#"{"variables": [{"name": "X", "type": "BLOB"}]}"#);
        let err = build_registry(&descriptor, ".", Path::new("meta.json")).unwrap_err();
        assert!(matches!(err, IngestError::InvalidValue { value, .. } if value == "BLOB"));
    }
}
