//! Variable and group metadata for one response mode.
//!
//! The [`MetadataRegistry`] is built once per mode (usually from a metadata
//! descriptor) before any answers are read, and is only read afterwards. It
//! holds no interior mutability, so a shared reference can be handed to
//! several worker threads at once.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Name of the implicit group every registry is rooted at.
pub const ROOT_GROUP_NAME: &str = "ROOT";

/// Default separator used when building fully qualified names.
pub const DEFAULT_NAME_SEPARATOR: &str = ".";

/// Primitive type of a survey variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VariableType {
    String,
    Integer,
    Number,
    Boolean,
    Date,
}

impl VariableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableType::String => "STRING",
            VariableType::Integer => "INTEGER",
            VariableType::Number => "NUMBER",
            VariableType::Boolean => "BOOLEAN",
            VariableType::Date => "DATE",
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VariableType {
    type Err = String;

    /// Parse a type name as found in questionnaire descriptors.
    /// Case-insensitive; accepts a few common synonyms.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STRING" | "TEXT" | "CHAR" => Ok(VariableType::String),
            "INTEGER" | "INT" => Ok(VariableType::Integer),
            "NUMBER" | "NUMERIC" | "DECIMAL" | "FLOAT" => Ok(VariableType::Number),
            "BOOLEAN" | "BOOL" => Ok(VariableType::Boolean),
            "DATE" | "DATETIME" => Ok(VariableType::Date),
            _ => Err(format!("Unknown variable type: {}", s)),
        }
    }
}

/// A questionnaire loop, possibly nested inside another one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    /// Parent group. `None` attaches the group directly under root.
    pub parent_group_name: Option<String>,
}

impl Group {
    pub fn new(name: impl Into<String>, parent_group_name: Option<String>) -> Self {
        Self {
            name: name.into(),
            parent_group_name,
        }
    }

    pub fn root() -> Self {
        Self::new(ROOT_GROUP_NAME, None)
    }

    pub fn is_root(&self) -> bool {
        self.name == ROOT_GROUP_NAME
    }

    /// Effective parent name; root for top-level groups, `None` for root itself.
    pub fn parent_name(&self) -> Option<&str> {
        if self.is_root() {
            None
        } else {
            Some(
                self.parent_group_name
                    .as_deref()
                    .unwrap_or(ROOT_GROUP_NAME),
            )
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub group_name: String,
    pub variable_type: VariableType,
    pub declared_length: Option<String>,
}

impl Variable {
    pub fn new(
        name: impl Into<String>,
        group_name: impl Into<String>,
        variable_type: VariableType,
    ) -> Self {
        Self {
            name: name.into(),
            group_name: group_name.into(),
            variable_type,
            declared_length: None,
        }
    }

    /// A variable living directly in the root group.
    pub fn root(name: impl Into<String>, variable_type: VariableType) -> Self {
        Self::new(name, ROOT_GROUP_NAME, variable_type)
    }

    #[must_use]
    pub fn with_length(mut self, length: impl Into<String>) -> Self {
        self.declared_length = Some(length.into());
        self
    }

    pub fn is_root(&self) -> bool {
        self.group_name == ROOT_GROUP_NAME
    }
}

/// Variables and groups of one response mode, keyed by name.
///
/// Both maps keep insertion order, which is the order columns appear in
/// flattened datasets.
#[derive(Debug, Clone)]
pub struct MetadataRegistry {
    groups: IndexMap<String, Group>,
    variables: IndexMap<String, Variable>,
    separator: String,
}

impl Default for MetadataRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataRegistry {
    /// Create a registry holding only the root group.
    pub fn new() -> Self {
        let mut groups = IndexMap::new();
        groups.insert(ROOT_GROUP_NAME.to_string(), Group::root());
        Self {
            groups,
            variables: IndexMap::new(),
            separator: DEFAULT_NAME_SEPARATOR.to_string(),
        }
    }

    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Insert or replace a group.
    pub fn put_group(&mut self, group: Group) -> Result<()> {
        if group.is_root() {
            if let Some(parent) = group.parent_group_name {
                return Err(ModelError::RootWithParent { parent });
            }
            return Ok(());
        }
        self.groups.insert(group.name.clone(), group);
        Ok(())
    }

    /// Insert or replace a variable.
    pub fn put_variable(&mut self, variable: Variable) {
        self.variables.insert(variable.name.clone(), variable);
    }

    /// Remove a variable, keeping the order of the remaining ones.
    ///
    /// Anything that cached a variable list (schemas, column maps) must be
    /// rebuilt afterwards.
    pub fn remove_variable(&mut self, name: &str) -> Option<Variable> {
        self.variables.shift_remove(name)
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn contains_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn contains_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// All groups, root first, then in insertion order.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Non-root groups in insertion order.
    pub fn loop_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values().filter(|group| !group.is_root())
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn variables_in_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Variable> {
        self.variables
            .values()
            .filter(move |variable| variable.group_name == group)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Ancestor chain of a group, outermost first, root excluded.
    ///
    /// The group itself is the last element. Root yields an empty path.
    pub fn group_path(&self, group_name: &str) -> Result<Vec<&str>> {
        let mut path = Vec::new();
        let mut current = self
            .groups
            .get(group_name)
            .ok_or_else(|| ModelError::UnknownGroup {
                name: group_name.to_string(),
            })?;
        while !current.is_root() {
            if path.len() >= self.groups.len() {
                return Err(ModelError::GroupCycle {
                    name: group_name.to_string(),
                });
            }
            path.push(current.name.as_str());
            let parent = current.parent_name().unwrap_or(ROOT_GROUP_NAME);
            current = self
                .groups
                .get(parent)
                .ok_or_else(|| ModelError::UnknownGroup {
                    name: parent.to_string(),
                })?;
        }
        path.reverse();
        Ok(path)
    }

    /// Variable name prefixed by its ancestor groups (root excluded).
    ///
    /// Fails with [`ModelError::UnknownVariable`] when the variable, or any
    /// group on its ancestor chain, is not registered.
    pub fn fully_qualified_name(&self, variable_name: &str) -> Result<String> {
        let unknown = || ModelError::UnknownVariable {
            name: variable_name.to_string(),
        };
        let variable = self.variables.get(variable_name).ok_or_else(unknown)?;
        let path = match self.group_path(&variable.group_name) {
            Ok(path) => path,
            Err(ModelError::UnknownGroup { .. }) => return Err(unknown()),
            Err(other) => return Err(other),
        };
        let mut name = String::new();
        for group in path {
            name.push_str(group);
            name.push_str(&self.separator);
        }
        name.push_str(&variable.name);
        Ok(name)
    }

    /// Check that every variable's group exists and every group reaches root.
    pub fn validate(&self) -> Result<()> {
        for group in self.groups.values() {
            self.group_path(&group.name)?;
        }
        for variable in self.variables.values() {
            if !self.groups.contains_key(&variable.group_name) {
                return Err(ModelError::UnknownGroup {
                    name: variable.group_name.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_type_names_leniently() {
        assert_eq!("boolean".parse::<VariableType>(), Ok(VariableType::Boolean));
        assert_eq!(" Numeric ".parse::<VariableType>(), Ok(VariableType::Number));
        assert!("blob".parse::<VariableType>().is_err());
    }

    #[test]
    fn root_cannot_get_a_parent() {
        let mut registry = MetadataRegistry::new();
        let result = registry.put_group(Group::new(ROOT_GROUP_NAME, Some("X".to_string())));
        assert!(matches!(result, Err(ModelError::RootWithParent { .. })));
    }

    #[test]
    fn detects_cycles() {
        let mut registry = MetadataRegistry::new();
        registry
            .put_group(Group::new("A", Some("B".to_string())))
            .unwrap();
        registry
            .put_group(Group::new("B", Some("A".to_string())))
            .unwrap();
        assert!(matches!(
            registry.group_path("A"),
            Err(ModelError::GroupCycle { .. })
        ));
        assert!(registry.validate().is_err());
    }
}
