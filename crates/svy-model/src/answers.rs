//! Per-respondent answer tree.
//!
//! A [`QuestionnaireData`] owns a root [`GroupInstance`]. Each instance holds
//! scalar values and any number of nested [`GroupData`] (one per loop), each
//! of which owns its numbered instances. Nodes own their children; there are
//! no parent links.
//!
//! Node creation is always explicit: [`GroupInstance::put_value`] and
//! [`GroupData::get_or_create_instance`] create missing nodes, every read
//! accessor leaves the tree untouched.

use indexmap::IndexMap;

use crate::metadata::ROOT_GROUP_NAME;

/// One step of a path through the answer tree: loop name and 0-based index.
pub type PathSegment<'a> = (&'a str, usize);

/// Positional instance id: `"<group>-<index + 1>"`, zero-padded to two digits.
///
/// ```
/// assert_eq!(svy_model::instance_id("BOUCLE", 0), "BOUCLE-01");
/// assert_eq!(svy_model::instance_id("BOUCLE", 99), "BOUCLE-100");
/// ```
pub fn instance_id(group_name: &str, index: usize) -> String {
    format!("{group_name}-{:02}", index + 1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInstance {
    group_name: String,
    instance_id: String,
    values: IndexMap<String, Option<String>>,
    sub_groups: IndexMap<String, GroupData>,
}

impl GroupInstance {
    pub fn new(group_name: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            instance_id: instance_id.into(),
            values: IndexMap::new(),
            sub_groups: IndexMap::new(),
        }
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Values of this instance. `None` marks an explicitly absent answer,
    /// which is not the same thing as an empty string.
    pub fn values(&self) -> &IndexMap<String, Option<String>> {
        &self.values
    }

    pub fn sub_groups(&self) -> impl Iterator<Item = &GroupData> {
        self.sub_groups.values()
    }

    pub fn has_sub_groups(&self) -> bool {
        !self.sub_groups.is_empty()
    }

    pub fn sub_group_names(&self) -> impl Iterator<Item = &str> {
        self.sub_groups.keys().map(String::as_str)
    }

    pub fn sub_group(&self, name: &str) -> Option<&GroupData> {
        self.sub_groups.get(name)
    }

    pub fn get_or_create_sub_group(&mut self, name: &str) -> &mut GroupData {
        self.sub_groups
            .entry(name.to_string())
            .or_insert_with(|| GroupData::new(name))
    }

    /// Set a value on this instance directly.
    pub fn set_value(&mut self, variable: impl Into<String>, value: Option<String>) {
        self.values.insert(variable.into(), value);
    }

    /// Remove a value; returns what was stored, if anything.
    pub fn remove_value(&mut self, variable: &str) -> Option<Option<String>> {
        self.values.shift_remove(variable)
    }

    /// Follow `path`, creating loops and instances as needed.
    pub fn node_mut(&mut self, path: &[PathSegment<'_>]) -> &mut GroupInstance {
        let mut node = self;
        for (group, index) in path {
            node = node.get_or_create_sub_group(group).get_or_create_instance(*index);
        }
        node
    }

    /// Follow `path` without creating anything.
    pub fn node(&self, path: &[PathSegment<'_>]) -> Option<&GroupInstance> {
        let mut node = self;
        for (group, index) in path {
            node = node.sub_groups.get(*group)?.instance(*index)?;
        }
        Some(node)
    }

    /// Store `value` for `variable` at the instance addressed by `path`.
    pub fn put_value(
        &mut self,
        variable: impl Into<String>,
        value: impl Into<String>,
        path: &[PathSegment<'_>],
    ) {
        self.node_mut(path).set_value(variable, Some(value.into()));
    }

    /// Record that `variable` is known but has no answer at `path`.
    pub fn put_missing(&mut self, variable: impl Into<String>, path: &[PathSegment<'_>]) {
        self.node_mut(path).set_value(variable, None);
    }

    /// Value of `variable` at `path`; `None` if any step or the value is absent.
    pub fn get_value(&self, variable: &str, path: &[PathSegment<'_>]) -> Option<&str> {
        self.node(path)?.values.get(variable)?.as_deref()
    }

    /// Number of instances in this subtree, this one included.
    pub fn instance_count(&self) -> usize {
        1 + self
            .sub_groups
            .values()
            .flat_map(GroupData::instances)
            .map(GroupInstance::instance_count)
            .sum::<usize>()
    }
}

/// All instances of one loop, in first-insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupData {
    name: String,
    instances: IndexMap<String, GroupInstance>,
}

impl GroupData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instances: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn instances(&self) -> impl Iterator<Item = &GroupInstance> {
        self.instances.values()
    }

    /// Instance at a positional index, if it was created.
    pub fn instance(&self, index: usize) -> Option<&GroupInstance> {
        self.instances.get(&instance_id(&self.name, index))
    }

    pub fn instance_by_id(&self, id: &str) -> Option<&GroupInstance> {
        self.instances.get(id)
    }

    /// Instance at a positional index, created empty when missing.
    pub fn get_or_create_instance(&mut self, index: usize) -> &mut GroupInstance {
        let id = instance_id(&self.name, index);
        let group_name = &self.name;
        self.instances
            .entry(id.clone())
            .or_insert_with(|| GroupInstance::new(group_name.clone(), id))
    }

    /// Insert an instance with a caller-chosen id, replacing any previous one.
    pub fn put_instance(&mut self, instance: GroupInstance) {
        self.instances
            .insert(instance.instance_id.clone(), instance);
    }
}

/// Answers of one respondent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionnaireData {
    identifier: String,
    answers: GroupInstance,
}

impl QuestionnaireData {
    pub fn new(identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        let answers = GroupInstance::new(ROOT_GROUP_NAME, identifier.clone());
        Self {
            identifier,
            answers,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn answers(&self) -> &GroupInstance {
        &self.answers
    }

    pub fn answers_mut(&mut self) -> &mut GroupInstance {
        &mut self.answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_do_not_create_instances() {
        let mut data = QuestionnaireData::new("UE1");
        data.answers_mut()
            .put_value("PRENOM", "Ada", &[("INDIVIDU", 0)]);

        assert_eq!(data.answers().get_value("PRENOM", &[("INDIVIDU", 3)]), None);
        let group = data.answers().sub_group("INDIVIDU").unwrap();
        assert_eq!(group.len(), 1);
        assert!(group.instance(3).is_none());
    }

    #[test]
    fn get_or_create_pads_ids() {
        let mut group = GroupData::new("B");
        let created = group.get_or_create_instance(4);
        assert_eq!(created.instance_id(), "B-05");
        assert_eq!(created.group_name(), "B");
        assert_eq!(group.len(), 1);
    }
}
