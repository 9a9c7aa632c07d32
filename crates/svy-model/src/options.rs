//! Configuration options for survey processing.

use serde::{Deserialize, Serialize};

use crate::metadata::DEFAULT_NAME_SEPARATOR;

/// How deep the flattener descends into nested loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestingMode {
    /// Follow loops to any depth, one row per leaf instance.
    #[default]
    Recursive,
    /// Only the loops directly under root produce rows; deeper loops are
    /// dropped and reported.
    SingleLevel,
}

/// Options controlling how responses are consolidated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    pub nesting: NestingMode,

    /// Separator between group names in fully qualified variable names.
    pub name_separator: String,

    /// Respondents flattened per batch. Bounds peak memory on large modes.
    pub partition_size: usize,

    /// Reconstruct sessions and orchestrators from paradata when available.
    pub paradata: bool,

    /// Keep the derived paradata variables in the flattened output.
    ///
    /// When false they are still computed and reported, then removed from
    /// the registry before flattening.
    pub keep_paradata_variables: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            nesting: NestingMode::default(),
            name_separator: DEFAULT_NAME_SEPARATOR.to_string(),
            partition_size: 10_000,
            paradata: true,
            keep_paradata_variables: true,
        }
    }
}

impl ProcessingOptions {
    /// Options reproducing the historical one-level flattening.
    pub fn legacy() -> Self {
        Self {
            nesting: NestingMode::SingleLevel,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_nesting(mut self, nesting: NestingMode) -> Self {
        self.nesting = nesting;
        self
    }

    #[must_use]
    pub fn with_partition_size(mut self, partition_size: usize) -> Self {
        self.partition_size = partition_size.max(1);
        self
    }
}
