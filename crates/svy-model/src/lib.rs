//! Survey data model.
//!
//! - **metadata**: variables, loops and the per-mode [`MetadataRegistry`]
//! - **answers**: the per-respondent answer tree
//! - **dataset**: the flat [`TabularDataset`] handed to transformation engines
//! - **diagnostics**: non-fatal problems accumulated during a run
//! - **paradata**: interaction events, sessions and orchestrators
//! - **options**: processing configuration

pub mod answers;
pub mod dataset;
pub mod diagnostics;
pub mod error;
pub mod metadata;
pub mod options;
pub mod paradata;

pub use answers::{GroupData, GroupInstance, PathSegment, QuestionnaireData, instance_id};
pub use dataset::{Cell, Column, ColumnRole, ROOT_IDENTIFIER_NAME, TabularDataset};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use error::{ModelError, Result};
pub use metadata::{
    DEFAULT_NAME_SEPARATOR, Group, MetadataRegistry, ROOT_GROUP_NAME, Variable, VariableType,
};
pub use options::{NestingMode, ProcessingOptions};
pub use paradata::{Event, EventKind, Orchestrator, Session};
