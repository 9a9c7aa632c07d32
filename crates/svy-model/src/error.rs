use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown variable: {name}")]
    UnknownVariable { name: String },
    #[error("unknown group: {name}")]
    UnknownGroup { name: String },
    #[error("group hierarchy loops back on itself at {name}")]
    GroupCycle { name: String },
    #[error("the root group cannot have a parent (got {parent})")]
    RootWithParent { parent: String },
    #[error("row length mismatch: expected {expected}, got {actual}")]
    RowLengthMismatch { expected: usize, actual: usize },
    #[error("duplicate column: {name}")]
    DuplicateColumn { name: String },
    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
