//! Survey input readers.
//!
//! Everything here turns files into the `svy-model` types: metadata
//! descriptors into a [`svy_model::MetadataRegistry`], CSV answer files into
//! [`svy_model::QuestionnaireData`], paradata documents into
//! [`svy_model::Event`] streams.

pub mod answers;
pub mod error;
pub mod metadata;
pub mod paradata;

pub use answers::{AnswerReadOptions, AnswerReadResult, read_answers, read_answers_from_reader};
pub use error::{IngestError, Result};
pub use metadata::{
    GroupEntry, MetadataDescriptor, VariableEntry, build_registry, load_metadata,
};
pub use paradata::{
    ParadataReadResult, ParadataStream, list_paradata_files, merge_streams, parse_paradata,
    read_paradata_dir, read_paradata_file, respondent_id_from_filename,
};
