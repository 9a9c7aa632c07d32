//! Survey consolidation core.
//!
//! - **flatten**: answer tree to [`svy_model::TabularDataset`]
//! - **paradata**: session/orchestrator reconstruction and derived variables
//! - **frame**: typed Polars frames for transformation engines
//! - **transform**: the transformation engine seam
//! - **reconcile**: stacking per-mode datasets

pub mod error;
pub mod flatten;
pub mod frame;
pub mod paradata;
pub mod reconcile;
pub mod transform;

pub use error::{CoreError, Result};
pub use flatten::{FlattenResult, Flattener, canonical_cell, canonicalize_boolean, flatten};
pub use frame::{FrameConversion, dataset_to_frame, frame_to_dataset};
pub use paradata::{ParadataFacts, ParadataOutcome, Reconstruction, process_events, reconstruct};
pub use reconcile::{MODE_COLUMN, RENAMED_MODE_COLUMN, StackResult, stack_modes};
pub use transform::{
    PassthroughEngine, TransformOutput, TransformationEngine, ensure_identifiers_preserved,
    run_transformation,
};
