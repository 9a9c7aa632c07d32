//! Seam to the transformation engine.
//!
//! The engine that runs user scripts on the flattened data lives outside this
//! workspace. Whatever it does, it receives a [`TabularDataset`] and must hand
//! one back with the same identifier columns.

use tracing::debug;

use svy_model::{Diagnostics, TabularDataset};

use crate::error::{CoreError, Result};
use crate::frame::{dataset_to_frame, frame_to_dataset};

/// Result of a transformation step.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub dataset: TabularDataset,
    pub diagnostics: Diagnostics,
}

pub trait TransformationEngine: Send + Sync {
    fn name(&self) -> &str;

    fn transform(&self, dataset: TabularDataset) -> Result<TransformOutput>;
}

/// Engine that applies no rules.
///
/// The data still goes through the typed frame, so values that do not match
/// their declared type are nulled and reported, exactly as a real engine
/// would see them.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughEngine;

impl TransformationEngine for PassthroughEngine {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn transform(&self, dataset: TabularDataset) -> Result<TransformOutput> {
        let conversion = dataset_to_frame(&dataset)?;
        debug!(
            dataset = %dataset.name,
            rows = conversion.frame.height(),
            columns = conversion.frame.width(),
            "typed frame built"
        );
        let transformed = frame_to_dataset(&dataset.name, &conversion.frame, dataset.schema())?;
        Ok(TransformOutput {
            dataset: transformed,
            diagnostics: conversion.diagnostics,
        })
    }
}

/// Fail if an identifier column of `before` is missing or demoted in `after`.
pub fn ensure_identifiers_preserved(before: &TabularDataset, after: &TabularDataset) -> Result<()> {
    for column in before.identifier_columns() {
        let kept = after
            .column(&column.name)
            .is_some_and(svy_model::Column::is_identifier);
        if !kept {
            return Err(CoreError::IdentifiersNotPreserved {
                column: column.name.clone(),
            });
        }
    }
    Ok(())
}

/// Run `engine` and check its output keeps the identifiers.
pub fn run_transformation(
    engine: &dyn TransformationEngine,
    dataset: TabularDataset,
) -> Result<TransformOutput> {
    let before = TabularDataset::new(dataset.name.clone(), dataset.schema().to_vec())?;
    let output = engine.transform(dataset)?;
    ensure_identifiers_preserved(&before, &output.dataset)?;
    Ok(output)
}
