//! Per-mode processing stages and the campaign driver.
//!
//! A mode goes through: metadata, answers, paradata, flattening,
//! transformation. A failure in any stage aborts that mode only; the other
//! modes are still processed and written.

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, error, info, info_span, trace, warn};

use svy_core::paradata::{
    PARADATA_VARIABLES, ParadataOutcome, process_events, register_paradata_variables,
    remove_paradata_variables,
};
use svy_core::{
    FlattenResult, Flattener, PassthroughEngine, TransformOutput, run_transformation, stack_modes,
};
use svy_ingest::{AnswerReadOptions, AnswerReadResult, load_metadata, read_answers, read_paradata_dir};
use svy_model::{
    Diagnostic, DiagnosticKind, Diagnostics, MetadataRegistry, ProcessingOptions,
    QuestionnaireData, Severity, TabularDataset,
};
use svy_output::{CsvWriterOptions, parse_delimiter, write_dataset_outputs};

use crate::config::{CampaignConfig, MULTIMODE_DATASET, ModeConfig, OutputSettings};
use crate::logging::redact_value;
use crate::types::{DatasetSummary, ModeOutcome, ModeSummary, ParadataSummary, RunResult};

// =========================================================================
// Stage 1: Metadata
// =========================================================================

pub fn load_registry(mode: &ModeConfig, options: &ProcessingOptions) -> Result<MetadataRegistry> {
    load_metadata(&mode.metadata, &options.name_separator)
        .with_context(|| format!("load metadata for mode {}", mode.name))
}

// =========================================================================
// Stage 2: Answers
// =========================================================================

pub fn ingest_answers(mode: &ModeConfig, registry: &MetadataRegistry) -> Result<AnswerReadResult> {
    let delimiter = parse_delimiter(&mode.input_delimiter)
        .with_context(|| format!("input delimiter of mode {}", mode.name))?;
    let options = AnswerReadOptions {
        identifier_column: mode.identifier_column.clone(),
        delimiter,
    };
    read_answers(&mode.answers, registry, &options)
        .with_context(|| format!("read answers for mode {}", mode.name))
}

// =========================================================================
// Stage 3: Paradata
// =========================================================================

/// Reconstruct paradata and inject the derived variables.
///
/// Returns `None` when paradata is disabled or no directory is configured.
/// Documents are processed in parallel; each yields its own outcome and the
/// answer trees are only touched once every outcome is back.
pub fn attach_paradata(
    mode: &ModeConfig,
    options: &ProcessingOptions,
    registry: &mut MetadataRegistry,
    respondents: &mut [QuestionnaireData],
    diagnostics: &mut Diagnostics,
) -> Option<ParadataSummary> {
    if !options.paradata {
        return None;
    }
    let Some(dir) = mode.paradata.as_deref() else {
        diagnostics.push(Diagnostic::info(
            DiagnosticKind::NullInput,
            "paradata enabled but no paradata directory configured, skipped",
        ));
        return None;
    };
    let read = match read_paradata_dir(dir) {
        Ok(read) => read,
        Err(err) => {
            warn!(mode = %mode.name, error = %err, "paradata directory unusable, skipped");
            diagnostics.push(Diagnostic::warning(
                DiagnosticKind::NullInput,
                format!("paradata skipped: {err}"),
            ));
            return None;
        }
    };
    diagnostics.extend(read.diagnostics);

    let outcomes: Vec<ParadataOutcome> = read
        .streams
        .into_par_iter()
        .map(|stream| process_events(&stream.respondent, stream.events))
        .collect();

    register_paradata_variables(registry);
    let index: HashMap<String, usize> = respondents
        .iter()
        .enumerate()
        .map(|(position, data)| (data.identifier().to_string(), position))
        .collect();

    let mut summary = ParadataSummary::default();
    for outcome in &outcomes {
        let Some(&position) = index.get(&outcome.respondent) else {
            debug!(
                mode = %mode.name,
                respondent = %outcome.respondent,
                "paradata for a respondent without answers"
            );
            summary.unmatched += 1;
            continue;
        };
        outcome.apply_to(&mut respondents[position]);
        summary.respondents += 1;
        summary.events += outcome.event_count;
        summary.sessions += outcome.facts.session_count;
        summary.orchestrators += outcome.facts.orchestrator_count;
        for (variable, history) in &outcome.observations {
            if let Some(last) = history.last() {
                trace!(
                    respondent = %outcome.respondent,
                    variable = %variable,
                    changes = history.len(),
                    value = %redact_value(&last.value),
                    "observed value"
                );
            }
        }
    }

    if !options.keep_paradata_variables {
        let removed = remove_paradata_variables(registry);
        for data in respondents.iter_mut() {
            for (name, _) in PARADATA_VARIABLES {
                data.answers_mut().remove_value(name);
            }
        }
        debug!(mode = %mode.name, removed, "paradata variables dropped from output");
    }
    Some(summary)
}

// =========================================================================
// Stage 4: Flatten
// =========================================================================

/// Flatten respondents in batches of `options.partition_size`.
pub fn flatten_partitioned(
    registry: &MetadataRegistry,
    name: &str,
    respondents: &[QuestionnaireData],
    options: &ProcessingOptions,
) -> Result<FlattenResult> {
    let flattener = Flattener::new(registry, options.nesting);
    let mut partitions = respondents.chunks(options.partition_size.max(1));
    let first = partitions.next().unwrap_or_default();
    let mut result = flattener.flatten(name, first)?;
    for (batch, partition) in partitions.enumerate() {
        flattener.flatten_into(&mut result.dataset, partition, &mut result.diagnostics)?;
        debug!(
            dataset = %name,
            batch = batch + 2,
            respondents = partition.len(),
            rows = result.dataset.row_count(),
            "partition flattened"
        );
    }
    Ok(result)
}

// =========================================================================
// Stage 5: Transform
// =========================================================================

pub fn transform(dataset: TabularDataset) -> Result<TransformOutput> {
    let name = dataset.name.clone();
    run_transformation(&PassthroughEngine, dataset)
        .with_context(|| format!("transform dataset {name}"))
}

/// Run every stage for one mode.
pub fn run_mode(mode: &ModeConfig, options: &ProcessingOptions) -> Result<ModeOutcome> {
    let mut registry = load_registry(mode, options)?;
    let AnswerReadResult {
        mut respondents,
        diagnostics: mut mode_diagnostics,
    } = ingest_answers(mode, &registry)?;
    info!(
        mode = %mode.name,
        respondents = respondents.len(),
        variables = registry.len(),
        "answers loaded"
    );

    let paradata = attach_paradata(
        mode,
        options,
        &mut registry,
        &mut respondents,
        &mut mode_diagnostics,
    );

    let flattened = flatten_partitioned(&registry, &mode.name, &respondents, options)?;
    mode_diagnostics.extend(flattened.diagnostics);

    let transformed = transform(flattened.dataset)?;
    mode_diagnostics.extend(transformed.diagnostics);
    let dataset = transformed.dataset;

    mode_diagnostics.tag_mode(&mode.name);
    let summary = ModeSummary {
        mode: mode.name.clone(),
        respondents: respondents.len(),
        dataset: DatasetSummary::of(&dataset),
        paradata,
        errors: mode_diagnostics.count(Severity::Error),
        warnings: mode_diagnostics.count(Severity::Warning),
    };
    Ok(ModeOutcome {
        summary,
        dataset,
        diagnostics: mode_diagnostics,
    })
}

fn writer_options(settings: &OutputSettings) -> Result<CsvWriterOptions> {
    let delimiter = parse_delimiter(&settings.delimiter).context("output delimiter")?;
    Ok(CsvWriterOptions {
        delimiter,
        numeric_booleans: settings.numeric_booleans,
    })
}

/// Process every mode, stack them and write the datasets.
///
/// Mode failures are collected in the result; only an invalid output
/// configuration is returned as an error.
pub fn run_campaign(config: &CampaignConfig, output_dir: &Path, dry_run: bool) -> Result<RunResult> {
    let campaign_span = info_span!("campaign", campaign = %config.campaign);
    let _campaign_guard = campaign_span.enter();
    let writer_options = writer_options(&config.output)?;

    let mut modes = Vec::new();
    let mut failed_modes = Vec::new();
    let mut datasets: Vec<(String, TabularDataset)> = Vec::new();
    let mut diagnostics = Diagnostics::new();
    let mut errors = Vec::new();

    for mode in &config.modes {
        let mode_span = info_span!("mode", mode = %mode.name);
        let start = Instant::now();
        match mode_span.in_scope(|| run_mode(mode, &config.options)) {
            Ok(outcome) => {
                info!(
                    mode = %mode.name,
                    rows = outcome.summary.dataset.rows,
                    columns = outcome.summary.dataset.columns,
                    diagnostics = outcome.diagnostics.len(),
                    duration_ms = start.elapsed().as_millis(),
                    "mode processed"
                );
                modes.push(outcome.summary);
                diagnostics.extend(outcome.diagnostics);
                datasets.push((mode.name.clone(), outcome.dataset));
            }
            Err(err) => {
                error!(mode = %mode.name, error = %format!("{err:#}"), "mode failed");
                failed_modes.push((mode.name.clone(), format!("{err:#}")));
            }
        }
    }

    let stacked = if config.multimode && !datasets.is_empty() {
        match stack_modes(MULTIMODE_DATASET, &datasets) {
            Ok(stacked) => {
                diagnostics.extend(stacked.diagnostics);
                Some(stacked.dataset)
            }
            Err(err) => {
                errors.push(format!("stack modes: {err}"));
                None
            }
        }
    } else {
        None
    };
    let multimode = stacked.as_ref().map(DatasetSummary::of);
    let all: Vec<TabularDataset> = datasets
        .into_iter()
        .map(|(_, dataset)| dataset)
        .chain(stacked)
        .collect();

    let mut outputs = Vec::new();
    if dry_run {
        info!(datasets = all.len(), "dry run, nothing written");
    } else if !all.is_empty() {
        let write_start = Instant::now();
        match write_dataset_outputs(output_dir, &all, &writer_options) {
            Ok(written) => {
                info!(
                    output_dir = %output_dir.display(),
                    files = written.len() * 2,
                    duration_ms = write_start.elapsed().as_millis(),
                    "outputs written"
                );
                outputs = written;
            }
            Err(err) => errors.push(format!("write outputs: {err}")),
        }
    }

    let has_errors = !failed_modes.is_empty() || !errors.is_empty();
    Ok(RunResult {
        campaign: config.campaign.clone(),
        output_dir: output_dir.to_path_buf(),
        modes,
        failed_modes,
        multimode,
        outputs,
        diagnostics,
        errors,
        has_errors,
    })
}
