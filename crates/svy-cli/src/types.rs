use std::path::PathBuf;

use svy_model::{Diagnostics, TabularDataset};
use svy_output::DatasetOutput;

/// Outcome of a whole campaign run.
#[derive(Debug)]
pub struct RunResult {
    pub campaign: String,
    pub output_dir: PathBuf,
    pub modes: Vec<ModeSummary>,
    /// Modes that could not be processed, with the reason.
    pub failed_modes: Vec<(String, String)>,
    pub multimode: Option<DatasetSummary>,
    pub outputs: Vec<DatasetOutput>,
    /// Every diagnostic of the run, tagged with its mode.
    pub diagnostics: Diagnostics,
    pub errors: Vec<String>,
    pub has_errors: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSummary {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
}

impl DatasetSummary {
    pub fn of(dataset: &TabularDataset) -> Self {
        Self {
            name: dataset.name.clone(),
            rows: dataset.row_count(),
            columns: dataset.width(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParadataSummary {
    /// Respondents whose paradata was reconstructed.
    pub respondents: usize,
    pub events: usize,
    pub sessions: usize,
    pub orchestrators: usize,
    /// Documents whose respondent has no answers in this mode.
    pub unmatched: usize,
}

#[derive(Debug, Clone)]
pub struct ModeSummary {
    pub mode: String,
    pub respondents: usize,
    pub dataset: DatasetSummary,
    /// `None` when paradata was disabled or not configured.
    pub paradata: Option<ParadataSummary>,
    pub errors: usize,
    pub warnings: usize,
}

/// One mode after processing, before writing.
#[derive(Debug)]
pub struct ModeOutcome {
    pub summary: ModeSummary,
    pub dataset: TabularDataset,
    pub diagnostics: Diagnostics,
}
