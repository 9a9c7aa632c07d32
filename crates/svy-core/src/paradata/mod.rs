//! Paradata processing.
//!
//! - **reconstruct**: session/orchestrator state machine
//! - **facts**: derived variables injected into the answer tree
//! - **observations**: per-field value history

pub mod facts;
pub mod observations;
pub mod reconstruct;

use std::collections::BTreeMap;

use tracing::debug;

use svy_model::{Event, QuestionnaireData};

pub use facts::{
    PARADATA_VARIABLES, ParadataFacts, format_duration, format_timestamp,
    register_paradata_variables, remove_paradata_variables,
};
pub use observations::{VariableObservation, collect_observations};
pub use reconstruct::{
    Reconstruction, UNSET_SESSION, prepare_events, reconstruct, reconstruct_sorted,
};

/// Everything derived from one respondent's paradata document.
#[derive(Debug, Clone)]
pub struct ParadataOutcome {
    pub respondent: String,
    pub event_count: usize,
    pub reconstruction: Reconstruction,
    pub facts: ParadataFacts,
    pub observations: BTreeMap<String, Vec<VariableObservation>>,
}

impl ParadataOutcome {
    /// Inject the derived variables into the matching respondent.
    pub fn apply_to(&self, data: &mut QuestionnaireData) {
        self.facts.inject(data.answers_mut());
    }
}

/// Sort, reconstruct and summarise one respondent's events.
pub fn process_events(respondent: &str, events: Vec<Event>) -> ParadataOutcome {
    let events = prepare_events(events);
    let reconstruction = reconstruct_sorted(respondent, &events);
    let facts = ParadataFacts::from_reconstruction(&reconstruction);
    let observations = collect_observations(&events);
    debug!(
        respondent = %respondent,
        events = events.len(),
        sessions = facts.session_count,
        orchestrators = facts.orchestrator_count,
        "paradata reconstructed"
    );
    ParadataOutcome {
        respondent: respondent.to_string(),
        event_count: events.len(),
        reconstruction,
        facts,
        observations,
    }
}
