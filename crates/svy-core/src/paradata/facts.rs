//! Variables derived from reconstructed sessions and orchestrators.

use chrono::{DateTime, SecondsFormat, TimeDelta};

use svy_model::{GroupInstance, MetadataRegistry, Variable, VariableType};

use super::reconstruct::Reconstruction;

pub const ORCHESTRATOR_DURATION: &str = "PARADATA_ORCHESTRATOR_DURATION";
pub const ORCHESTRATOR_DURATION_LABEL: &str = "PARADATA_ORCHESTRATOR_DURATION_LABEL";
pub const SESSION_DURATION: &str = "PARADATA_SESSION_DURATION";
pub const SESSION_DURATION_LABEL: &str = "PARADATA_SESSION_DURATION_LABEL";
pub const FIRST_SESSION_START: &str = "PARADATA_FIRST_SESSION_START";
pub const FIRST_SESSION_START_DATE: &str = "PARADATA_FIRST_SESSION_START_DATE";
pub const LAST_SESSION_END: &str = "PARADATA_LAST_SESSION_END";
pub const LAST_SESSION_END_DATE: &str = "PARADATA_LAST_SESSION_END_DATE";
pub const SESSION_COUNT: &str = "PARADATA_SESSION_COUNT";
pub const ORCHESTRATOR_COUNT: &str = "PARADATA_ORCHESTRATOR_COUNT";

/// Derived variables and their types, in column order.
pub const PARADATA_VARIABLES: [(&str, VariableType); 10] = [
    (ORCHESTRATOR_DURATION, VariableType::Integer),
    (ORCHESTRATOR_DURATION_LABEL, VariableType::String),
    (SESSION_DURATION, VariableType::Integer),
    (SESSION_DURATION_LABEL, VariableType::String),
    (FIRST_SESSION_START, VariableType::Integer),
    (FIRST_SESSION_START_DATE, VariableType::Date),
    (LAST_SESSION_END, VariableType::Integer),
    (LAST_SESSION_END_DATE, VariableType::Date),
    (SESSION_COUNT, VariableType::Integer),
    (ORCHESTRATOR_COUNT, VariableType::Integer),
];

/// Declare the derived paradata variables in the root group.
pub fn register_paradata_variables(registry: &mut MetadataRegistry) {
    for (name, variable_type) in PARADATA_VARIABLES {
        registry.put_variable(Variable::root(name, variable_type));
    }
}

/// Remove the derived paradata variables; returns how many were present.
pub fn remove_paradata_variables(registry: &mut MetadataRegistry) -> usize {
    PARADATA_VARIABLES
        .iter()
        .filter_map(|(name, _)| registry.remove_variable(name))
        .count()
}

/// Render milliseconds as `"D jours, HH:MM:SS"`. Negative input renders as zero.
pub fn format_duration(millis: i64) -> String {
    let delta = TimeDelta::try_milliseconds(millis.max(0)).unwrap_or(TimeDelta::MAX);
    format!(
        "{} jours, {:02}:{:02}:{:02}",
        delta.num_days(),
        delta.num_hours() % 24,
        delta.num_minutes() % 60,
        delta.num_seconds() % 60
    )
}

/// Epoch milliseconds as an RFC 3339 UTC timestamp.
pub fn format_timestamp(millis: i64) -> Option<String> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Summary figures of one respondent's paradata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParadataFacts {
    pub orchestrator_duration: i64,
    pub session_duration: i64,
    pub first_session_start: Option<i64>,
    pub last_session_end: Option<i64>,
    pub session_count: usize,
    pub orchestrator_count: usize,
}

impl ParadataFacts {
    pub fn from_reconstruction(reconstruction: &Reconstruction) -> Self {
        Self {
            orchestrator_duration: reconstruction
                .orchestrators
                .iter()
                .map(svy_model::Orchestrator::duration)
                .fold(0, i64::saturating_add),
            session_duration: reconstruction
                .sessions
                .iter()
                .map(svy_model::Session::duration)
                .fold(0, i64::saturating_add),
            first_session_start: reconstruction.sessions.iter().map(|s| s.start).min(),
            last_session_end: reconstruction.sessions.iter().map(|s| s.end).max(),
            session_count: reconstruction.sessions.len(),
            orchestrator_count: reconstruction.orchestrators.len(),
        }
    }

    /// `(variable, value)` pairs in [`PARADATA_VARIABLES`] order.
    pub fn values(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            (
                ORCHESTRATOR_DURATION,
                Some(self.orchestrator_duration.to_string()),
            ),
            (
                ORCHESTRATOR_DURATION_LABEL,
                Some(format_duration(self.orchestrator_duration)),
            ),
            (SESSION_DURATION, Some(self.session_duration.to_string())),
            (
                SESSION_DURATION_LABEL,
                Some(format_duration(self.session_duration)),
            ),
            (
                FIRST_SESSION_START,
                self.first_session_start.map(|ts| ts.to_string()),
            ),
            (
                FIRST_SESSION_START_DATE,
                self.first_session_start.and_then(format_timestamp),
            ),
            (
                LAST_SESSION_END,
                self.last_session_end.map(|ts| ts.to_string()),
            ),
            (
                LAST_SESSION_END_DATE,
                self.last_session_end.and_then(format_timestamp),
            ),
            (SESSION_COUNT, Some(self.session_count.to_string())),
            (ORCHESTRATOR_COUNT, Some(self.orchestrator_count.to_string())),
        ]
    }

    /// Write the derived variables onto a respondent's root instance.
    pub fn inject(&self, answers: &mut GroupInstance) {
        for (name, value) in self.values() {
            answers.set_value(name, value);
        }
    }
}
