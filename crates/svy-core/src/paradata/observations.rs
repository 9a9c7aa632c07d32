use std::collections::BTreeMap;

use svy_model::Event;

/// One recorded value of a questionnaire field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableObservation {
    pub timestamp: i64,
    pub session_id: String,
    pub value: String,
}

/// Value history per paradata object, keyed by object id.
///
/// Only non-boundary events carrying a value are kept. Expects events in
/// scan order (see [`super::prepare_events`]).
pub fn collect_observations(events: &[Event]) -> BTreeMap<String, Vec<VariableObservation>> {
    let mut observations: BTreeMap<String, Vec<VariableObservation>> = BTreeMap::new();
    for event in events {
        if event.kind().is_boundary() {
            continue;
        }
        let Some(value) = &event.value else {
            continue;
        };
        observations
            .entry(event.paradata_object_id.clone())
            .or_default()
            .push(VariableObservation {
                timestamp: event.timestamp,
                session_id: event.session_id.clone(),
                value: value.clone(),
            });
    }
    observations
}
