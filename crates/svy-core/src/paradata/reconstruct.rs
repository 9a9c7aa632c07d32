//! Session and orchestrator reconstruction from a paradata event stream.
//!
//! The scan keeps one current session and one current orchestrator. An
//! interval is pushed to the output as soon as it is closed; at most one of
//! each kind is open at any time.
//!
//! | event                              | session                          | orchestrator                                   |
//! |------------------------------------|----------------------------------|------------------------------------------------|
//! | `init-session`                     | start, or close at previous + reopen | close at previous if started before it     |
//! | `init-orchestrator-collect`        | -                                | close at previous if started before it, start  |
//! | `agree-sending-modal-button-...`   | -                                | backfill start, close at event, reopen at event |
//! | `logout-close-button-...`          | -                                | backfill start, close at event                 |
//!
//! Whatever is still open after the last event is closed at its timestamp.

use std::mem;

use tracing::trace;

use svy_model::{Event, EventKind, Orchestrator, Session};

/// Session id held until the first event binds the real one.
pub const UNSET_SESSION: &str = "__unset__";

/// Closed intervals derived from one respondent's events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconstruction {
    pub sessions: Vec<Session>,
    pub orchestrators: Vec<Orchestrator>,
}

impl Reconstruction {
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty() && self.orchestrators.is_empty()
    }
}

/// Drop exact duplicates, then order by timestamp with object id as tie-break.
pub fn prepare_events(mut events: Vec<Event>) -> Vec<Event> {
    events.sort();
    events.dedup();
    events.sort_by(|left, right| {
        left.timestamp
            .cmp(&right.timestamp)
            .then_with(|| left.paradata_object_id.cmp(&right.paradata_object_id))
    });
    events
}

/// Rebuild the sessions and orchestrators of `respondent_id`.
///
/// `events` may be in any order and may contain duplicates. Fewer than two
/// distinct events produce nothing.
pub fn reconstruct(respondent_id: &str, events: Vec<Event>) -> Reconstruction {
    let events = prepare_events(events);
    reconstruct_sorted(respondent_id, &events)
}

/// Same as [`reconstruct`] for events already passed through
/// [`prepare_events`].
pub fn reconstruct_sorted(respondent_id: &str, events: &[Event]) -> Reconstruction {
    let mut output = Reconstruction::default();
    let Some(last) = events.last() else {
        return output;
    };
    if events.len() < 2 {
        return output;
    }

    let mut session = Session::new(UNSET_SESSION, 0);
    let mut orchestrator = Orchestrator::new(respondent_id);
    let mut previous: Option<&Event> = None;

    for event in events {
        if session.id == UNSET_SESSION && event.session_id != UNSET_SESSION {
            session.id = event.session_id.clone();
        }
        let previous_timestamp = previous.map_or(event.timestamp, |p| p.timestamp);

        match event.kind() {
            EventKind::InitSession => {
                if session.start == 0 {
                    session.start = event.timestamp;
                } else {
                    session.end = previous_timestamp;
                    let fresh = Session::new(event.session_id.clone(), event.timestamp);
                    output.sessions.push(mem::replace(&mut session, fresh));
                }
                close_before(
                    &mut orchestrator,
                    previous_timestamp,
                    respondent_id,
                    &mut output,
                );
            }
            EventKind::InitOrchestrator => {
                close_before(
                    &mut orchestrator,
                    previous_timestamp,
                    respondent_id,
                    &mut output,
                );
                orchestrator.start = event.timestamp;
            }
            EventKind::AgreeSending => {
                if orchestrator.start == 0 {
                    orchestrator.start = session.start;
                }
                if orchestrator.start != 0 && orchestrator.start < event.timestamp {
                    orchestrator.end = event.timestamp;
                    let mut fresh = Orchestrator::new(respondent_id);
                    fresh.start = event.timestamp;
                    output
                        .orchestrators
                        .push(mem::replace(&mut orchestrator, fresh));
                }
            }
            EventKind::Logout => {
                if orchestrator.start == 0 {
                    orchestrator.start = session.start;
                }
                if orchestrator.start != 0 && orchestrator.start < event.timestamp {
                    orchestrator.end = event.timestamp;
                    output.orchestrators.push(mem::replace(
                        &mut orchestrator,
                        Orchestrator::new(respondent_id),
                    ));
                }
            }
            EventKind::Other => {}
        }
        trace!(
            respondent = %respondent_id,
            object = %event.paradata_object_id,
            timestamp = event.timestamp,
            "paradata event scanned"
        );
        previous = Some(event);
    }

    if session.is_open() {
        session.end = last.timestamp;
        output.sessions.push(session);
    }
    if orchestrator.is_open() && orchestrator.start < last.timestamp {
        orchestrator.end = last.timestamp;
        output.orchestrators.push(orchestrator);
    }
    output
}

/// Close an open orchestrator at `previous_timestamp` if it started earlier,
/// leaving a fresh, unstarted one in its place.
fn close_before(
    orchestrator: &mut Orchestrator,
    previous_timestamp: i64,
    respondent_id: &str,
    output: &mut Reconstruction,
) {
    if orchestrator.is_open() && orchestrator.start < previous_timestamp {
        orchestrator.end = previous_timestamp;
        output
            .orchestrators
            .push(mem::replace(orchestrator, Orchestrator::new(respondent_id)));
    }
}
