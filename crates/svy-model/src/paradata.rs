//! Paradata records: interaction events and the intervals derived from them.

use serde::{Deserialize, Serialize};

pub const INIT_SESSION: &str = "init-session";
pub const INIT_ORCHESTRATOR: &str = "init-orchestrator-collect";
pub const AGREE_SENDING: &str = "agree-sending-modal-button-orchestrator-collect";
pub const LOGOUT: &str = "logout-close-button-orchestrator-collect";

/// Role an event plays in session/orchestrator reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    InitSession,
    InitOrchestrator,
    AgreeSending,
    Logout,
    /// Field edits, navigation and everything else.
    Other,
}

impl EventKind {
    pub fn from_object_id(object_id: &str) -> Self {
        match object_id {
            INIT_SESSION => EventKind::InitSession,
            INIT_ORCHESTRATOR => EventKind::InitOrchestrator,
            AGREE_SENDING => EventKind::AgreeSending,
            LOGOUT => EventKind::Logout,
            _ => EventKind::Other,
        }
    }

    pub fn is_boundary(&self) -> bool {
        !matches!(self, EventKind::Other)
    }
}

/// One timestamped interaction recorded by the questionnaire engine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Event {
    pub survey_unit_id: String,
    pub session_id: String,
    pub paradata_object_id: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub value: Option<String>,
}

impl Event {
    pub fn new(
        survey_unit_id: impl Into<String>,
        session_id: impl Into<String>,
        paradata_object_id: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            survey_unit_id: survey_unit_id.into(),
            session_id: session_id.into(),
            paradata_object_id: paradata_object_id.into(),
            timestamp,
            value: None,
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn kind(&self) -> EventKind {
        EventKind::from_object_id(&self.paradata_object_id)
    }
}

/// A continuous interval of respondent activity. `end == 0` while open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub start: i64,
    pub end: i64,
}

impl Session {
    pub fn new(id: impl Into<String>, start: i64) -> Self {
        Self {
            id: id.into(),
            start,
            end: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.start != 0 && self.end == 0
    }

    /// `end - start`, saturating at the `i64` bounds.
    pub fn duration(&self) -> i64 {
        self.end.saturating_sub(self.start)
    }
}

/// Active interval of one questionnaire-engine collection flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Orchestrator {
    pub owner_id: String,
    pub start: i64,
    pub end: i64,
}

impl Orchestrator {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            start: 0,
            end: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.start != 0 && self.end == 0
    }

    /// `end - start`, saturating at the `i64` bounds.
    pub fn duration(&self) -> i64 {
        self.end.saturating_sub(self.start)
    }
}
