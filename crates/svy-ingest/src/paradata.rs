//! Paradata documents, one JSON file per respondent.
//!
//! ```json
//! { "idSU": "UE1", "events": [
//!     { "idSession": "S1", "idParadataObject": "init-session", "timestamp": 1700000000000 },
//!     { "idSession": "S1", "idParadataObject": "PRENOM", "timestamp": 1700000004000, "value": "Ada" }
//! ] }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use svy_model::{Diagnostic, DiagnosticKind, Diagnostics, Event};

use crate::error::{IngestError, Result};

#[derive(Debug, Clone, Deserialize)]
struct ParadataDocument {
    #[serde(rename = "idSU", default)]
    survey_unit_id: Option<String>,
    events: Vec<EventRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct EventRecord {
    #[serde(rename = "idSession", default)]
    session_id: Option<String>,
    #[serde(rename = "idParadataObject")]
    object_id: String,
    timestamp: i64,
    #[serde(default)]
    value: Option<Value>,
}

/// Events of one respondent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParadataStream {
    pub respondent: String,
    pub events: Vec<Event>,
}

/// Respondent id encoded in a paradata file name.
///
/// The id is the second-to-last dot-separated token, so
/// `paradata.ABC123.json` gives `ABC123`.
///
/// ```
/// use svy_ingest::respondent_id_from_filename;
///
/// assert_eq!(respondent_id_from_filename("paradata.ABC123.json").as_deref(), Some("ABC123"));
/// assert_eq!(respondent_id_from_filename("paradata"), None);
/// ```
pub fn respondent_id_from_filename(file_name: &str) -> Option<String> {
    let tokens: Vec<&str> = file_name.split('.').collect();
    if tokens.len() < 2 {
        return None;
    }
    Some(tokens[tokens.len() - 2].to_string())
}

fn render_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

/// Parse one paradata document.
///
/// The respondent id comes from `idSU`, falling back to the file name.
pub fn parse_paradata(text: &str, origin: &Path) -> Result<ParadataStream> {
    let malformed = |reason: String| IngestError::MalformedParadata {
        path: origin.to_path_buf(),
        reason,
    };
    let document: ParadataDocument =
        serde_json::from_str(text).map_err(|err| malformed(err.to_string()))?;
    let respondent = document
        .survey_unit_id
        .filter(|id| !id.is_empty())
        .or_else(|| {
            origin
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(respondent_id_from_filename)
        })
        .ok_or_else(|| malformed("no respondent identifier".to_string()))?;

    let events = document
        .events
        .into_iter()
        .map(|record| Event {
            survey_unit_id: respondent.clone(),
            session_id: record.session_id.unwrap_or_default(),
            paradata_object_id: record.object_id,
            timestamp: record.timestamp,
            value: record.value.and_then(render_value),
        })
        .collect();
    Ok(ParadataStream { respondent, events })
}

pub fn read_paradata_file(path: &Path) -> Result<ParadataStream> {
    let text = fs::read_to_string(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_paradata(&text, path)
}

/// Lists all JSON files in a directory, sorted by file name.
pub fn list_paradata_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    let entries = fs::read_dir(dir).map_err(|source| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Streams read from a paradata directory.
#[derive(Debug, Clone, Default)]
pub struct ParadataReadResult {
    pub streams: Vec<ParadataStream>,
    pub diagnostics: Diagnostics,
}

/// Fold streams of the same respondent into one, in first-seen order.
pub fn merge_streams(streams: Vec<ParadataStream>) -> Vec<ParadataStream> {
    let mut merged: IndexMap<String, Vec<Event>> = IndexMap::new();
    for stream in streams {
        if merged.contains_key(&stream.respondent) {
            debug!(
                respondent = %stream.respondent,
                events = stream.events.len(),
                "second paradata document merged into the respondent's stream"
            );
        }
        merged
            .entry(stream.respondent)
            .or_default()
            .extend(stream.events);
    }
    merged
        .into_iter()
        .map(|(respondent, events)| ParadataStream { respondent, events })
        .collect()
}

/// Read every paradata document in `dir`.
///
/// A file that cannot be read or parsed only skips that respondent and is
/// reported as [`DiagnosticKind::MalformedParadataStream`]. Only a missing
/// or unreadable directory is an error. Several documents for the same
/// respondent yield a single stream holding all their events.
pub fn read_paradata_dir(dir: &Path) -> Result<ParadataReadResult> {
    let mut result = ParadataReadResult::default();
    let mut streams = Vec::new();
    for path in list_paradata_files(dir)? {
        match read_paradata_file(&path) {
            Ok(stream) => streams.push(stream),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "paradata document skipped");
                let mut diagnostic =
                    Diagnostic::error(DiagnosticKind::MalformedParadataStream, err.to_string());
                if let Some(respondent) = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .and_then(respondent_id_from_filename)
                {
                    diagnostic = diagnostic.with_respondent(respondent);
                }
                result.diagnostics.push(diagnostic);
            }
        }
    }
    result.streams = merge_streams(streams);
    debug!(
        dir = %dir.display(),
        streams = result.streams.len(),
        skipped = result.diagnostics.len(),
        "paradata read"
    );
    Ok(result)
}
