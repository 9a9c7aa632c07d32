use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use svy_ingest::{
    AnswerReadOptions, IngestError, load_metadata, read_answers, read_paradata_dir,
};
use svy_model::{DiagnosticKind, GroupData, Severity};

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write file");
    path
}

const METADATA: &str = r#"{
    "groups": [
        {"name": "INDIVIDU"},
        {"name": "ENFANT", "parent": "INDIVIDU"}
    ],
    "variables": [
        {"name": "COMMUNE", "type": "STRING"},
        {"name": "PRENOM", "group": "INDIVIDU", "type": "STRING"},
        {"name": "AGE", "group": "ENFANT", "type": "INTEGER"}
    ]
}"#;

#[test]
fn reads_answers_into_trees() {
    let dir = TempDir::new().expect("temp dir");
    let metadata = write(&dir, "metadata.json", METADATA);
    let answers = write(
        &dir,
        "answers.csv",
        "\u{feff}IdUE,COMMUNE,PRENOM_1,PRENOM_2,AGE_1,EXTRA\n\
         UE1,Lyon,Ada,Alan,4,x\n\
         UE2,,Grace,,,\n\
         ,Paris,,,,\n",
    );

    let registry = load_metadata(&metadata, ".").expect("metadata");
    let result = read_answers(&answers, &registry, &AnswerReadOptions::default()).expect("read");

    assert_eq!(result.respondents.len(), 2);
    let first = &result.respondents[0];
    assert_eq!(first.identifier(), "UE1");
    let root = first.answers();
    assert_eq!(root.get_value("COMMUNE", &[]), Some("Lyon"));
    assert_eq!(root.get_value("PRENOM", &[("INDIVIDU", 1)]), Some("Alan"));
    assert_eq!(
        root.get_value("AGE", &[("INDIVIDU", 0), ("ENFANT", 0)]),
        Some("4")
    );

    let second = result.respondents[1].answers();
    assert_eq!(second.get_value("COMMUNE", &[]), None);
    assert!(!second.values().contains_key("COMMUNE"));
    assert_eq!(
        second.sub_group("INDIVIDU").map(GroupData::len),
        Some(1)
    );

    assert_eq!(result.diagnostics.count_kind(DiagnosticKind::UnknownVariable), 1);
    assert_eq!(result.diagnostics.count_kind(DiagnosticKind::NullInput), 1);
}

#[test]
fn identifier_column_is_required() {
    let dir = TempDir::new().expect("temp dir");
    let metadata = write(&dir, "metadata.json", METADATA);
    let answers = write(&dir, "answers.csv", "COMMUNE\nLyon\n");

    let registry = load_metadata(&metadata, ".").expect("metadata");
    let err = read_answers(&answers, &registry, &AnswerReadOptions::default()).unwrap_err();
    assert!(matches!(err, IngestError::MissingColumn { column, .. } if column == "IdUE"));
}

#[test]
fn custom_delimiter_and_identifier() {
    let dir = TempDir::new().expect("temp dir");
    let metadata = write(&dir, "metadata.json", METADATA);
    let answers = write(&dir, "answers.csv", "ID;COMMUNE\nUE9;Brest\n");

    let registry = load_metadata(&metadata, ".").expect("metadata");
    let options = AnswerReadOptions {
        identifier_column: "ID".to_string(),
        delimiter: b';',
    };
    let result = read_answers(&answers, &registry, &options).expect("read");
    assert_eq!(result.respondents[0].identifier(), "UE9");
    assert_eq!(
        result.respondents[0].answers().get_value("COMMUNE", &[]),
        Some("Brest")
    );
    assert!(result.diagnostics.is_empty());
}

#[test]
fn malformed_paradata_only_skips_that_respondent() {
    let dir = TempDir::new().expect("temp dir");
    write(
        &dir,
        "paradata.UE1.json",
        r#"{"idSU": "UE1", "events": [
            {"idSession": "S1", "idParadataObject": "init-session", "timestamp": 100}
        ]}"#,
    );
    write(&dir, "paradata.UE2.json", "{ not json");
    write(&dir, "notes.txt", "ignored");

    let result = read_paradata_dir(dir.path()).expect("read dir");

    assert_eq!(result.streams.len(), 1);
    assert_eq!(result.streams[0].respondent, "UE1");
    assert_eq!(result.streams[0].events[0].survey_unit_id, "UE1");
    let diagnostic = result.diagnostics.iter().next().expect("diagnostic");
    assert_eq!(diagnostic.kind, DiagnosticKind::MalformedParadataStream);
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!(diagnostic.respondent.as_deref(), Some("UE2"));
}

#[test]
fn missing_paradata_directory_is_an_error() {
    let dir = TempDir::new().expect("temp dir");
    let err = read_paradata_dir(&dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, IngestError::DirectoryNotFound { .. }));
}

#[test]
fn documents_of_the_same_respondent_form_one_stream() {
    let dir = TempDir::new().expect("temp dir");
    write(
        &dir,
        "paradata.UE1.json",
        r#"{"idSU": "UE1", "events": [
            {"idSession": "S1", "idParadataObject": "init-session", "timestamp": 100}
        ]}"#,
    );
    write(
        &dir,
        "paradata.UE1.retry.json",
        r#"{"idSU": "UE1", "events": [
            {"idSession": "S2", "idParadataObject": "init-session", "timestamp": 900},
            {"idSession": "S2", "idParadataObject": "PRENOM", "timestamp": 950}
        ]}"#,
    );
    write(
        &dir,
        "paradata.UE2.json",
        r#"{"idSU": "UE2", "events": []}"#,
    );

    let result = read_paradata_dir(dir.path()).expect("read dir");

    let respondents: Vec<&str> = result
        .streams
        .iter()
        .map(|stream| stream.respondent.as_str())
        .collect();
    assert_eq!(respondents, vec!["UE1", "UE2"]);
    let timestamps: Vec<i64> = result.streams[0]
        .events
        .iter()
        .map(|event| event.timestamp)
        .collect();
    assert_eq!(timestamps, vec![100, 900, 950]);
    assert!(result.diagnostics.is_empty());
}
