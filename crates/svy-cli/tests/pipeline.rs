use std::fs;
use std::path::Path;

use tempfile::TempDir;

use svy_cli::config::CampaignConfig;
use svy_cli::pipeline::{flatten_partitioned, run_campaign};
use svy_model::{
    DiagnosticKind, Group, MetadataRegistry, ProcessingOptions, QuestionnaireData, Variable,
    VariableType,
};

const METADATA: &str = r#"{
    "groups": [{"name": "INDIVIDU"}],
    "variables": [
        {"name": "COMMUNE", "type": "STRING"},
        {"name": "CONSENT", "type": "BOOLEAN"},
        {"name": "PRENOM", "group": "INDIVIDU", "type": "STRING"},
        {"name": "AGE", "group": "INDIVIDU", "type": "INTEGER"}
    ]
}"#;

const PARADATA_UE1: &str = r#"{"idSU": "UE1", "events": [
    {"idSession": "S1", "idParadataObject": "agree-sending-modal-button-orchestrator-collect", "timestamp": 5000},
    {"idSession": "S1", "idParadataObject": "init-session", "timestamp": 1000},
    {"idSession": "S1", "idParadataObject": "init-orchestrator-collect", "timestamp": 2000},
    {"idSession": "S1", "idParadataObject": "PRENOM", "timestamp": 3000, "value": "Ada"}
]}"#;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create dir");
    }
    fs::write(path, contents).expect("write file");
}

/// Campaign with a web mode (loops and paradata), a paper mode and a mode
/// whose metadata is missing.
fn campaign(root: &Path, options: &str) -> CampaignConfig {
    write(root, "web/metadata.json", METADATA);
    write(
        root,
        "web/answers.csv",
        "IdUE,COMMUNE,CONSENT,PRENOM_1,PRENOM_2,AGE_1,AGE_2\n\
         UE1,Lyon,1,Ada,Alan,36,41\n\
         UE2,Nantes,0,,,,\n",
    );
    write(root, "web/paradata/paradata.UE1.json", PARADATA_UE1);
    write(root, "web/paradata/paradata.UE9.json", "{ truncated");
    write(root, "paper/metadata.json", METADATA);
    write(root, "paper/answers.csv", "IdUE;COMMUNE\nUE3;Brest\n");
    write(
        root,
        "campaign.json",
        &format!(
            r#"{{
                "campaign": "TEST",
                "options": {options},
                "modes": [
                    {{"name": "WEB", "metadata": "web/metadata.json",
                      "answers": "web/answers.csv", "paradata": "web/paradata"}},
                    {{"name": "PAPER", "metadata": "paper/metadata.json",
                      "answers": "paper/answers.csv", "input_delimiter": ";"}},
                    {{"name": "BROKEN", "metadata": "missing/metadata.json",
                      "answers": "missing/answers.csv"}}
                ]
            }}"#
        ),
    );
    CampaignConfig::load(&root.join("campaign.json")).expect("load config")
}

/// Header and rows of a `;`-delimited output without quoted fields.
fn read_output(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let text = fs::read_to_string(path).expect("read output");
    let mut lines = text.lines();
    let header = lines
        .next()
        .expect("header")
        .split(';')
        .map(str::to_string)
        .collect();
    let rows = lines
        .map(|line| line.split(';').map(str::to_string).collect())
        .collect();
    (header, rows)
}

fn column(header: &[String], name: &str) -> usize {
    header
        .iter()
        .position(|column| column == name)
        .unwrap_or_else(|| panic!("missing column {name}"))
}

#[test]
fn campaign_writes_every_mode_and_reports_failures() {
    let dir = TempDir::new().expect("temp dir");
    let config = campaign(dir.path(), "{}");
    let output_dir = dir.path().join("out");

    let result = run_campaign(&config, &output_dir, false).expect("run");

    assert!(result.has_errors);
    assert_eq!(result.failed_modes.len(), 1);
    assert_eq!(result.failed_modes[0].0, "BROKEN");
    assert_eq!(result.modes.len(), 2);
    assert_eq!(result.outputs.len(), 3);

    let web = &result.modes[0];
    assert_eq!(web.respondents, 2);
    assert_eq!(web.dataset.rows, 3);
    let paradata = web.paradata.as_ref().expect("web paradata");
    assert_eq!(paradata.respondents, 1);
    assert_eq!(paradata.sessions, 1);
    assert_eq!(paradata.orchestrators, 1);
    assert!(result.modes[1].paradata.is_none());

    let multimode = result.multimode.as_ref().expect("multimode");
    assert_eq!(multimode.rows, 4);

    let (header, rows) = read_output(&output_dir.join("WEB.csv"));
    assert_eq!(&header[..3], &["IdUE", "INDIVIDU", "COMMUNE"]);
    let id = column(&header, "IdUE");
    let consent = column(&header, "CONSENT");
    let prenom = column(&header, "PRENOM");
    let duration = column(&header, "PARADATA_ORCHESTRATOR_DURATION");
    let session = column(&header, "PARADATA_SESSION_DURATION");
    let ids: Vec<&str> = rows.iter().map(|row| row[id].as_str()).collect();
    assert_eq!(ids, vec!["UE1", "UE1", "UE2"]);
    assert_eq!(rows[0][consent], "1");
    assert_eq!(rows[2][consent], "0");
    assert_eq!(rows[1][prenom], "Alan");
    assert_eq!(rows[0][duration], "3000");
    assert_eq!(rows[1][session], "4000");
    assert_eq!(rows[2][duration], "");
    assert!(output_dir.join("WEB_schema.json").is_file());

    let (header, rows) = read_output(&output_dir.join("MULTIMODE.csv"));
    let mode = column(&header, "MODE");
    let modes: Vec<&str> = rows.iter().map(|row| row[mode].as_str()).collect();
    assert_eq!(modes, vec!["WEB", "WEB", "WEB", "PAPER"]);

    let diagnostics = &result.diagnostics;
    assert_eq!(
        diagnostics.count_kind(DiagnosticKind::MalformedParadataStream),
        1
    );
    assert_eq!(diagnostics.count_kind(DiagnosticKind::NullInput), 1);
    assert_eq!(diagnostics.count_kind(DiagnosticKind::UnknownVariable), 0);
    assert!(diagnostics.iter().all(|diagnostic| diagnostic.mode.is_some()));
}

#[test]
fn paradata_variables_can_be_left_out() {
    let dir = TempDir::new().expect("temp dir");
    let config = campaign(dir.path(), r#"{"keep_paradata_variables": false}"#);
    let output_dir = dir.path().join("out");

    let result = run_campaign(&config, &output_dir, false).expect("run");

    assert_eq!(result.modes[0].paradata.as_ref().map(|p| p.sessions), Some(1));
    let (header, _) = read_output(&output_dir.join("WEB.csv"));
    assert!(header.iter().all(|column| !column.starts_with("PARADATA_")));
    assert_eq!(
        result.diagnostics.count_kind(DiagnosticKind::UnknownVariable),
        0
    );
}

#[test]
fn dry_run_writes_nothing() {
    let dir = TempDir::new().expect("temp dir");
    let config = campaign(dir.path(), r#"{"paradata": false}"#);
    let output_dir = dir.path().join("out");

    let result = run_campaign(&config, &output_dir, true).expect("run");

    assert!(result.outputs.is_empty());
    assert!(!output_dir.exists());
    assert!(result.modes.iter().all(|mode| mode.paradata.is_none()));
    assert_eq!(result.diagnostics.count_kind(DiagnosticKind::NullInput), 0);
}

#[test]
fn partitions_do_not_change_the_rows() {
    let mut registry = MetadataRegistry::new();
    registry.put_group(Group::new("INDIVIDU", None)).expect("group");
    registry.put_variable(Variable::new("PRENOM", "INDIVIDU", VariableType::String));
    let respondents: Vec<QuestionnaireData> = (0..7)
        .map(|index| {
            let mut data = QuestionnaireData::new(format!("UE{index}"));
            for instance in 0..index % 3 {
                data.answers_mut().put_value(
                    "PRENOM",
                    format!("P{index}-{instance}"),
                    &[("INDIVIDU", instance)],
                );
            }
            data
        })
        .collect();

    let whole = flatten_partitioned(
        &registry,
        "WEB",
        &respondents,
        &ProcessingOptions::default(),
    )
    .expect("whole");
    let batched = flatten_partitioned(
        &registry,
        "WEB",
        &respondents,
        &ProcessingOptions::default().with_partition_size(2),
    )
    .expect("batched");

    assert_eq!(whole.dataset, batched.dataset);
    assert_eq!(whole.diagnostics.len(), batched.diagnostics.len());
}

#[test]
fn second_paradata_document_extends_the_same_respondent() {
    let dir = TempDir::new().expect("temp dir");
    let config = campaign(dir.path(), "{}");
    write(
        dir.path(),
        "web/paradata/paradata.UE1.later.json",
        r#"{"idSU": "UE1", "events": [
            {"idSession": "S2", "idParadataObject": "init-session", "timestamp": 8000},
            {"idSession": "S2", "idParadataObject": "PRENOM", "timestamp": 9000, "value": "Ada"}
        ]}"#,
    );

    let result = run_campaign(&config, &dir.path().join("out"), true).expect("run");

    let paradata = result.modes[0].paradata.as_ref().expect("web paradata");
    assert_eq!(paradata.respondents, 1);
    assert_eq!(paradata.sessions, 2);
    assert_eq!(paradata.orchestrators, 2);
    assert_eq!(paradata.events, 6);
}
