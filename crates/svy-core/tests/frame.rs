//! Tests for typed frames, the transformation seam and mode reconciliation.

use polars::prelude::DataType;

use svy_core::{
    CoreError, MODE_COLUMN, PassthroughEngine, RENAMED_MODE_COLUMN, TransformOutput, TransformationEngine,
    dataset_to_frame, ensure_identifiers_preserved, run_transformation, stack_modes,
};
use svy_model::{Column, DiagnosticKind, ROOT_IDENTIFIER_NAME, TabularDataset, VariableType};

fn text(value: &str) -> Option<String> {
    Some(value.to_string())
}

fn web_dataset() -> TabularDataset {
    let mut dataset = TabularDataset::new(
        "WEB",
        vec![
            Column::identifier(ROOT_IDENTIFIER_NAME),
            Column::identifier("INDIVIDU"),
            Column::measure("AGE", VariableType::Integer),
            Column::measure("TAILLE", VariableType::Number),
            Column::measure("CONSENT", VariableType::Boolean),
            Column::measure("NOM", VariableType::String),
        ],
    )
    .unwrap();
    dataset
        .push_row(vec![
            text("UE1"),
            text("INDIVIDU-01"),
            text("42"),
            text("1,75"),
            text("true"),
            text(""),
        ])
        .unwrap();
    dataset
        .push_row(vec![text("UE2"), None, text("n/a"), None, text("false"), None])
        .unwrap();
    dataset
}

#[test]
fn frame_columns_are_typed() {
    let conversion = dataset_to_frame(&web_dataset()).unwrap();
    let frame = &conversion.frame;
    assert_eq!(frame.height(), 2);
    assert_eq!(frame.column("AGE").unwrap().dtype(), &DataType::Int64);
    assert_eq!(frame.column("TAILLE").unwrap().dtype(), &DataType::Float64);
    assert_eq!(frame.column("CONSENT").unwrap().dtype(), &DataType::Boolean);
    assert_eq!(frame.column("NOM").unwrap().dtype(), &DataType::String);

    assert_eq!(conversion.diagnostics.len(), 1);
    let diagnostic = conversion.diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.kind, DiagnosticKind::InvalidValue);
    assert_eq!(diagnostic.respondent.as_deref(), Some("UE2"));
    assert_eq!(diagnostic.variable.as_deref(), Some("AGE"));
}

#[test]
fn passthrough_keeps_layout_and_values() {
    let output = run_transformation(&PassthroughEngine, web_dataset()).unwrap();
    let dataset = output.dataset;
    let source = web_dataset();

    assert_eq!(dataset.schema(), source.schema());
    assert_eq!(
        dataset.column_values("TAILLE").unwrap(),
        vec![Some("1.75"), None]
    );
    assert_eq!(dataset.column_values("AGE").unwrap(), vec![Some("42"), None]);
    assert_eq!(
        dataset.column_values("CONSENT").unwrap(),
        vec![Some("true"), Some("false")]
    );
    assert_eq!(dataset.column_values("NOM").unwrap(), vec![Some(""), None]);
}

struct DropIdentifiers;

impl TransformationEngine for DropIdentifiers {
    fn name(&self) -> &str {
        "drop-identifiers"
    }

    fn transform(&self, dataset: TabularDataset) -> svy_core::Result<TransformOutput> {
        let schema = vec![Column::measure("AGE", VariableType::Integer)];
        let mut out = TabularDataset::new(dataset.name.clone(), schema)?;
        for _ in dataset.rows() {
            out.push_row(vec![None])?;
        }
        Ok(TransformOutput {
            dataset: out,
            diagnostics: Default::default(),
        })
    }
}

#[test]
fn engines_must_keep_identifiers() {
    let err = run_transformation(&DropIdentifiers, web_dataset()).unwrap_err();
    assert!(matches!(
        err,
        CoreError::IdentifiersNotPreserved { column } if column == ROOT_IDENTIFIER_NAME
    ));

    let same = web_dataset();
    assert!(ensure_identifiers_preserved(&same, &web_dataset()).is_ok());
}

#[test]
fn modes_stack_under_a_union_schema() {
    let mut paper = TabularDataset::new(
        "PAPER",
        vec![
            Column::identifier(ROOT_IDENTIFIER_NAME),
            Column::measure("AGE", VariableType::String),
            Column::measure("COMMENT", VariableType::String),
        ],
    )
    .unwrap();
    paper
        .push_row(vec![text("UE9"), text("31"), text("papier")])
        .unwrap();

    let stacked = stack_modes(
        "MULTIMODE",
        &[
            ("WEB".to_string(), web_dataset()),
            ("PAPER".to_string(), paper),
        ],
    )
    .unwrap()
    .dataset;

    let names: Vec<&str> = stacked.schema().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "IdUE",
            "INDIVIDU",
            "AGE",
            "TAILLE",
            "CONSENT",
            "NOM",
            "COMMENT",
            MODE_COLUMN
        ]
    );
    assert_eq!(
        stacked.column("AGE").unwrap().column_type,
        VariableType::String
    );
    assert_eq!(stacked.row_count(), 3);
    assert_eq!(
        stacked.column_values(MODE_COLUMN).unwrap(),
        vec![Some("WEB"), Some("WEB"), Some("PAPER")]
    );
    assert_eq!(
        stacked.column_values("COMMENT").unwrap(),
        vec![None, None, Some("papier")]
    );
    assert_eq!(
        stacked.column_values("AGE").unwrap(),
        vec![Some("42"), Some("n/a"), Some("31")]
    );
}

#[test]
fn a_mode_variable_survives_stacking_under_another_name() {
    let mut web = TabularDataset::new(
        "WEB",
        vec![
            Column::identifier(ROOT_IDENTIFIER_NAME),
            Column::measure(MODE_COLUMN, VariableType::String),
        ],
    )
    .unwrap();
    web.push_row(vec![text("UE1"), text("answer-value")]).unwrap();

    let result = stack_modes("MULTIMODE", &[("WEB".to_string(), web)]).unwrap();

    let names: Vec<&str> = result
        .dataset
        .schema()
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["IdUE", RENAMED_MODE_COLUMN, MODE_COLUMN]);
    assert_eq!(
        result.dataset.rows(),
        &[vec![text("UE1"), text("answer-value"), text("WEB")]]
    );
    assert_eq!(result.diagnostics.len(), 1);
    let diagnostic = result.diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.kind, DiagnosticKind::UnknownVariable);
    assert_eq!(diagnostic.mode.as_deref(), Some("WEB"));
}
