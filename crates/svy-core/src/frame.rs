//! Conversion between [`TabularDataset`] and a typed Polars [`DataFrame`].
//!
//! Transformation engines work on typed frames. Text cells are parsed
//! according to the column type; cells that fail to parse become null and
//! are reported as [`DiagnosticKind::InvalidValue`].

use polars::prelude::{AnyValue, DataFrame, DataType, IntoColumn, NamedFrom, Series};

use svy_model::{
    Cell, Column, ColumnRole, Diagnostic, DiagnosticKind, Diagnostics, TabularDataset,
    VariableType,
};

use crate::error::Result;

/// A typed frame plus the cells that could not be converted.
#[derive(Debug, Clone)]
pub struct FrameConversion {
    pub frame: DataFrame,
    pub diagnostics: Diagnostics,
}

/// Polars dtype used for a survey variable type.
pub fn polars_dtype(variable_type: VariableType) -> DataType {
    match variable_type {
        VariableType::Integer => DataType::Int64,
        VariableType::Number => DataType::Float64,
        VariableType::Boolean => DataType::Boolean,
        VariableType::String | VariableType::Date => DataType::String,
    }
}

/// Survey type inferred from a Polars dtype, for columns a transformation added.
pub fn variable_type_for(dtype: &DataType) -> VariableType {
    match dtype {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => VariableType::Integer,
        DataType::Float32 | DataType::Float64 => VariableType::Number,
        DataType::Boolean => VariableType::Boolean,
        DataType::Date | DataType::Datetime(_, _) => VariableType::Date,
        _ => VariableType::String,
    }
}

pub fn parse_integer(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Parse a decimal, accepting a comma as decimal separator.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .or_else(|| trimmed.replace(',', ".").parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

pub fn parse_boolean(raw: &str) -> Option<bool> {
    match raw.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Formats a float without superfluous trailing zeros.
pub fn format_number(value: f64) -> String {
    let text = format!("{value}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

/// Cell text for a Polars value.
pub fn any_to_cell(value: AnyValue<'_>) -> Cell {
    match value {
        AnyValue::Null => None,
        AnyValue::Boolean(b) => Some(b.to_string()),
        AnyValue::Int8(v) => Some(v.to_string()),
        AnyValue::Int16(v) => Some(v.to_string()),
        AnyValue::Int32(v) => Some(v.to_string()),
        AnyValue::Int64(v) => Some(v.to_string()),
        AnyValue::UInt8(v) => Some(v.to_string()),
        AnyValue::UInt16(v) => Some(v.to_string()),
        AnyValue::UInt32(v) => Some(v.to_string()),
        AnyValue::UInt64(v) => Some(v.to_string()),
        AnyValue::Float32(v) => Some(format_number(f64::from(v))),
        AnyValue::Float64(v) => Some(format_number(v)),
        AnyValue::String(s) => Some(s.to_string()),
        AnyValue::StringOwned(s) => Some(s.to_string()),
        other => Some(other.to_string()),
    }
}

fn typed_values<T>(
    dataset: &TabularDataset,
    index: usize,
    column: &Column,
    parse: impl Fn(&str) -> Option<T>,
    diagnostics: &mut Diagnostics,
) -> Vec<Option<T>> {
    let mut values = Vec::with_capacity(dataset.row_count());
    for row in dataset.rows() {
        let Some(raw) = row[index].as_deref() else {
            values.push(None);
            continue;
        };
        let parsed = parse(raw);
        if parsed.is_none() && !raw.trim().is_empty() {
            let mut diagnostic = Diagnostic::warning(
                DiagnosticKind::InvalidValue,
                format!(
                    "value of {} is not a valid {}",
                    column.name, column.column_type
                ),
            )
            .with_variable(column.name.clone());
            if let Some(identifier) = row.first().cloned().flatten() {
                diagnostic = diagnostic.with_respondent(identifier);
            }
            diagnostics.push(diagnostic);
        }
        values.push(parsed);
    }
    values
}

/// Build a typed frame from a dataset.
pub fn dataset_to_frame(dataset: &TabularDataset) -> Result<FrameConversion> {
    let mut diagnostics = Diagnostics::new();
    let mut columns = Vec::with_capacity(dataset.width());
    for (index, column) in dataset.schema().iter().enumerate() {
        let name = column.name.as_str().into();
        let series = match column.column_type {
            VariableType::Integer => Series::new(
                name,
                typed_values(dataset, index, column, parse_integer, &mut diagnostics),
            ),
            VariableType::Number => Series::new(
                name,
                typed_values(dataset, index, column, parse_number, &mut diagnostics),
            ),
            VariableType::Boolean => Series::new(
                name,
                typed_values(dataset, index, column, parse_boolean, &mut diagnostics),
            ),
            VariableType::String | VariableType::Date => {
                let values: Vec<Option<String>> =
                    dataset.rows().iter().map(|row| row[index].clone()).collect();
                Series::new(name, values)
            }
        };
        columns.push(series.into_column());
    }
    let frame = DataFrame::new(columns)?;
    Ok(FrameConversion { frame, diagnostics })
}

/// Rebuild a dataset from a frame.
///
/// Columns known to `reference` keep their role and type; other columns
/// become measures typed from their dtype. Identifier columns are moved
/// first, in `reference` order.
pub fn frame_to_dataset(
    name: &str,
    frame: &DataFrame,
    reference: &[Column],
) -> Result<TabularDataset> {
    let mut identifiers = Vec::new();
    let mut measures = Vec::new();
    for frame_column in frame.get_columns() {
        let column_name = frame_column.name().as_str();
        let column = match reference.iter().find(|c| c.name == column_name) {
            Some(known) => known.clone(),
            None => Column::measure(column_name, variable_type_for(frame_column.dtype())),
        };
        match column.role {
            ColumnRole::Identifier => identifiers.push(column),
            ColumnRole::Measure => measures.push(column),
        }
    }
    identifiers.sort_by_key(|column| {
        reference
            .iter()
            .position(|c| c.name == column.name)
            .unwrap_or(usize::MAX)
    });

    let schema: Vec<Column> = identifiers.into_iter().chain(measures).collect();
    let sources = schema
        .iter()
        .map(|column| frame.column(&column.name))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let mut dataset = TabularDataset::new(name, schema)?;
    for idx in 0..frame.height() {
        let row: Vec<Cell> = sources
            .iter()
            .map(|source| any_to_cell(source.get(idx).unwrap_or(AnyValue::Null)))
            .collect();
        dataset.push_row(row)?;
    }
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_accept_comma_decimals() {
        assert_eq!(parse_number("1,5"), Some(1.5));
        assert_eq!(parse_number(" 2.25 "), Some(2.25));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn formats_numbers_without_trailing_zeros() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(0.25), "0.25");
    }
}
