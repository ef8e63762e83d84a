//! Column encoders and fillers
//!
//! One-hot expansion is always fitted on the frame it is given — the
//! orchestrator only ever passes the combined train+test frame, so both
//! splits end up with an identical, identically-ordered indicator column set.
//! Category order is the ascending sort of the labels, never hash order.

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use std::collections::BTreeMap;

/// Read a column as optional strings. Integer columns are stringified so
/// class values like `3` become the category label `"3"`.
fn string_values(df: &DataFrame, column: &str, stage: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(column)
        .map_err(|_| PipelineError::missing_column(stage, column))?
        .as_materialized_series()
        .clone();

    match series.dtype() {
        DataType::String => Ok(series
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect()),
        dt if dt.is_integer() => {
            let casted = series.cast(&DataType::Int64)?;
            Ok(casted
                .i64()?
                .into_iter()
                .map(|v| v.map(|i| i.to_string()))
                .collect())
        }
        other => Err(PipelineError::data(
            stage,
            format!("column '{column}' has unsupported dtype {other} for encoding"),
        )),
    }
}

/// One-hot encode a categorical column into `{column}_{category}` indicator
/// columns, ordered by ascending category label. Null cells contribute no
/// indicator (all zeros); a null is not a category.
pub fn one_hot(df: &DataFrame, column: &str, drop_original: bool, stage: &str) -> Result<DataFrame> {
    let values = string_values(df, column, stage)?;

    let mut categories: Vec<String> = values.iter().flatten().cloned().collect();
    categories.sort();
    categories.dedup();

    let mut result = df.clone();
    for category in &categories {
        let indicator: Vec<i32> = values
            .iter()
            .map(|v| (v.as_deref() == Some(category.as_str())) as i32)
            .collect();
        let name = format!("{column}_{category}");
        result.with_column(Series::new(name.into(), indicator))?;
    }

    if drop_original {
        result = result.drop(column)?;
    }
    Ok(result)
}

/// Fill nulls in a string column with its mode. Ties break toward the
/// lexicographically smallest label.
pub fn fill_with_mode(df: &DataFrame, column: &str, stage: &str) -> Result<DataFrame> {
    let values = string_values(df, column, stage)?;

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values.iter().flatten() {
        *counts.entry(v.as_str()).or_insert(0) += 1;
    }

    // BTreeMap iterates labels in ascending order, so a strict comparison
    // keeps the smallest label among equally frequent ones.
    let mode = counts
        .iter()
        .fold(None::<(&str, usize)>, |best, (&label, &count)| match best {
            Some((_, best_count)) if count <= best_count => best,
            _ => Some((label, count)),
        })
        .map(|(label, _)| label.to_string())
        .ok_or_else(|| {
            PipelineError::data_insufficient(
                stage,
                format!("column '{column}' has no observed values to take a mode from"),
            )
        })?;

    let filled: Vec<String> = values
        .into_iter()
        .map(|v| v.unwrap_or_else(|| mode.clone()))
        .collect();

    let mut result = df.clone();
    result.with_column(Series::new(column.into(), filled))?;
    Ok(result)
}

/// Fill nulls in a numeric column with the column mean over all rows.
pub fn fill_with_mean(df: &DataFrame, column: &str, stage: &str) -> Result<DataFrame> {
    let series = df
        .column(column)
        .map_err(|_| PipelineError::missing_column(stage, column))?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let ca = series.f64()?;

    let mean = ca.mean().ok_or_else(|| {
        PipelineError::data_insufficient(
            stage,
            format!("column '{column}' has no observed values to take a mean from"),
        )
    })?;

    let filled: Vec<f64> = ca.into_iter().map(|v| v.unwrap_or(mean)).collect();
    let mut result = df.clone();
    result.with_column(Series::new(column.into(), filled))?;
    Ok(result)
}

/// Binary-encode a sex column with the fixed mapping {female -> 0, male -> 1}.
/// The mapping is never fitted on observed data, so the encoding is identical
/// even when a split contains only one of the two labels.
pub fn encode_sex(df: &DataFrame, column: &str, stage: &str) -> Result<DataFrame> {
    let values = string_values(df, column, stage)?;

    let encoded: Vec<i32> = values
        .iter()
        .enumerate()
        .map(|(row, v)| match v.as_deref() {
            Some("female") => Ok(0),
            Some("male") => Ok(1),
            Some(other) => Err(PipelineError::data(
                stage,
                format!("unexpected sex label '{other}' at row {row}"),
            )),
            None => Err(PipelineError::data(
                stage,
                format!("null sex label at row {row}"),
            )),
        })
        .collect::<Result<_>>()?;

    let mut result = df.clone();
    result.with_column(Series::new(column.into(), encoded))?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_hot_sorted_columns_sum_to_one() {
        let df = df!("port" => &["S", "C", "Q", "S", "C"]).unwrap();
        let result = one_hot(&df, "port", true, "test").unwrap();

        let names: Vec<String> = result
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["port_C", "port_Q", "port_S"]);

        for row in 0..result.height() {
            let sum: i32 = names
                .iter()
                .map(|n| {
                    result
                        .column(n)
                        .unwrap()
                        .as_materialized_series()
                        .i32()
                        .unwrap()
                        .get(row)
                        .unwrap()
                })
                .sum();
            assert_eq!(sum, 1, "row {row} must belong to exactly one category");
        }
    }

    #[test]
    fn test_one_hot_integer_column_keeps_original() {
        let df = df!("Pclass" => &[3i64, 1, 2, 3]).unwrap();
        let result = one_hot(&df, "Pclass", false, "test").unwrap();

        assert!(result.column("Pclass").is_ok());
        assert!(result.column("Pclass_1").is_ok());
        assert!(result.column("Pclass_2").is_ok());
        assert!(result.column("Pclass_3").is_ok());

        let p3 = result.column("Pclass_3").unwrap().as_materialized_series().clone();
        let p3 = p3.i32().unwrap();
        assert_eq!(p3.get(0), Some(1));
        assert_eq!(p3.get(1), Some(0));
    }

    #[test]
    fn test_one_hot_null_rows_are_all_zero() {
        let df = df!("cabin" => &[Some("C85"), None, Some("E46")]).unwrap();
        let result = one_hot(&df, "cabin", true, "test").unwrap();

        let sum: i32 = ["cabin_C85", "cabin_E46"]
            .iter()
            .map(|n| {
                result
                    .column(n)
                    .unwrap()
                    .as_materialized_series()
                    .i32()
                    .unwrap()
                    .get(1)
                    .unwrap()
            })
            .sum();
        assert_eq!(sum, 0);
    }

    #[test]
    fn test_fill_with_mode_breaks_ties_ascending() {
        // "C" and "S" both appear twice; "C" sorts first
        let df = df!("port" => &[Some("S"), Some("C"), Some("S"), Some("C"), None]).unwrap();
        let result = fill_with_mode(&df, "port", "test").unwrap();
        let filled = result.column("port").unwrap().as_materialized_series().clone();
        assert_eq!(filled.str().unwrap().get(4), Some("C"));
    }

    #[test]
    fn test_fill_with_mean() {
        let df = df!("fare" => &[Some(10.0), None, Some(20.0)]).unwrap();
        let result = fill_with_mean(&df, "fare", "test").unwrap();
        let filled = result.column("fare").unwrap().as_materialized_series().clone();
        assert_eq!(filled.f64().unwrap().get(1), Some(15.0));
    }

    #[test]
    fn test_encode_sex_fixed_order() {
        let df = df!("Sex" => &["male", "female", "male"]).unwrap();
        let result = encode_sex(&df, "Sex", "test").unwrap();
        let encoded = result.column("Sex").unwrap().as_materialized_series().clone();
        let encoded = encoded.i32().unwrap();
        assert_eq!(encoded.get(0), Some(1));
        assert_eq!(encoded.get(1), Some(0));
    }

    #[test]
    fn test_encode_sex_stable_on_single_label() {
        // female alone must still map to 0
        let df = df!("Sex" => &["female", "female"]).unwrap();
        let result = encode_sex(&df, "Sex", "test").unwrap();
        let encoded = result.column("Sex").unwrap().as_materialized_series().clone();
        assert_eq!(encoded.i32().unwrap().get(0), Some(0));
    }

    #[test]
    fn test_encode_sex_rejects_unknown_label() {
        let df = df!("Sex" => &["male", "unknown"]).unwrap();
        assert!(encode_sex(&df, "Sex", "test").is_err());
    }
}
