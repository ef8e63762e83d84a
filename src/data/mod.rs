//! Dataset loading, combination, and matrix conversion
//!
//! The pipeline treats the dataset as a polars [`DataFrame`]. Train and test
//! are concatenated once so every encoding step sees the full category space,
//! then split back by the original train height.

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::path::Path;

pub const COL_ID: &str = "PassengerId";
pub const COL_OUTCOME: &str = "Survived";
pub const COL_CLASS: &str = "Pclass";
pub const COL_NAME: &str = "Name";
pub const COL_SEX: &str = "Sex";
pub const COL_AGE: &str = "Age";
pub const COL_SIBSP: &str = "SibSp";
pub const COL_PARCH: &str = "Parch";
pub const COL_TICKET: &str = "Ticket";
pub const COL_FARE: &str = "Fare";
pub const COL_CABIN: &str = "Cabin";
pub const COL_EMBARKED: &str = "Embarked";

/// Raw columns shared by train and test. Train additionally carries
/// [`COL_OUTCOME`].
pub const RAW_COLUMNS: [&str; 11] = [
    COL_ID,
    COL_CLASS,
    COL_NAME,
    COL_SEX,
    COL_AGE,
    COL_SIBSP,
    COL_PARCH,
    COL_TICKET,
    COL_FARE,
    COL_CABIN,
    COL_EMBARKED,
];

/// Load a delimited dataset from disk.
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(1000))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Check that every expected raw column is present.
pub fn validate_raw_schema(df: &DataFrame, with_outcome: bool, stage: &str) -> Result<()> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();

    for col in RAW_COLUMNS {
        if !names.iter().any(|n| n == col) {
            return Err(PipelineError::missing_column(stage, col));
        }
    }
    if with_outcome && !names.iter().any(|n| n == COL_OUTCOME) {
        return Err(PipelineError::missing_column(stage, COL_OUTCOME));
    }
    Ok(())
}

/// Check the identifier column is unique across the frame.
pub fn validate_unique_ids(df: &DataFrame, stage: &str) -> Result<()> {
    let ids = id_column(df, stage)?;
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    for id in &ids {
        if !seen.insert(*id) {
            return Err(PipelineError::data(
                stage,
                format!("duplicate {COL_ID} {id}"),
            ));
        }
    }
    Ok(())
}

/// Concatenate train and test into one frame. Test rows receive a null
/// outcome placeholder; the test columns are reordered to match train.
pub fn combine_train_test(train: &DataFrame, test: &DataFrame) -> Result<DataFrame> {
    const STAGE: &str = "combine";
    validate_raw_schema(train, true, STAGE)?;
    validate_raw_schema(test, false, STAGE)?;

    let mut test = test.clone();
    let placeholder =
        Series::full_null(COL_OUTCOME.into(), test.height(), &DataType::Int64);
    test.with_column(placeholder)?;

    let order: Vec<String> = train
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    let test = test.select(order)?;

    let combined = train.vstack(&test)?;
    validate_unique_ids(&combined, STAGE)?;
    Ok(combined)
}

/// Split an engineered frame back into its train and test halves.
pub fn split_back(combined: &DataFrame, n_train: usize) -> (DataFrame, DataFrame) {
    let train = combined.slice(0, n_train);
    let test = combined.slice(n_train as i64, combined.height() - n_train);
    (train, test)
}

/// Extract the identifier column as integers.
pub fn id_column(df: &DataFrame, stage: &str) -> Result<Vec<i64>> {
    let ca = df
        .column(COL_ID)
        .map_err(|_| PipelineError::missing_column(stage, COL_ID))?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    let ca = ca.i64()?;
    ca.into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| PipelineError::data(stage, format!("null {COL_ID} at row {row}")))
        })
        .collect()
}

/// Verify two frames carry the same column names in the same order.
pub fn ensure_same_schema(a: &DataFrame, b: &DataFrame, stage: &str) -> Result<()> {
    let names_a: Vec<String> = a.get_column_names().iter().map(|n| n.to_string()).collect();
    let names_b: Vec<String> = b.get_column_names().iter().map(|n| n.to_string()).collect();
    if names_a != names_b {
        return Err(PipelineError::schema_mismatch(
            stage,
            format!("column sets diverge: {names_a:?} vs {names_b:?}"),
        ));
    }
    Ok(())
}

/// Convert the named columns of a frame to a dense feature matrix.
///
/// Every value must be present; a null at this point means an imputation
/// step was skipped upstream.
pub fn to_feature_matrix(df: &DataFrame, columns: &[String], stage: &str) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = columns.len();
    let mut matrix = Array2::zeros((n_rows, n_cols));

    for (j, name) in columns.iter().enumerate() {
        let series = df
            .column(name.as_str())
            .map_err(|_| PipelineError::missing_column(stage, name))?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let ca = series.f64()?;
        for (i, value) in ca.into_iter().enumerate() {
            match value {
                Some(v) => matrix[[i, j]] = v,
                None => {
                    return Err(PipelineError::data(
                        stage,
                        format!("null value in feature '{name}' at row {i}"),
                    ))
                }
            }
        }
    }

    Ok(matrix)
}

/// Extract the binary outcome column as a label vector.
pub fn outcome_vector(df: &DataFrame, stage: &str) -> Result<Array1<f64>> {
    let series = df
        .column(COL_OUTCOME)
        .map_err(|_| PipelineError::missing_column(stage, COL_OUTCOME))?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let ca = series.f64()?;
    let values: Vec<f64> = ca
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| {
                PipelineError::data_insufficient(
                    stage,
                    format!("null outcome label at row {row}"),
                )
            })
        })
        .collect::<Result<_>>()?;
    Ok(Array1::from_vec(values))
}

/// Write the two-column prediction file, one row per test record in the
/// original test order.
pub fn write_submission(path: &Path, ids: &[i64], predictions: &Array1<f64>) -> Result<()> {
    if ids.len() != predictions.len() {
        return Err(PipelineError::Shape {
            expected: format!("{} predictions", ids.len()),
            actual: format!("{} predictions", predictions.len()),
        });
    }

    let outcome: Vec<i64> = predictions.iter().map(|&p| p.round() as i64).collect();
    let mut df = DataFrame::new(vec![
        Series::new(COL_ID.into(), ids).into(),
        Series::new(COL_OUTCOME.into(), outcome).into(),
    ])?;

    let mut file = std::fs::File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_frame(with_outcome: bool) -> DataFrame {
        let mut df = df!(
            COL_ID => &[1i64, 2, 3],
            COL_CLASS => &[3i64, 1, 2],
            COL_NAME => &["Braund, Mr. Owen", "Cumings, Mrs. John", "Heikkinen, Miss. Laina"],
            COL_SEX => &["male", "female", "female"],
            COL_AGE => &[Some(22.0), Some(38.0), None],
            COL_SIBSP => &[1i64, 1, 0],
            COL_PARCH => &[0i64, 0, 0],
            COL_TICKET => &["A/5 21171", "PC 17599", "STON/O2. 3101282"],
            COL_FARE => &[Some(7.25), Some(71.28), None],
            COL_CABIN => &[None, Some("C85"), None],
            COL_EMBARKED => &[Some("S"), Some("C"), None],
        )
        .unwrap();
        if with_outcome {
            df.with_column(Series::new(COL_OUTCOME.into(), &[0i64, 1, 1]))
                .unwrap();
        }
        df
    }

    #[test]
    fn test_validate_raw_schema() {
        let df = raw_frame(true);
        assert!(validate_raw_schema(&df, true, "test").is_ok());

        let dropped = df.drop(COL_FARE).unwrap();
        let err = validate_raw_schema(&dropped, true, "test").unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { .. }));
    }

    #[test]
    fn test_combine_adds_null_outcome_for_test_rows() {
        let train = raw_frame(true);
        let test = {
            let mut t = raw_frame(false);
            // shift ids so they stay unique
            t.with_column(Series::new(COL_ID.into(), &[4i64, 5, 6])).unwrap();
            t
        };

        let combined = combine_train_test(&train, &test).unwrap();
        assert_eq!(combined.height(), 6);

        let outcome = combined.column(COL_OUTCOME).unwrap();
        assert_eq!(outcome.null_count(), 3);
    }

    #[test]
    fn test_combine_rejects_duplicate_ids() {
        let train = raw_frame(true);
        let test = raw_frame(false); // same ids as train
        let err = combine_train_test(&train, &test).unwrap_err();
        assert!(matches!(err, PipelineError::Data { .. }));
    }

    #[test]
    fn test_split_back_roundtrip() {
        let train = raw_frame(true);
        let test = {
            let mut t = raw_frame(false);
            t.with_column(Series::new(COL_ID.into(), &[4i64, 5, 6])).unwrap();
            t
        };
        let combined = combine_train_test(&train, &test).unwrap();
        let (tr, te) = split_back(&combined, train.height());
        assert_eq!(tr.height(), 3);
        assert_eq!(te.height(), 3);
        assert_eq!(id_column(&te, "test").unwrap(), vec![4, 5, 6]);
    }

    #[test]
    fn test_to_feature_matrix_rejects_nulls() {
        let df = raw_frame(true);
        let err =
            to_feature_matrix(&df, &[COL_AGE.to_string()], "test").unwrap_err();
        assert!(matches!(err, PipelineError::Data { .. }));

        let ok = to_feature_matrix(
            &df,
            &[COL_SIBSP.to_string(), COL_PARCH.to_string()],
            "test",
        )
        .unwrap();
        assert_eq!(ok.shape(), &[3, 2]);
        assert_eq!(ok[[0, 0]], 1.0);
    }

    #[test]
    fn test_outcome_vector() {
        let df = raw_frame(true);
        let y = outcome_vector(&df, "test").unwrap();
        assert_eq!(y.to_vec(), vec![0.0, 1.0, 1.0]);
    }
}
