//! Feature engineering
//!
//! Transforms the combined raw frame into the numeric model frame. The steps
//! run in a fixed order because later ones consume columns earlier ones
//! produce; age imputation in particular needs the family and title features
//! already in place.

pub mod categories;
pub mod encode;
pub mod title;

pub use categories::{FamilySizeCategory, FareCategory};

use crate::data::{
    self, COL_CABIN, COL_CLASS, COL_EMBARKED, COL_FARE, COL_NAME, COL_PARCH, COL_SEX,
    COL_SIBSP, COL_TICKET,
};
use crate::error::Result;
use crate::imputation;
use polars::prelude::*;

pub const COL_TITLE: &str = "Title";
pub const COL_FARE_CATEGORY: &str = "Fare_Category";
pub const COL_FAMILY_SIZE: &str = "Family_Size";
pub const COL_FAMILY_SIZE_CATEGORY: &str = "Family_Size_Category";

/// The engineered frame plus the identifiers it no longer carries, in row
/// order.
#[derive(Debug, Clone)]
pub struct EngineeredDataset {
    pub frame: DataFrame,
    pub passenger_ids: Vec<i64>,
}

/// Run the full engineering sequence on the combined train+test frame.
///
/// `cv_folds` and `seed` parameterize the age-imputation regressor.
pub fn engineer_features(
    combined: &DataFrame,
    cv_folds: usize,
    seed: u64,
) -> Result<EngineeredDataset> {
    const STAGE: &str = "feature-engineering";
    let passenger_ids = data::id_column(combined, STAGE)?;

    // class indicators, original kept for the aux frames until the final drop
    let mut df = encode::one_hot(combined, COL_CLASS, false, STAGE)?;

    // embarkation port: mode fill, then indicators
    df = encode::fill_with_mode(&df, COL_EMBARKED, STAGE)?;
    df = encode::one_hot(&df, COL_EMBARKED, false, STAGE)?;

    df = encode::encode_sex(&df, COL_SEX, STAGE)?;
    df = add_title_column(&df)?;

    df = encode::fill_with_mean(&df, COL_FARE, STAGE)?;
    df = add_fare_category(&df)?;

    df = add_family_size(&df)?;

    df = imputation::impute_ages(&df, cv_folds, seed)?;

    df = encode::one_hot(&df, COL_TICKET, true, STAGE)?;
    df = encode::one_hot(&df, COL_CABIN, true, STAGE)?;
    df = encode::one_hot(&df, COL_TITLE, true, STAGE)?;

    for column in [COL_NAME, COL_CLASS, data::COL_ID, COL_EMBARKED] {
        df = df.drop(column)?;
    }

    Ok(EngineeredDataset {
        frame: df,
        passenger_ids,
    })
}

/// Derive the canonical title column from names. Any honorific outside the
/// fixed dictionary aborts the run.
fn add_title_column(df: &DataFrame) -> Result<DataFrame> {
    let names = df.column(COL_NAME)?.as_materialized_series().clone();
    let ids = data::id_column(df, "title-extraction")?;

    let titles: Vec<&'static str> = names
        .str()?
        .into_iter()
        .zip(&ids)
        .map(|(name, id)| {
            let name = name.unwrap_or("");
            title::extract_title(name, &format!("PassengerId={id}"))
        })
        .collect::<Result<_>>()?;

    let mut result = df.clone();
    result.with_column(Series::new(COL_TITLE.into(), titles))?;
    Ok(result)
}

/// Bucket the (already filled) fare column into its ordinal category.
fn add_fare_category(df: &DataFrame) -> Result<DataFrame> {
    let fares = df
        .column(COL_FARE)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let codes: Vec<i64> = fares
        .f64()?
        .into_iter()
        .map(|fare| FareCategory::from_fare(fare.unwrap_or(0.0)).code())
        .collect();

    let mut result = df.clone();
    result.with_column(Series::new(COL_FARE_CATEGORY.into(), codes))?;
    Ok(result)
}

/// Family_Size = Parch + SibSp + 1, plus its ordinal bucket.
fn add_family_size(df: &DataFrame) -> Result<DataFrame> {
    let parch = df
        .column(COL_PARCH)?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    let sibsp = df
        .column(COL_SIBSP)?
        .as_materialized_series()
        .cast(&DataType::Int64)?;

    let sizes: Vec<i64> = parch
        .i64()?
        .into_iter()
        .zip(sibsp.i64()?)
        .map(|(p, s)| p.unwrap_or(0) + s.unwrap_or(0) + 1)
        .collect();
    let codes: Vec<i64> = sizes
        .iter()
        .map(|&size| FamilySizeCategory::from_size(size).code())
        .collect();

    let mut result = df.clone();
    result.with_column(Series::new(COL_FAMILY_SIZE.into(), sizes))?;
    result.with_column(Series::new(COL_FAMILY_SIZE_CATEGORY.into(), codes))?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{COL_AGE, COL_ID, COL_OUTCOME};

    fn combined_frame() -> DataFrame {
        df!(
            COL_ID => &[1i64, 2, 3, 4, 5, 6],
            COL_OUTCOME => &[Some(0i64), Some(1), Some(1), Some(0), None, None],
            COL_CLASS => &[3i64, 1, 3, 2, 3, 1],
            COL_NAME => &[
                "Braund, Mr. Owen",
                "Cumings, Mrs. John",
                "Heikkinen, Miss. Laina",
                "Allen, Master. William",
                "Moran, Mr. James",
                "McCarthy, Mrs. Timothy",
            ],
            COL_SEX => &["male", "female", "female", "male", "male", "female"],
            COL_AGE => &[Some(22.0), Some(38.0), None, Some(4.0), None, Some(54.0)],
            COL_SIBSP => &[1i64, 1, 0, 3, 0, 0],
            COL_PARCH => &[0i64, 0, 0, 1, 0, 0],
            COL_TICKET => &["A1", "B2", "B2", "C3", "D4", "E5"],
            COL_FARE => &[Some(7.25), Some(71.28), Some(7.92), None, Some(8.46), Some(120.0)],
            COL_CABIN => &[None, Some("C85"), None, None, None, Some("E46")],
            COL_EMBARKED => &[Some("S"), Some("C"), Some("S"), Some("S"), None, Some("S")],
        )
        .unwrap()
    }

    #[test]
    fn test_engineering_produces_numeric_frame() {
        let combined = combined_frame();
        let result = engineer_features(&combined, 2, 42).unwrap();

        assert_eq!(result.passenger_ids, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(result.frame.height(), 6);

        let names: Vec<String> = result
            .frame
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        for dropped in [COL_NAME, COL_CLASS, COL_ID, COL_EMBARKED, COL_TICKET, COL_CABIN] {
            assert!(!names.iter().any(|n| n == dropped), "{dropped} must be gone");
        }
        for expected in [
            "Pclass_1",
            "Pclass_3",
            "Embarked_C",
            "Embarked_S",
            "Title_Mr",
            "Title_Mrs",
            COL_FARE_CATEGORY,
            COL_FAMILY_SIZE,
            COL_FAMILY_SIZE_CATEGORY,
        ] {
            assert!(names.iter().any(|n| n == expected), "{expected} missing");
        }
    }

    #[test]
    fn test_engineering_fills_every_age() {
        let combined = combined_frame();
        let result = engineer_features(&combined, 2, 42).unwrap();
        assert_eq!(result.frame.column(COL_AGE).unwrap().null_count(), 0);
    }

    #[test]
    fn test_observed_ages_are_untouched() {
        let combined = combined_frame();
        let result = engineer_features(&combined, 2, 42).unwrap();
        let ages = result
            .frame
            .column(COL_AGE)
            .unwrap()
            .as_materialized_series()
            .cast(&DataType::Float64)
            .unwrap();
        let ages = ages.f64().unwrap();
        assert_eq!(ages.get(0), Some(22.0));
        assert_eq!(ages.get(1), Some(38.0));
        assert_eq!(ages.get(5), Some(54.0));
    }

    #[test]
    fn test_family_size_derivation() {
        let combined = combined_frame();
        let result = engineer_features(&combined, 2, 42).unwrap();
        let sizes = result
            .frame
            .column(COL_FAMILY_SIZE)
            .unwrap()
            .as_materialized_series()
            .clone();
        let sizes = sizes.i64().unwrap();
        // row 3: Parch=1 + SibSp=3 + 1 = 5, a large family
        assert_eq!(sizes.get(3), Some(5));

        let cats = result
            .frame
            .column(COL_FAMILY_SIZE_CATEGORY)
            .unwrap()
            .as_materialized_series()
            .clone();
        assert_eq!(cats.i64().unwrap().get(3), Some(2));
    }

    #[test]
    fn test_unknown_title_aborts_engineering() {
        let mut combined = combined_frame();
        combined
            .with_column(Series::new(
                COL_NAME.into(),
                &[
                    "Braund, Mr. Owen",
                    "Cumings, Mrs. John",
                    "Heikkinen, Miss. Laina",
                    "Allen, Master. William",
                    "Moran, Brigadier. James",
                    "McCarthy, Mrs. Timothy",
                ],
            ))
            .unwrap();
        assert!(engineer_features(&combined, 2, 42).is_err());
    }
}
