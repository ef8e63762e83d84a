//! Integration test: full pipeline (combine -> engineer -> select -> vote)

use lifeboat::data;
use lifeboat::ensemble::EnsembleGrids;
use lifeboat::pipeline::{predict_survival, PipelineParams};
use polars::prelude::*;

fn passenger_frame(ids: &[i64], with_outcome: bool) -> DataFrame {
    let n = ids.len();
    let names: Vec<String> = ids
        .iter()
        .map(|id| {
            if id % 2 == 0 {
                format!("Family{id}, Mrs. Given")
            } else {
                format!("Family{id}, Mr. Given")
            }
        })
        .collect();
    let sex: Vec<&str> = ids
        .iter()
        .map(|id| if id % 2 == 0 { "female" } else { "male" })
        .collect();
    let ages: Vec<Option<f64>> = ids
        .iter()
        .map(|id| {
            if id % 7 == 0 {
                None
            } else {
                Some(18.0 + (id % 40) as f64)
            }
        })
        .collect();
    let fares: Vec<Option<f64>> = ids
        .iter()
        .map(|id| {
            if id % 11 == 0 {
                None
            } else {
                Some(5.0 + (id % 20) as f64 * 8.0)
            }
        })
        .collect();
    let embarked: Vec<Option<&str>> = ids
        .iter()
        .map(|id| match id % 5 {
            0 => None,
            1 | 2 => Some("S"),
            3 => Some("C"),
            _ => Some("Q"),
        })
        .collect();

    let mut df = df!(
        "PassengerId" => ids,
        "Pclass" => ids.iter().map(|id| (id % 3 + 1)).collect::<Vec<i64>>(),
        "Name" => names,
        "Sex" => sex,
        "Age" => ages,
        "SibSp" => ids.iter().map(|id| id % 2).collect::<Vec<i64>>(),
        "Parch" => ids.iter().map(|id| id % 3).collect::<Vec<i64>>(),
        "Ticket" => ids.iter().map(|id| format!("T{}", id % 6)).collect::<Vec<String>>(),
        "Fare" => fares,
        "Cabin" => ids.iter().map(|id| if id % 9 == 0 { Some("C85") } else { None }).collect::<Vec<Option<&str>>>(),
        "Embarked" => embarked,
    )
    .unwrap();

    if with_outcome {
        // women survive in this synthetic world
        let outcome: Vec<i64> = ids.iter().map(|id| (id % 2 == 0) as i64).collect();
        df.with_column(Series::new("Survived".into(), outcome)).unwrap();
    }
    df
}

fn small_params() -> PipelineParams {
    PipelineParams {
        top_n: 12,
        cv_folds: 3,
        seed: 42,
        grids: EnsembleGrids::compact(),
    }
}

#[test]
fn test_pipeline_end_to_end() {
    let train_ids: Vec<i64> = (1..=30).collect();
    let test_ids: Vec<i64> = (101..=110).collect();
    let train = passenger_frame(&train_ids, true);
    let test = passenger_frame(&test_ids, false);

    let result = predict_survival(&train, &test, &small_params()).unwrap();

    assert_eq!(result.passenger_ids, test_ids);
    assert_eq!(result.labels.len(), test_ids.len());
    for label in result.labels.iter() {
        assert!(*label == 0.0 || *label == 1.0, "labels must be binary");
    }
    assert!(result.selected_features.len() <= 12);
}

#[test]
fn test_pipeline_learns_the_survival_rule() {
    let train_ids: Vec<i64> = (1..=40).collect();
    let test_ids: Vec<i64> = (101..=108).collect();
    let train = passenger_frame(&train_ids, true);
    let test = passenger_frame(&test_ids, false);

    let result = predict_survival(&train, &test, &small_params()).unwrap();

    let correct = result
        .passenger_ids
        .iter()
        .zip(result.labels.iter())
        .filter(|(id, label)| {
            let expected = (*id % 2 == 0) as i64 as f64;
            (**label - expected).abs() < 0.5
        })
        .count();
    assert!(
        correct >= 6,
        "expected the ensemble to recover the sex rule, got {correct}/8"
    );
}

#[test]
fn test_pipeline_is_deterministic_for_a_seed() {
    let train = passenger_frame(&(1..=30).collect::<Vec<i64>>(), true);
    let test = passenger_frame(&(101..=106).collect::<Vec<i64>>(), false);

    let a = predict_survival(&train, &test, &small_params()).unwrap();
    let b = predict_survival(&train, &test, &small_params()).unwrap();

    assert_eq!(a.labels.to_vec(), b.labels.to_vec());
    assert_eq!(a.selected_features, b.selected_features);
}

#[test]
fn test_pipeline_rejects_duplicate_ids_across_splits() {
    let train = passenger_frame(&(1..=20).collect::<Vec<i64>>(), true);
    let test = passenger_frame(&(10..=15).collect::<Vec<i64>>(), false);
    assert!(predict_survival(&train, &test, &small_params()).is_err());
}

#[test]
fn test_pipeline_rejects_unknown_honorific() {
    let train = passenger_frame(&(1..=20).collect::<Vec<i64>>(), true);
    let mut test = passenger_frame(&(101..=104).collect::<Vec<i64>>(), false);
    test.with_column(Series::new(
        "Name".into(),
        &[
            "Doe, Mr. John",
            "Doe, Mrs. Jane",
            "Doe, Brigadier. Jim",
            "Doe, Miss. Joan",
        ],
    ))
    .unwrap();

    let err = predict_survival(&train, &test, &small_params()).unwrap_err();
    assert!(matches!(
        err,
        lifeboat::PipelineError::UnknownTitle { .. }
    ));
}

#[test]
fn test_submission_round_trip() {
    let dir = std::env::temp_dir().join("lifeboat-submission-test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("submission.csv");

    let ids = vec![892i64, 893, 894];
    let labels = ndarray::array![0.0, 1.0, 1.0];
    data::write_submission(&path, &ids, &labels).unwrap();

    let df = data::load_csv(&path).unwrap();
    assert_eq!(df.height(), 3);
    let written_ids = data::id_column(&df, "test").unwrap();
    assert_eq!(written_ids, ids);

    let outcome = df
        .column("Survived")
        .unwrap()
        .as_materialized_series()
        .cast(&DataType::Int64)
        .unwrap();
    let outcome: Vec<i64> = outcome.i64().unwrap().into_iter().flatten().collect();
    assert_eq!(outcome, vec![0, 1, 1]);
}
