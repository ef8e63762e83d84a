//! End-to-end survival prediction pipeline
//!
//! Load, validate, combine, engineer, select, fit, predict, write. Every
//! stage error aborts the run; there is no partial output file.

use crate::data::{self, COL_OUTCOME};
use crate::ensemble::{self, EnsembleGrids};
use crate::error::Result;
use crate::features;
use crate::selection;
use crate::training::Estimator;
use ndarray::Array1;
use polars::prelude::*;
use std::path::PathBuf;

/// Tuning knobs shared by every stage.
#[derive(Debug, Clone)]
pub struct PipelineParams {
    /// Features kept after importance ranking
    pub top_n: usize,
    /// Folds for every grid search
    pub cv_folds: usize,
    pub seed: u64,
    pub grids: EnsembleGrids,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            top_n: 100,
            cv_folds: 10,
            seed: 42,
            grids: EnsembleGrids::default(),
        }
    }
}

/// A full batch run: file paths plus the tuning knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    pub output_path: PathBuf,
    pub params: PipelineParams,
}

/// Predictions for the test split, in its original row order.
#[derive(Debug, Clone)]
pub struct SurvivalPredictions {
    pub passenger_ids: Vec<i64>,
    pub labels: Array1<f64>,
    /// Names of the features the ensemble was trained on, in rank order.
    pub selected_features: Vec<String>,
}

/// Run the modeling stages on in-memory frames.
pub fn predict_survival(
    train: &DataFrame,
    test: &DataFrame,
    params: &PipelineParams,
) -> Result<SurvivalPredictions> {
    const STAGE: &str = "pipeline";
    let n_train = train.height();

    let combined = data::combine_train_test(train, test)?;
    tracing::info!(
        train_rows = n_train,
        test_rows = test.height(),
        "combined input frames"
    );

    let engineered = features::engineer_features(&combined, params.cv_folds, params.seed)?;
    let (train_frame, test_frame) = data::split_back(&engineered.frame, n_train);
    data::ensure_same_schema(&train_frame, &test_frame, STAGE)?;

    let feature_names: Vec<String> = train_frame
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .filter(|n| n != COL_OUTCOME)
        .collect();
    tracing::info!(features = feature_names.len(), "engineered feature columns");

    let x_train = data::to_feature_matrix(&train_frame, &feature_names, STAGE)?;
    let y_train = data::outcome_vector(&train_frame, STAGE)?;

    let selected = selection::top_n_features(
        &x_train,
        &y_train,
        &feature_names,
        params.top_n,
        params.cv_folds,
        params.seed,
    )?;

    let x_train = data::to_feature_matrix(&train_frame, &selected, STAGE)?;
    let x_test = data::to_feature_matrix(&test_frame, &selected, STAGE)?;

    let mut ensemble =
        ensemble::survival_ensemble(&params.grids, params.cv_folds, params.seed);
    tracing::info!(members = ?ensemble.member_names(), "fitting voting ensemble");
    ensemble.fit(&x_train, &y_train)?;
    let labels = ensemble.predict(&x_test)?;

    let passenger_ids = engineered.passenger_ids[n_train..].to_vec();
    Ok(SurvivalPredictions {
        passenger_ids,
        labels,
        selected_features: selected,
    })
}

/// Full batch run against the filesystem.
pub fn run(config: &PipelineConfig) -> Result<()> {
    const STAGE: &str = "load";
    tracing::info!(path = %config.train_path.display(), "loading training data");
    let train = data::load_csv(&config.train_path)?;
    data::validate_raw_schema(&train, true, STAGE)?;

    tracing::info!(path = %config.test_path.display(), "loading test data");
    let test = data::load_csv(&config.test_path)?;
    data::validate_raw_schema(&test, false, STAGE)?;

    let predictions = predict_survival(&train, &test, &config.params)?;

    data::write_submission(
        &config.output_path,
        &predictions.passenger_ids,
        &predictions.labels,
    )?;
    tracing::info!(
        path = %config.output_path.display(),
        rows = predictions.passenger_ids.len(),
        "wrote predictions"
    );
    Ok(())
}
