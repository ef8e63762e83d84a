//! Importance-based feature selection
//!
//! A grid-searched random forest is fitted on the training split only; its
//! impurity importances rank the engineered columns and the top slice
//! survives. Ranking is a stable descending sort, so equal importances keep
//! their original column order.

use crate::error::{PipelineError, Result};
use crate::training::{Estimator, GridSearch, RandomForestClassifier, Scoring};
use ndarray::{Array1, Array2};

const STAGE: &str = "feature-selection";

fn selector_grid(cv_folds: usize, seed: u64) -> GridSearch<RandomForestClassifier> {
    let forest = RandomForestClassifier::new(10)
        .with_min_samples_split(2)
        .with_seed(seed);
    GridSearch::new(vec![forest], Scoring::Accuracy, cv_folds).with_seed(seed)
}

/// Rank features by forest importance and return the `top_n` best names, in
/// rank order. Asking for more features than exist returns all of them.
pub fn top_n_features(
    x: &Array2<f64>,
    y: &Array1<f64>,
    names: &[String],
    top_n: usize,
    cv_folds: usize,
    seed: u64,
) -> Result<Vec<String>> {
    if names.len() != x.ncols() {
        return Err(PipelineError::Shape {
            expected: format!("{} feature names", x.ncols()),
            actual: format!("{} feature names", names.len()),
        });
    }
    if x.nrows() == 0 || y.len() != x.nrows() {
        return Err(PipelineError::data_insufficient(
            STAGE,
            format!(
                "cannot rank features on {} rows with {} labels",
                x.nrows(),
                y.len()
            ),
        ));
    }

    let mut search = selector_grid(cv_folds, seed);
    search.fit(x, y)?;

    if let Some(summary) = search.cv_summary() {
        tracing::info!(
            mean = summary.mean,
            std = summary.std,
            "selector cross-validation accuracy"
        );
    }

    let importances = search.feature_importances().ok_or_else(|| {
        PipelineError::data(STAGE, "selector produced no feature importances")
    })?;

    let mut ranked: Vec<(usize, f64)> = importances.iter().copied().enumerate().collect();
    // stable sort keeps column order among ties
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let keep = top_n.min(names.len());
    let selected: Vec<String> = ranked[..keep]
        .iter()
        .map(|&(index, _)| names[index].clone())
        .collect();

    tracing::info!(
        selected = selected.len(),
        candidates = names.len(),
        "feature selection complete"
    );
    Ok(selected)
}
