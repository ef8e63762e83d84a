//! Exhaustive grid search with k-fold scoring
//!
//! Candidates are concrete estimator values rather than parameter maps; the
//! caller enumerates the grid and the search scores each candidate by
//! cross-validation, then refits the winner on the full data. When the data
//! cannot fill two folds the search skips scoring and keeps the first
//! candidate, so tiny inputs still produce a usable model.

use super::cross_validation::{CvSummary, KFold};
use super::Estimator;
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;

/// Model scoring metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scoring {
    /// Fraction of correct labels
    Accuracy,
    /// Coefficient of determination; zero-variance targets score 0.0
    RSquared,
}

impl Scoring {
    pub fn score(self, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        match self {
            Scoring::Accuracy => {
                if y_true.is_empty() {
                    return 0.0;
                }
                let correct = y_true
                    .iter()
                    .zip(y_pred.iter())
                    .filter(|(t, p)| (**t - **p).abs() < 0.5)
                    .count();
                correct as f64 / y_true.len() as f64
            }
            Scoring::RSquared => {
                if y_true.is_empty() {
                    return 0.0;
                }
                let mean = y_true.mean().unwrap_or(0.0);
                let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();
                if ss_tot == 0.0 {
                    return 0.0;
                }
                let ss_res: f64 = y_true
                    .iter()
                    .zip(y_pred.iter())
                    .map(|(t, p)| (t - p).powi(2))
                    .sum();
                1.0 - ss_res / ss_tot
            }
        }
    }
}

fn take_rows(x: &Array2<f64>, y: &Array1<f64>, rows: &[usize]) -> (Array2<f64>, Array1<f64>) {
    let x_sub = x.select(Axis(0), rows);
    let y_sub = Array1::from_vec(rows.iter().map(|&i| y[i]).collect());
    (x_sub, y_sub)
}

/// Grid search over a fixed candidate list
#[derive(Debug, Clone)]
pub struct GridSearch<E: Estimator + Clone> {
    candidates: Vec<E>,
    pub cv_folds: usize,
    pub scoring: Scoring,
    pub seed: u64,
    best: Option<E>,
    best_summary: Option<CvSummary>,
}

impl<E: Estimator + Clone> GridSearch<E> {
    pub fn new(candidates: Vec<E>, scoring: Scoring, cv_folds: usize) -> Self {
        Self {
            candidates,
            cv_folds,
            scoring,
            seed: 42,
            best: None,
            best_summary: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Score every candidate and refit the best on the full data. Ties keep
    /// the earliest candidate.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if self.candidates.is_empty() {
            return Err(PipelineError::data(
                "grid-search",
                "candidate grid is empty",
            ));
        }
        let n = x.nrows();
        if n == 0 {
            return Err(PipelineError::data_insufficient(
                "grid-search",
                "cannot search on zero rows",
            ));
        }

        let effective_folds = self.cv_folds.min(n);
        let best_index = if effective_folds < 2 {
            // too little data to hold anything out
            self.best_summary = None;
            0
        } else {
            let splits = KFold::new(effective_folds).with_seed(self.seed).split(n)?;
            let scoring = self.scoring;

            let summaries: Vec<CvSummary> = self
                .candidates
                .par_iter()
                .map(|candidate| -> Result<CvSummary> {
                    let mut scores = Vec::with_capacity(splits.len());
                    for split in &splits {
                        let (x_train, y_train) = take_rows(x, y, &split.train_indices);
                        let (x_val, y_val) = take_rows(x, y, &split.validation_indices);

                        let mut model = candidate.clone();
                        model.fit(&x_train, &y_train)?;
                        let pred = model.predict(&x_val)?;
                        scores.push(scoring.score(&y_val, &pred));
                    }
                    Ok(CvSummary::from_scores(scores))
                })
                .collect::<Result<Vec<_>>>()?;

            let mut best_index = 0;
            let mut best_mean = f64::NEG_INFINITY;
            for (index, summary) in summaries.iter().enumerate() {
                if summary.mean > best_mean {
                    best_mean = summary.mean;
                    best_index = index;
                }
            }
            self.best_summary = Some(summaries[best_index].clone());
            best_index
        };

        let mut winner = self.candidates[best_index].clone();
        winner.fit(x, y)?;
        self.best = Some(winner);
        Ok(())
    }

    pub fn best(&self) -> Result<&E> {
        self.best
            .as_ref()
            .ok_or_else(|| PipelineError::data("grid-search", "best() called before fit"))
    }

    /// Fold score summary for the winning candidate, absent when CV was
    /// skipped for lack of data.
    pub fn cv_summary(&self) -> Option<&CvSummary> {
        self.best_summary.as_ref()
    }

    /// Score of the refitted winner on the data it was trained on.
    pub fn training_score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let pred = self.best()?.predict(x)?;
        Ok(self.scoring.score(y, &pred))
    }
}

impl<E: Estimator + Clone> Estimator for GridSearch<E> {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        GridSearch::fit(self, x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.best()?.predict(x)
    }

    fn feature_importances(&self) -> Option<&[f64]> {
        self.best.as_ref().and_then(|b| b.feature_importances())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::random_forest::RandomForestClassifier;
    use ndarray::array;

    fn clusters() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec(
            (10, 2),
            vec![
                1.0, 2.0, 1.2, 2.1, 0.9, 1.9, 1.1, 2.2, 1.3, 1.8, 8.0, 9.0, 8.2, 9.1, 7.9,
                8.9, 8.1, 9.2, 8.3, 8.8,
            ],
        )
        .unwrap();
        let y = array![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_search_picks_and_refits_a_winner() {
        let (x, y) = clusters();
        let candidates = vec![
            RandomForestClassifier::new(5).with_seed(1),
            RandomForestClassifier::new(10).with_seed(1),
        ];
        let mut search = GridSearch::new(candidates, Scoring::Accuracy, 5);
        search.fit(&x, &y).unwrap();

        assert!(search.cv_summary().is_some());
        let pred = search.predict(&x).unwrap();
        assert_eq!(pred.to_vec(), y.to_vec());
    }

    #[test]
    fn test_tiny_input_skips_cross_validation() {
        let x = Array2::from_shape_vec((1, 2), vec![1.0, 2.0]).unwrap();
        let y = array![0.0];
        let mut search = GridSearch::new(
            vec![RandomForestClassifier::new(3)],
            Scoring::Accuracy,
            10,
        );
        search.fit(&x, &y).unwrap();
        assert!(search.cv_summary().is_none());
        assert!(search.best().is_ok());
    }

    #[test]
    fn test_empty_grid_is_an_error() {
        let (x, y) = clusters();
        let mut search: GridSearch<RandomForestClassifier> =
            GridSearch::new(vec![], Scoring::Accuracy, 5);
        assert!(search.fit(&x, &y).is_err());
    }

    #[test]
    fn test_accuracy_scoring() {
        let y_true = array![0.0, 1.0, 1.0, 0.0];
        let y_pred = array![0.0, 1.0, 0.0, 0.0];
        assert!((Scoring::Accuracy.score(&y_true, &y_pred) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_r_squared_scoring() {
        let y_true = array![1.0, 2.0, 3.0];
        assert!((Scoring::RSquared.score(&y_true, &y_true) - 1.0).abs() < 1e-12);

        // constant target has no variance to explain
        let constant = array![5.0, 5.0, 5.0];
        assert_eq!(Scoring::RSquared.score(&constant, &constant), 0.0);
    }
}
