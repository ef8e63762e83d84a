//! Gradient boosted decision trees
//!
//! Regressor fits shallow trees to residuals with shrinkage; the classifier
//! boosts in log-odds space and thresholds the sigmoid at 0.5. Optional row
//! subsampling draws from a Xoshiro stream so a fixed seed reproduces the
//! same model.

use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use super::decision_tree::DecisionTree;
use super::Estimator;
use crate::error::{PipelineError, Result};

/// Shared boosting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Shrinkage applied to each tree's contribution
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Row subsample ratio per round; 1.0 disables subsampling
    pub subsample: f64,
    pub seed: u64,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            subsample: 1.0,
            seed: 42,
        }
    }
}

impl GradientBoostingConfig {
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

fn subsample_rows(
    n_samples: usize,
    ratio: f64,
    rng: &mut Xoshiro256PlusPlus,
) -> Option<Vec<usize>> {
    if ratio >= 1.0 {
        return None;
    }
    let k = ((n_samples as f64 * ratio).round() as usize).max(1);
    let mut indices: Vec<usize> = (0..n_samples).collect();
    indices.shuffle(rng);
    indices.truncate(k);
    indices.sort_unstable();
    Some(indices)
}

fn fit_round_tree(
    x: &Array2<f64>,
    residuals: &Array1<f64>,
    config: &GradientBoostingConfig,
    rng: &mut Xoshiro256PlusPlus,
) -> Result<DecisionTree> {
    let mut tree = DecisionTree::new_regressor()
        .with_max_depth(config.max_depth)
        .with_min_samples_leaf(config.min_samples_leaf)
        .with_seed(rng.gen());

    match subsample_rows(x.nrows(), config.subsample, rng) {
        Some(rows) => {
            let x_sub = x.select(Axis(0), &rows);
            let r_sub = Array1::from_vec(rows.iter().map(|&i| residuals[i]).collect());
            tree.fit(&x_sub, &r_sub)?;
        }
        None => tree.fit(x, residuals)?,
    }
    Ok(tree)
}

fn accumulate_importances(totals: &mut [f64], tree: &DecisionTree) {
    if let Some(imp) = tree.feature_importances() {
        for (total, &v) in totals.iter_mut().zip(imp) {
            *total += v;
        }
    }
}

fn normalize(totals: &mut [f64]) {
    let sum: f64 = totals.iter().sum();
    if sum > 0.0 {
        for v in totals {
            *v /= sum;
        }
    }
}

/// Gradient boosting regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    pub config: GradientBoostingConfig,
    trees: Vec<DecisionTree>,
    initial_prediction: f64,
    importances: Vec<f64>,
}

impl GradientBoostingRegressor {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            initial_prediction: 0.0,
            importances: Vec::new(),
        }
    }
}

impl Estimator for GradientBoostingRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples == 0 {
            return Err(PipelineError::data_insufficient(
                "gradient-boosting",
                "cannot fit on zero rows",
            ));
        }
        if n_samples != y.len() {
            return Err(PipelineError::Shape {
                expected: format!("{n_samples} labels"),
                actual: format!("{} labels", y.len()),
            });
        }

        self.initial_prediction = y.mean().unwrap_or(0.0);
        self.trees = Vec::with_capacity(self.config.n_estimators);
        self.importances = vec![0.0; x.ncols()];

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);
        let mut predictions = Array1::from_elem(n_samples, self.initial_prediction);

        for _ in 0..self.config.n_estimators {
            let residuals = y - &predictions;
            let tree = fit_round_tree(x, &residuals, &self.config, &mut rng)?;

            let update = tree.predict(x)?;
            predictions = predictions + update * self.config.learning_rate;

            accumulate_importances(&mut self.importances, &tree);
            self.trees.push(tree);
        }
        normalize(&mut self.importances);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(PipelineError::data(
                "gradient-boosting",
                "predict called before fit",
            ));
        }
        let mut predictions = Array1::from_elem(x.nrows(), self.initial_prediction);
        for tree in &self.trees {
            let update = tree.predict(x)?;
            predictions = predictions + update * self.config.learning_rate;
        }
        Ok(predictions)
    }

    fn feature_importances(&self) -> Option<&[f64]> {
        if self.importances.is_empty() {
            None
        } else {
            Some(&self.importances)
        }
    }
}

/// Gradient boosting binary classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    pub config: GradientBoostingConfig,
    trees: Vec<DecisionTree>,
    initial_log_odds: f64,
    importances: Vec<f64>,
}

impl GradientBoostingClassifier {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            initial_log_odds: 0.0,
            importances: Vec::new(),
        }
    }

    fn raw_scores(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let mut scores = Array1::from_elem(x.nrows(), self.initial_log_odds);
        for tree in &self.trees {
            let update = tree.predict(x)?;
            scores = scores + update * self.config.learning_rate;
        }
        Ok(scores)
    }

    /// Positive-class probability per row.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(PipelineError::data(
                "gradient-boosting",
                "predict called before fit",
            ));
        }
        Ok(self.raw_scores(x)?.mapv(sigmoid))
    }
}

impl Estimator for GradientBoostingClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples == 0 {
            return Err(PipelineError::data_insufficient(
                "gradient-boosting",
                "cannot fit on zero rows",
            ));
        }
        if y.iter().any(|&v| v != 0.0 && v != 1.0) {
            return Err(PipelineError::data(
                "gradient-boosting",
                "classifier labels must be 0 or 1",
            ));
        }

        let positive_rate = y.mean().unwrap_or(0.5).clamp(1e-6, 1.0 - 1e-6);
        self.initial_log_odds = (positive_rate / (1.0 - positive_rate)).ln();
        self.trees = Vec::with_capacity(self.config.n_estimators);
        self.importances = vec![0.0; x.ncols()];

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);
        let mut scores = Array1::from_elem(n_samples, self.initial_log_odds);

        for _ in 0..self.config.n_estimators {
            // negative gradient of log-loss
            let residuals = y - &scores.mapv(sigmoid);
            let tree = fit_round_tree(x, &residuals, &self.config, &mut rng)?;

            let update = tree.predict(x)?;
            scores = scores + update * self.config.learning_rate;

            accumulate_importances(&mut self.importances, &tree);
            self.trees.push(tree);
        }
        normalize(&mut self.importances);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    fn feature_importances(&self) -> Option<&[f64]> {
        if self.importances.is_empty() {
            None
        } else {
            Some(&self.importances)
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
