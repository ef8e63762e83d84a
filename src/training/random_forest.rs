//! Random forest classifier
//!
//! Bagged gini trees built in parallel, each seeded from a per-tree stream of
//! the forest's root seed. Constructors cover the three forest flavors the
//! ensemble uses: the standard sqrt-features forest, a bagging forest that
//! keeps all features, and extremely randomized trees without bootstrap.

use super::decision_tree::{DecisionTree, SplitRule};
use super::Estimator;
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Candidate-feature budget per split
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Square root of the feature count
    Sqrt,
    /// Fraction of the feature count
    Fraction(f64),
    /// Fixed number
    Fixed(usize),
    /// All features
    All,
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().round() as usize,
            MaxFeatures::Fraction(f) => (n_features as f64 * f).round() as usize,
            MaxFeatures::Fixed(k) => k,
            MaxFeatures::All => n_features,
        };
        k.clamp(1, n_features)
    }
}

/// Random forest classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub split_rule: SplitRule,
    pub seed: u64,
    trees: Vec<DecisionTree>,
    importances: Vec<f64>,
}

impl RandomForestClassifier {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            split_rule: SplitRule::Best,
            seed: 42,
            trees: Vec::new(),
            importances: Vec::new(),
        }
    }

    /// Bagging flavor: bootstrap rows but consider every feature at each
    /// split.
    pub fn bagging(n_estimators: usize) -> Self {
        let mut forest = Self::new(n_estimators);
        forest.max_features = MaxFeatures::All;
        forest
    }

    /// Extremely randomized trees: no bootstrap, random split thresholds.
    pub fn extra_trees(n_estimators: usize) -> Self {
        let mut forest = Self::new(n_estimators);
        forest.bootstrap = false;
        forest.split_rule = SplitRule::Random;
        forest
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn fit_one_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        tree_seed: u64,
    ) -> Result<DecisionTree> {
        let n_samples = x.nrows();
        let mut rng = ChaCha8Rng::seed_from_u64(tree_seed);

        let (x_fit, y_fit) = if self.bootstrap {
            let sample: Vec<usize> =
                (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
            let x_boot = x.select(ndarray::Axis(0), &sample);
            let y_boot = Array1::from_vec(sample.iter().map(|&i| y[i]).collect());
            (x_boot, y_boot)
        } else {
            (x.clone(), y.clone())
        };

        let mut tree = DecisionTree::new_classifier()
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_max_features(self.max_features.resolve(x.ncols()))
            .with_split_rule(self.split_rule)
            .with_seed(rng.gen());
        if let Some(depth) = self.max_depth {
            tree = tree.with_max_depth(depth);
        }
        tree.fit(&x_fit, &y_fit)?;
        Ok(tree)
    }
}

impl Estimator for RandomForestClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() == 0 {
            return Err(PipelineError::data_insufficient(
                "random-forest",
                "cannot fit on zero rows",
            ));
        }
        if self.n_estimators == 0 {
            return Err(PipelineError::data(
                "random-forest",
                "n_estimators must be positive",
            ));
        }

        // one independent seed per tree so parallel order never matters
        let mut seed_rng = ChaCha8Rng::seed_from_u64(self.seed);
        let tree_seeds: Vec<u64> = (0..self.n_estimators).map(|_| seed_rng.gen()).collect();

        self.trees = tree_seeds
            .par_iter()
            .map(|&seed| self.fit_one_tree(x, y, seed))
            .collect::<Result<Vec<_>>>()?;

        let n_features = x.ncols();
        let mut importances = vec![0.0; n_features];
        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                for (total, &v) in importances.iter_mut().zip(imp) {
                    *total += v;
                }
            }
        }
        let sum: f64 = importances.iter().sum();
        if sum > 0.0 {
            for v in &mut importances {
                *v /= sum;
            }
        }
        self.importances = importances;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(PipelineError::data(
                "random-forest",
                "predict called before fit",
            ));
        }

        let per_tree: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let predictions: Vec<f64> = (0..x.nrows())
            .map(|row| {
                let mut votes: HashMap<i64, usize> = HashMap::new();
                for tree_pred in &per_tree {
                    *votes.entry(tree_pred[row].round() as i64).or_insert(0) += 1;
                }
                votes
                    .into_iter()
                    .max_by_key(|&(label, count)| (count, std::cmp::Reverse(label)))
                    .map(|(label, _)| label as f64)
                    .unwrap_or(0.0)
            })
            .collect();
        Ok(Array1::from_vec(predictions))
    }

    fn feature_importances(&self) -> Option<&[f64]> {
        if self.importances.is_empty() {
            None
        } else {
            Some(&self.importances)
        }
    }
}
