//! CART decision tree
//!
//! The building block behind the forest and boosting estimators. Supports
//! gini impurity for classification and squared error for regression, plus a
//! random-threshold split rule for extremely randomized trees.

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Impurity criterion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Criterion {
    /// Gini impurity (classification)
    Gini,
    /// Squared error (regression)
    Mse,
}

/// How split thresholds are chosen at each node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SplitRule {
    /// Exhaustive best threshold per candidate feature
    Best,
    /// One uniformly random threshold per candidate feature
    Random,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Decision tree model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub criterion: Criterion,
    pub split_rule: SplitRule,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Number of candidate features per node; `None` means all
    pub max_features: Option<usize>,
    pub seed: u64,
    root: Option<Node>,
    n_features: usize,
    importances: Vec<f64>,
}

impl DecisionTree {
    pub fn new_classifier() -> Self {
        Self::new(Criterion::Gini)
    }

    pub fn new_regressor() -> Self {
        Self::new(Criterion::Mse)
    }

    fn new(criterion: Criterion) -> Self {
        Self {
            criterion,
            split_rule: SplitRule::Best,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
            root: None,
            n_features: 0,
            importances: Vec::new(),
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn with_split_rule(mut self, rule: SplitRule) -> Self {
        self.split_rule = rule;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fit the tree.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(PipelineError::Shape {
                expected: format!("{n_samples} labels"),
                actual: format!("{} labels", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(PipelineError::data_insufficient(
                "decision-tree",
                "cannot fit on zero rows",
            ));
        }

        self.n_features = x.ncols();
        self.importances = vec![0.0; self.n_features];

        let indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let root = self.build(x, y, &indices, 0, &mut rng);
        self.root = Some(root);

        let total: f64 = self.importances.iter().sum();
        if total > 0.0 {
            for imp in &mut self.importances {
                *imp /= total;
            }
        }
        Ok(())
    }

    /// Predict one value per row.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| PipelineError::data("decision-tree", "predict called before fit"))?;

        let predictions: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| {
                let mut node = root;
                loop {
                    match node {
                        Node::Leaf { value } => return *value,
                        Node::Split {
                            feature,
                            threshold,
                            left,
                            right,
                        } => {
                            node = if row[*feature] <= *threshold { left } else { right };
                        }
                    }
                }
            })
            .collect();
        Ok(Array1::from_vec(predictions))
    }

    /// Normalized impurity-decrease importances, available after fit.
    pub fn feature_importances(&self) -> Option<&[f64]> {
        if self.importances.is_empty() {
            None
        } else {
            Some(&self.importances)
        }
    }

    fn build(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> Node {
        let node_impurity = self.impurity(y, indices);
        let leaf = Node::Leaf {
            value: self.leaf_value(y, indices),
        };

        if indices.len() < self.min_samples_split
            || node_impurity <= f64::EPSILON
            || self.max_depth.is_some_and(|d| depth >= d)
        {
            return leaf;
        }

        let Some((feature, threshold, decrease)) =
            self.find_split(x, y, indices, node_impurity, rng)
        else {
            return leaf;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| x[[i, feature]] <= threshold);

        if left_idx.len() < self.min_samples_leaf || right_idx.len() < self.min_samples_leaf {
            return leaf;
        }

        // weight the decrease by the node's share of the training set
        self.importances[feature] += decrease * indices.len() as f64;

        let left = self.build(x, y, &left_idx, depth + 1, rng);
        let right = self.build(x, y, &right_idx, depth + 1, rng);
        Node::Split {
            feature,
            threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn candidate_features(&self, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let mut features: Vec<usize> = (0..self.n_features).collect();
        if let Some(k) = self.max_features {
            if k < self.n_features {
                features.shuffle(rng);
                features.truncate(k.max(1));
                features.sort_unstable();
            }
        }
        features
    }

    fn find_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        node_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64, f64)> {
        let mut best: Option<(usize, f64, f64)> = None;

        for feature in self.candidate_features(rng) {
            let candidate = match self.split_rule {
                SplitRule::Best => self.best_threshold(x, y, indices, feature, node_impurity),
                SplitRule::Random => {
                    self.random_threshold(x, y, indices, feature, node_impurity, rng)
                }
            };
            if let Some((threshold, decrease)) = candidate {
                if best.map_or(true, |(_, _, d)| decrease > d) {
                    best = Some((feature, threshold, decrease));
                }
            }
        }

        best.filter(|&(_, _, d)| d > 0.0)
    }

    fn best_threshold(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        feature: usize,
        node_impurity: f64,
    ) -> Option<(f64, f64)> {
        let n = indices.len();
        let mut order: Vec<usize> = indices.to_vec();
        order.sort_by(|&a, &b| {
            x[[a, feature]]
                .partial_cmp(&x[[b, feature]])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut best: Option<(f64, f64)> = None;
        match self.criterion {
            Criterion::Mse => {
                let total_sum: f64 = order.iter().map(|&i| y[i]).sum();
                let total_sq: f64 = order.iter().map(|&i| y[i] * y[i]).sum();
                let mut left_sum = 0.0;
                let mut left_sq = 0.0;

                for split in 1..n {
                    let i = order[split - 1];
                    left_sum += y[i];
                    left_sq += y[i] * y[i];

                    let prev = x[[i, feature]];
                    let next = x[[order[split], feature]];
                    if next <= prev {
                        continue;
                    }

                    let nl = split as f64;
                    let nr = (n - split) as f64;
                    let imp_l = left_sq / nl - (left_sum / nl).powi(2);
                    let imp_r =
                        (total_sq - left_sq) / nr - ((total_sum - left_sum) / nr).powi(2);
                    let decrease = node_impurity - (nl * imp_l + nr * imp_r) / n as f64;

                    if best.map_or(true, |(_, d)| decrease > d) {
                        best = Some(((prev + next) / 2.0, decrease));
                    }
                }
            }
            Criterion::Gini => {
                let mut right_counts: HashMap<i64, usize> = HashMap::new();
                for &i in &order {
                    *right_counts.entry(y[i].round() as i64).or_insert(0) += 1;
                }
                let mut left_counts: HashMap<i64, usize> = HashMap::new();

                for split in 1..n {
                    let i = order[split - 1];
                    let label = y[i].round() as i64;
                    *left_counts.entry(label).or_insert(0) += 1;
                    if let Some(c) = right_counts.get_mut(&label) {
                        *c -= 1;
                    }

                    let prev = x[[i, feature]];
                    let next = x[[order[split], feature]];
                    if next <= prev {
                        continue;
                    }

                    let nl = split as f64;
                    let nr = (n - split) as f64;
                    let imp_l = gini(&left_counts, nl);
                    let imp_r = gini(&right_counts, nr);
                    let decrease = node_impurity - (nl * imp_l + nr * imp_r) / n as f64;

                    if best.map_or(true, |(_, d)| decrease > d) {
                        best = Some(((prev + next) / 2.0, decrease));
                    }
                }
            }
        }
        best
    }

    fn random_threshold(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        feature: usize,
        node_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<(f64, f64)> {
        let min = indices
            .iter()
            .map(|&i| x[[i, feature]])
            .fold(f64::INFINITY, f64::min);
        let max = indices
            .iter()
            .map(|&i| x[[i, feature]])
            .fold(f64::NEG_INFINITY, f64::max);
        if max <= min {
            return None;
        }

        let threshold = rng.gen_range(min..max);
        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| x[[i, feature]] <= threshold);
        if left.is_empty() || right.is_empty() {
            return None;
        }

        let n = indices.len() as f64;
        let imp_l = self.impurity(y, &left);
        let imp_r = self.impurity(y, &right);
        let decrease =
            node_impurity - (left.len() as f64 * imp_l + right.len() as f64 * imp_r) / n;
        Some((threshold, decrease))
    }

    fn impurity(&self, y: &Array1<f64>, indices: &[usize]) -> f64 {
        let n = indices.len() as f64;
        if n == 0.0 {
            return 0.0;
        }
        match self.criterion {
            Criterion::Mse => {
                let mean: f64 = indices.iter().map(|&i| y[i]).sum::<f64>() / n;
                indices.iter().map(|&i| (y[i] - mean).powi(2)).sum::<f64>() / n
            }
            Criterion::Gini => {
                let mut counts: HashMap<i64, usize> = HashMap::new();
                for &i in indices {
                    *counts.entry(y[i].round() as i64).or_insert(0) += 1;
                }
                gini(&counts, n)
            }
        }
    }

    fn leaf_value(&self, y: &Array1<f64>, indices: &[usize]) -> f64 {
        match self.criterion {
            Criterion::Mse => indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64,
            Criterion::Gini => {
                let mut counts: HashMap<i64, usize> = HashMap::new();
                for &i in indices {
                    *counts.entry(y[i].round() as i64).or_insert(0) += 1;
                }
                counts
                    .into_iter()
                    .max_by_key(|&(label, count)| (count, std::cmp::Reverse(label)))
                    .map(|(label, _)| label as f64)
                    .unwrap_or(0.0)
            }
        }
    }
}

fn gini(counts: &HashMap<i64, usize>, n: f64) -> f64 {
    if n == 0.0 {
        return 0.0;
    }
    let sum_sq: f64 = counts
        .values()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum();
    1.0 - sum_sq
}
