//! AdaBoost binary classifier
//!
//! Weighted decision stumps combined with SAMME-style round weights. Labels
//! are mapped to {-1, +1} internally; the public surface speaks 0/1.

use super::Estimator;
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// One-feature, one-threshold weak learner
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Stump {
    feature: usize,
    threshold: f64,
    /// +1.0 predicts the positive class on the right side of the threshold,
    /// -1.0 flips the sides.
    polarity: f64,
}

impl Stump {
    fn predict_row(&self, row: &[f64]) -> f64 {
        if row[self.feature] > self.threshold {
            self.polarity
        } else {
            -self.polarity
        }
    }
}

/// AdaBoost classifier over decision stumps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaBoostClassifier {
    pub n_estimators: usize,
    pub learning_rate: f64,
    stumps: Vec<Stump>,
    alphas: Vec<f64>,
    importances: Vec<f64>,
}

impl AdaBoostClassifier {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators,
            learning_rate: 1.0,
            stumps: Vec::new(),
            alphas: Vec::new(),
            importances: Vec::new(),
        }
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Find the stump minimizing weighted error. Scans thresholds between
    /// distinct sorted values per feature, with weight prefix sums so each
    /// feature costs one sort plus one pass.
    fn fit_stump(x: &Array2<f64>, y_pm: &Array1<f64>, weights: &Array1<f64>) -> (Stump, f64) {
        let n = x.nrows();
        let total_positive: f64 = (0..n)
            .filter(|&i| y_pm[i] > 0.0)
            .map(|i| weights[i])
            .sum();
        let total: f64 = weights.sum();

        let mut best = Stump {
            feature: 0,
            threshold: f64::NEG_INFINITY,
            polarity: 1.0,
        };
        // threshold at -inf with polarity +1 predicts everything positive
        let mut best_error = total - total_positive;

        for feature in 0..x.ncols() {
            let mut order: Vec<usize> = (0..n).collect();
            order.sort_by(|&a, &b| {
                x[[a, feature]]
                    .partial_cmp(&x[[b, feature]])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            // weight of positive labels at or left of the scan point
            let mut left_positive = 0.0;
            let mut left_total = 0.0;

            for k in 0..n.saturating_sub(1) {
                let i = order[k];
                left_total += weights[i];
                if y_pm[i] > 0.0 {
                    left_positive += weights[i];
                }

                let here = x[[i, feature]];
                let next = x[[order[k + 1], feature]];
                if next <= here {
                    continue;
                }
                let threshold = (here + next) / 2.0;

                // polarity +1: left predicted -1, right predicted +1
                let error_pos = left_positive + (total - left_total)
                    - (total_positive - left_positive);
                // polarity -1 mirrors it
                let error_neg = total - error_pos;

                if error_pos < best_error {
                    best_error = error_pos;
                    best = Stump {
                        feature,
                        threshold,
                        polarity: 1.0,
                    };
                }
                if error_neg < best_error {
                    best_error = error_neg;
                    best = Stump {
                        feature,
                        threshold,
                        polarity: -1.0,
                    };
                }
            }
        }
        (best, best_error / total)
    }

    fn decision_scores(&self, x: &Array2<f64>) -> Array1<f64> {
        let mut scores = Array1::zeros(x.nrows());
        for (stump, &alpha) in self.stumps.iter().zip(&self.alphas) {
            for (i, row) in x.rows().into_iter().enumerate() {
                let row: Vec<f64> = row.to_vec();
                scores[i] += alpha * stump.predict_row(&row);
            }
        }
        scores
    }
}

impl Estimator for AdaBoostClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n = x.nrows();
        if n == 0 {
            return Err(PipelineError::data_insufficient(
                "adaboost",
                "cannot fit on zero rows",
            ));
        }
        if y.iter().any(|&v| v != 0.0 && v != 1.0) {
            return Err(PipelineError::data(
                "adaboost",
                "classifier labels must be 0 or 1",
            ));
        }

        let y_pm = y.mapv(|v| if v > 0.5 { 1.0 } else { -1.0 });
        let mut weights = Array1::from_elem(n, 1.0 / n as f64);

        self.stumps = Vec::new();
        self.alphas = Vec::new();
        self.importances = vec![0.0; x.ncols()];

        for _ in 0..self.n_estimators {
            let (stump, error) = Self::fit_stump(x, &y_pm, &weights);
            let error = error.clamp(1e-10, 1.0 - 1e-10);
            if error >= 0.5 {
                // no better than chance, boosting has converged
                break;
            }

            let alpha = 0.5 * self.learning_rate * ((1.0 - error) / error).ln();
            self.importances[stump.feature] += alpha;

            let mut total = 0.0;
            for i in 0..n {
                let row: Vec<f64> = x.row(i).to_vec();
                let h = stump.predict_row(&row);
                weights[i] *= (-alpha * y_pm[i] * h).exp();
                total += weights[i];
            }
            weights.mapv_inplace(|w| w / total);

            self.stumps.push(stump);
            self.alphas.push(alpha);
        }

        if self.stumps.is_empty() {
            return Err(PipelineError::data_insufficient(
                "adaboost",
                "no stump improved on chance",
            ));
        }

        let sum: f64 = self.importances.iter().sum();
        if sum > 0.0 {
            for v in &mut self.importances {
                *v /= sum;
            }
        }
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.stumps.is_empty() {
            return Err(PipelineError::data("adaboost", "predict called before fit"));
        }
        let scores = self.decision_scores(x);
        Ok(scores.mapv(|s| if s > 0.0 { 1.0 } else { 0.0 }))
    }

    fn feature_importances(&self) -> Option<&[f64]> {
        if self.importances.is_empty() {
            None
        } else {
            Some(&self.importances)
        }
    }
}
