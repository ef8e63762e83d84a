//! Hard-voting classifier ensemble

use crate::error::{PipelineError, Result};
use crate::training::Estimator;
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Majority-vote ensemble over named member models. Each member is fitted
/// independently on the same data; predictions are the per-row mode of the
/// member labels, ties breaking toward the smaller label.
pub struct VotingClassifier {
    members: Vec<(String, Box<dyn Estimator>)>,
}

impl VotingClassifier {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    pub fn add_member(mut self, name: impl Into<String>, model: Box<dyn Estimator>) -> Self {
        self.members.push((name.into(), model));
        self
    }

    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Majority vote over one prediction vector per member.
    pub fn vote(predictions: &[Array1<f64>], n_samples: usize) -> Result<Array1<f64>> {
        if predictions.is_empty() {
            return Err(PipelineError::data(
                "voting-ensemble",
                "no member predictions to vote over",
            ));
        }
        for pred in predictions {
            if pred.len() != n_samples {
                return Err(PipelineError::Shape {
                    expected: format!("{n_samples} predictions"),
                    actual: format!("{} predictions", pred.len()),
                });
            }
        }

        let voted: Vec<f64> = (0..n_samples)
            .map(|row| {
                let mut counts: HashMap<i64, usize> = HashMap::new();
                for pred in predictions {
                    *counts.entry(pred[row].round() as i64).or_insert(0) += 1;
                }
                counts
                    .into_iter()
                    .max_by_key(|&(label, count)| (count, std::cmp::Reverse(label)))
                    .map(|(label, _)| label as f64)
                    .unwrap_or(0.0)
            })
            .collect();
        Ok(Array1::from_vec(voted))
    }
}

impl Default for VotingClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Estimator for VotingClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if self.members.is_empty() {
            return Err(PipelineError::data(
                "voting-ensemble",
                "ensemble has no members",
            ));
        }
        for (name, model) in &mut self.members {
            tracing::debug!(member = %name, "fitting ensemble member");
            model.fit(x, y)?;
        }
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let predictions: Vec<Array1<f64>> = self
            .members
            .iter()
            .map(|(_, model)| model.predict(x))
            .collect::<Result<Vec<_>>>()?;
        Self::vote(&predictions, x.nrows())
    }
}
