//! K-fold cross-validation

use crate::error::{PipelineError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// A single train/validation split
#[derive(Debug, Clone)]
pub struct CvSplit {
    pub train_indices: Vec<usize>,
    pub validation_indices: Vec<usize>,
    pub fold: usize,
}

/// K-fold splitter with optional shuffling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KFold {
    pub n_splits: usize,
    pub shuffle: bool,
    pub seed: u64,
}

impl KFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: true,
            seed: 42,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Generate the folds for `n_samples` rows. Fold sizes differ by at most
    /// one; the remainder goes to the earliest folds.
    pub fn split(&self, n_samples: usize) -> Result<Vec<CvSplit>> {
        if self.n_splits < 2 {
            return Err(PipelineError::data_insufficient(
                "cross-validation",
                format!("need at least 2 folds, got {}", self.n_splits),
            ));
        }
        if n_samples < self.n_splits {
            return Err(PipelineError::data_insufficient(
                "cross-validation",
                format!(
                    "{} samples cannot fill {} folds",
                    n_samples, self.n_splits
                ),
            ));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if self.shuffle {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
            indices.shuffle(&mut rng);
        }

        let base = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut splits = Vec::with_capacity(self.n_splits);
        let mut offset = 0;
        for fold in 0..self.n_splits {
            let size = if fold < remainder { base + 1 } else { base };
            let validation_indices: Vec<usize> =
                indices[offset..offset + size].to_vec();
            let train_indices: Vec<usize> = indices[..offset]
                .iter()
                .chain(&indices[offset + size..])
                .copied()
                .collect();
            splits.push(CvSplit {
                train_indices,
                validation_indices,
                fold,
            });
            offset += size;
        }
        Ok(splits)
    }
}

/// Aggregate statistics over per-fold scores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvSummary {
    pub scores: Vec<f64>,
    pub mean: f64,
    pub std: f64,
}

impl CvSummary {
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n = scores.len() as f64;
        let mean = if n > 0.0 {
            scores.iter().sum::<f64>() / n
        } else {
            0.0
        };
        let std = if n > 1.0 {
            (scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        Self { scores, mean, std }
    }
}
