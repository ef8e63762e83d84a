//! Ensemble methods
//!
//! The final classifier is a hard-voting ensemble of five grid-searched
//! tree-based members: a random forest, gradient boosting, AdaBoost, a
//! bagging forest, and extremely randomized trees.

mod voting;

pub use voting::VotingClassifier;

use crate::training::{
    AdaBoostClassifier, GradientBoostingClassifier, GradientBoostingConfig, GridSearch,
    MaxFeatures, RandomForestClassifier, Scoring,
};

/// Hyperparameter grids for the five ensemble members.
#[derive(Debug, Clone)]
pub struct EnsembleGrids {
    pub forest_trees: Vec<usize>,
    pub forest_max_features: Vec<usize>,
    pub boosting_trees: Vec<usize>,
    pub boosting_learning_rates: Vec<f64>,
    pub boosting_depths: Vec<usize>,
    pub adaboost_rounds: Vec<usize>,
    pub adaboost_learning_rates: Vec<f64>,
    pub bagging_trees: Vec<usize>,
    pub extra_trees: Vec<usize>,
    pub extra_tree_depths: Vec<usize>,
}

impl Default for EnsembleGrids {
    fn default() -> Self {
        Self {
            forest_trees: vec![100, 500, 1000],
            forest_max_features: vec![2, 5],
            boosting_trees: vec![100, 500, 1000],
            boosting_learning_rates: vec![0.1, 0.15],
            boosting_depths: vec![3, 4],
            adaboost_rounds: vec![50, 100, 500],
            adaboost_learning_rates: vec![1.0, 1.2],
            bagging_trees: vec![100, 500],
            extra_trees: vec![100, 500],
            extra_tree_depths: vec![5, 10],
        }
    }
}

impl EnsembleGrids {
    /// Small grids for quick runs and tests.
    pub fn compact() -> Self {
        Self {
            forest_trees: vec![10],
            forest_max_features: vec![2],
            boosting_trees: vec![20],
            boosting_learning_rates: vec![0.1],
            boosting_depths: vec![3],
            adaboost_rounds: vec![10],
            adaboost_learning_rates: vec![1.0],
            bagging_trees: vec![10],
            extra_trees: vec![10],
            extra_tree_depths: vec![5],
        }
    }
}

/// Assemble the five-member hard-voting classifier. Each member carries its
/// own grid search; fitting the ensemble tunes and refits every member on
/// the same training matrix.
pub fn survival_ensemble(grids: &EnsembleGrids, cv_folds: usize, seed: u64) -> VotingClassifier {
    let mut forest_candidates = Vec::new();
    for &n in &grids.forest_trees {
        for &k in &grids.forest_max_features {
            let mut forest = RandomForestClassifier::new(n).with_seed(seed);
            forest.max_features = MaxFeatures::Fixed(k);
            forest_candidates.push(forest);
        }
    }

    let mut boosting_candidates = Vec::new();
    for &n in &grids.boosting_trees {
        for &lr in &grids.boosting_learning_rates {
            for &depth in &grids.boosting_depths {
                let config = GradientBoostingConfig::default()
                    .with_n_estimators(n)
                    .with_learning_rate(lr)
                    .with_max_depth(depth)
                    .with_seed(seed);
                boosting_candidates.push(GradientBoostingClassifier::new(config));
            }
        }
    }

    let mut adaboost_candidates = Vec::new();
    for &n in &grids.adaboost_rounds {
        for &lr in &grids.adaboost_learning_rates {
            adaboost_candidates.push(AdaBoostClassifier::new(n).with_learning_rate(lr));
        }
    }

    let bagging_candidates: Vec<RandomForestClassifier> = grids
        .bagging_trees
        .iter()
        .map(|&n| RandomForestClassifier::bagging(n).with_seed(seed))
        .collect();

    let mut extra_candidates = Vec::new();
    for &n in &grids.extra_trees {
        for &depth in &grids.extra_tree_depths {
            extra_candidates.push(
                RandomForestClassifier::extra_trees(n)
                    .with_max_depth(depth)
                    .with_seed(seed),
            );
        }
    }

    VotingClassifier::new()
        .add_member(
            "random_forest",
            Box::new(GridSearch::new(forest_candidates, Scoring::Accuracy, cv_folds).with_seed(seed)),
        )
        .add_member(
            "gradient_boosting",
            Box::new(
                GridSearch::new(boosting_candidates, Scoring::Accuracy, cv_folds).with_seed(seed),
            ),
        )
        .add_member(
            "adaboost",
            Box::new(
                GridSearch::new(adaboost_candidates, Scoring::Accuracy, cv_folds).with_seed(seed),
            ),
        )
        .add_member(
            "bagging",
            Box::new(
                GridSearch::new(bagging_candidates, Scoring::Accuracy, cv_folds).with_seed(seed),
            ),
        )
        .add_member(
            "extra_trees",
            Box::new(GridSearch::new(extra_candidates, Scoring::Accuracy, cv_folds).with_seed(seed)),
        )
}
