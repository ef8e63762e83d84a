//! Model training module
//!
//! Tree-based estimators behind one object-safe [`Estimator`] trait, plus
//! the k-fold splitter and grid search that tune them.

pub mod adaboost;
pub mod cross_validation;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod grid_search;
pub mod random_forest;

pub use adaboost::AdaBoostClassifier;
pub use cross_validation::{CvSplit, CvSummary, KFold};
pub use decision_tree::{Criterion, DecisionTree, SplitRule};
pub use gradient_boosting::{
    GradientBoostingClassifier, GradientBoostingConfig, GradientBoostingRegressor,
};
pub use grid_search::{GridSearch, Scoring};
pub use random_forest::{MaxFeatures, RandomForestClassifier};

use crate::error::Result;
use ndarray::{Array1, Array2};

/// Common fit/predict surface for every model in the pipeline. Object safe
/// so the voting ensemble can hold a heterogeneous member list.
pub trait Estimator: Send + Sync {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Per-feature importances when the model tracks them.
    fn feature_importances(&self) -> Option<&[f64]> {
        None
    }
}
