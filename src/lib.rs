//! Lifeboat - passenger survival prediction
//!
//! A batch pipeline that engineers features from raw passenger manifests,
//! imputes missing ages with a gradient-boosted regressor, ranks features by
//! forest importance, and classifies survival with a five-member hard-voting
//! ensemble.
//!
//! # Modules
//! - [`data`] - Loading, validation, combination, matrix conversion
//! - [`features`] - The feature engineering sequence
//! - [`imputation`] - Model-based age imputation
//! - [`selection`] - Importance-based feature selection
//! - [`training`] - Tree estimators, k-fold CV, grid search
//! - [`ensemble`] - The hard-voting classifier
//! - [`pipeline`] - End-to-end orchestration
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod data;
pub mod ensemble;
pub mod error;
pub mod features;
pub mod imputation;
pub mod pipeline;
pub mod selection;
pub mod training;

pub use error::{PipelineError, Result};
