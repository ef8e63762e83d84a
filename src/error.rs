//! Error types for the survival-prediction pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type. Every variant names the pipeline stage that failed so a
/// batch run aborts with an actionable message instead of a partial output.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("[{stage}] expected column '{column}' is absent from the input")]
    MissingColumn { stage: String, column: String },

    #[error("[{stage}] schema mismatch: {detail}")]
    SchemaMismatch { stage: String, detail: String },

    #[error("[{stage}] insufficient data: {detail}")]
    DataInsufficient { stage: String, detail: String },

    #[error("[{stage}] unknown honorific '{title}' in record {record}")]
    UnknownTitle {
        stage: String,
        title: String,
        record: String,
    },

    #[error("[{stage}] data error: {detail}")]
    Data { stage: String, detail: String },

    #[error("invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn missing_column(stage: &str, column: &str) -> Self {
        Self::MissingColumn {
            stage: stage.to_string(),
            column: column.to_string(),
        }
    }

    pub fn schema_mismatch(stage: &str, detail: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            stage: stage.to_string(),
            detail: detail.into(),
        }
    }

    pub fn data_insufficient(stage: &str, detail: impl Into<String>) -> Self {
        Self::DataInsufficient {
            stage: stage.to_string(),
            detail: detail.into(),
        }
    }

    pub fn unknown_title(stage: &str, title: &str, record: impl Into<String>) -> Self {
        Self::UnknownTitle {
            stage: stage.to_string(),
            title: title.to_string(),
            record: record.into(),
        }
    }

    pub fn data(stage: &str, detail: impl Into<String>) -> Self {
        Self::Data {
            stage: stage.to_string(),
            detail: detail.into(),
        }
    }
}

impl From<polars::error::PolarsError> for PipelineError {
    fn from(err: polars::error::PolarsError) -> Self {
        PipelineError::Data {
            stage: "polars".to_string(),
            detail: err.to_string(),
        }
    }
}
