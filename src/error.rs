//! Errors raised by the aggregation pipeline.

use std::path::{Path, PathBuf};

/// Failures surfaced by loading and fitting.
///
/// Rows with missing fields are not errors; the loader drops them and
/// reports the count on the [`Dataset`](crate::models::Dataset).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to load {}: {reason}", path.display())]
    DataLoad { path: PathBuf, reason: String },

    #[error("insufficient data for a linear fit: {valid} valid paired point(s), at least 2 required")]
    InsufficientData { valid: usize },

    #[error("paired sequences differ in length: {xs} x value(s) vs {ys} y value(s)")]
    LengthMismatch { xs: usize, ys: usize },

    #[error("cannot fit a line: every x value is identical")]
    DegenerateFit,
}

impl PipelineError {
    pub fn data_load(path: &Path, reason: impl Into<String>) -> Self {
        PipelineError::DataLoad {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
