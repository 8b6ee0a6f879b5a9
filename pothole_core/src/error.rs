// pothole_core/src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced synchronously to the embedding application.
/// Everything else in the pipeline degrades instead of failing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("failed to spawn the synchronizer thread: {0}")]
    WorkerSpawn(String),
}

impl CoreError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        CoreError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

/// Why a single classifier variant could not produce a confidence.
/// The classifier chain treats every one of these as "try the next variant".
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("scorer returned a non-finite value ({0})")]
    NonFinite(f32),

    #[error("configuration carries no usable evidence")]
    NoEvidence,

    #[error("scoring model failed: {0}")]
    Model(String),
}

/// Failure to load a bundled artifact (classifier config or learned model).
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("artifact {path:?} is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },
}
