//! Run-level errors and warnings

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Conditions that stop an analysis run
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("analysis was cancelled")]
    Cancelled,

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Degraded-but-continuing conditions recorded on the result
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisWarning {
    /// An in-scope reference target is not among the analyzed types
    UnresolvedReference { source: String, target: String },
    /// A method body could only be partially decoded
    InstructionDecode { method: String, message: String },
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisWarning::UnresolvedReference { source, target } => {
                write!(f, "unresolved reference from {} to {}", source, target)
            }
            AnalysisWarning::InstructionDecode { method, message } => {
                write!(f, "partial decode of {}: {}", method, message)
            }
        }
    }
}
