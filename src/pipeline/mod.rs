//! Analysis pipeline
//!
//! Extraction and per-type work run on a rayon pool sized by the
//! [`AnalysisContext`]. Graph construction and rule evaluation each wait
//! for the previous stage to finish.

mod analyzer;
mod cancel;
mod context;
mod extract;

pub use analyzer::{analyze, AnalysisResult, Analyzer};
pub use cancel::CancellationToken;
pub use context::{AnalysisContext, ProgressCallback};
pub use extract::{extract_all, ClassSource, Extraction};
