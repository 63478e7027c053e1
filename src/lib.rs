//! classlens - bytecode-level static analysis for JVM class files
//!
//! Parses compiled types into structural models, resolves the references
//! between them into a dependency graph, computes coupling, cohesion and
//! complexity metrics, runs quality rules and reduces everything to a
//! single score.
//!
//! ```no_run
//! use classlens::{analyze, extract, PrefixPolicy};
//!
//! # fn main() -> anyhow::Result<()> {
//! let bytes = std::fs::read("target/classes/com/acme/Order.class")?;
//! let model = extract(&bytes)?;
//! let result = analyze(vec![model], PrefixPolicy::default().with_include("com.acme."));
//! println!("{:.1} ({})", result.score.overall, result.score.grade);
//! # Ok(())
//! # }
//! ```

pub mod bytecode;
pub mod classfile;
pub mod classify;
pub mod config;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod resolver;
pub mod rules;
pub mod scoring;

pub use classfile::{extract, MalformedTypeError, TypeModel};
pub use error::{AnalysisError, AnalysisWarning};
pub use models::{Issue, IssueKind, IssueSummary, Location, Severity};
pub use pipeline::{
    analyze, extract_all, AnalysisContext, AnalysisResult, Analyzer, CancellationToken,
    ClassSource,
};
pub use resolver::{IncludePolicy, PrefixPolicy};
