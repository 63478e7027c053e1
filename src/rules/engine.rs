//! Rule execution engine with parallel support
//!
//! The RuleEngine runs every registered rule against a finished metric pass:
//! - Rules run in parallel on a rayon pool, one unit of work per rule
//! - A panicking rule becomes a failed `RuleResult`; the others still run
//! - Issues are concatenated in registration order, then sorted
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  RuleEngine                  │
//! ├──────────────────────────────────────────────┤
//! │  1. Register rules (ordered, open list)      │
//! │  2. Evaluate each rule in parallel (rayon)   │
//! │  3. Apply per-rule severity / issue limits   │
//! │  4. Concatenate and sort issues              │
//! └──────────────────────────────────────────────┘
//! ```

use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::base::{Rule, RuleInput, RuleResult, RuleSummary};
use crate::error::AnalysisError;
use crate::models::{sort_issues, Issue};
use crate::pipeline::CancellationToken;

/// Everything produced by one engine run
#[derive(Debug, Clone, Default)]
pub struct RuleOutcome {
    /// All issues, sorted by severity then location
    pub issues: Vec<Issue>,
    /// One result per rule, in registration order
    pub results: Vec<RuleResult>,
    pub summary: RuleSummary,
}

/// Orchestrates issue detection across all registered rules
pub struct RuleEngine {
    rules: Vec<Arc<dyn Rule>>,
    /// Number of worker threads for parallel execution
    workers: usize,
}

/// Resolve a worker count: 0 means auto, capped at 16
pub(crate) fn effective_workers(workers: usize) -> usize {
    if workers == 0 {
        std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4)
            .min(16)
    } else {
        workers
    }
}

impl RuleEngine {
    /// Create a new rule engine
    ///
    /// # Arguments
    /// * `workers` - Number of worker threads (0 = auto-detect)
    pub fn new(workers: usize) -> Self {
        Self {
            rules: Vec::new(),
            workers: effective_workers(workers),
        }
    }

    /// Register a rule
    pub fn register(&mut self, rule: Arc<dyn Rule>) {
        debug!("Registering rule: {}", rule.name());
        self.rules.push(rule);
    }

    /// Register multiple rules at once
    pub fn register_all(&mut self, rules: impl IntoIterator<Item = Arc<dyn Rule>>) {
        for rule in rules {
            self.register(rule);
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run all rules and collect issues
    ///
    /// The token is checked before each rule starts.
    pub fn run(
        &self,
        input: &RuleInput<'_>,
        cancel: &CancellationToken,
    ) -> Result<RuleOutcome, AnalysisError> {
        let start = Instant::now();
        info!(
            "Starting rule evaluation with {} rules on {} workers",
            self.rules.len(),
            self.workers
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;

        let results: Result<Vec<RuleResult>, AnalysisError> = pool.install(|| {
            self.rules
                .par_iter()
                .map(|rule| {
                    cancel.check()?;
                    Ok(self.run_single_rule(rule, input))
                })
                .collect()
        });
        let results = results?;

        let mut issues = Vec::new();
        let mut summary = RuleSummary::default();
        for result in &results {
            summary.add_result(result);
            if result.success {
                issues.extend(result.issues.iter().cloned());
            } else if let Some(err) = &result.error {
                warn!("Rule {} failed: {}", result.rule_name, err);
            }
        }
        sort_issues(&mut issues);

        summary.total_duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Rule evaluation complete: {} issues from {}/{} rules in {:?}",
            issues.len(),
            summary.rules_succeeded,
            summary.rules_run,
            start.elapsed()
        );

        Ok(RuleOutcome {
            issues,
            results,
            summary,
        })
    }

    /// Run a single rule with error handling and timing
    fn run_single_rule(&self, rule: &Arc<dyn Rule>, input: &RuleInput<'_>) -> RuleResult {
        let name = rule.name().to_string();
        let start = Instant::now();

        debug!("Running rule: {}", name);

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| rule.evaluate(input)));
        let duration = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(mut issues) => {
                if let Some(config) = rule.config() {
                    if let Some(severity) = config.severity_override {
                        for issue in &mut issues {
                            issue.severity = severity;
                        }
                    }
                    if let Some(max) = config.max_issues {
                        if issues.len() > max {
                            sort_issues(&mut issues);
                            issues.truncate(max);
                        }
                    }
                }
                debug!("Rule {} found {} issues in {}ms", name, issues.len(), duration);
                RuleResult::success(name, issues, duration)
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                error!("Rule {} panicked: {}", name, panic_msg);
                RuleResult::failure(name, format!("Panic: {}", panic_msg), duration)
            }
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Builder for RuleEngine with fluent API
#[derive(Default)]
pub struct RuleEngineBuilder {
    workers: usize,
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of worker threads
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Add a rule
    pub fn rule(mut self, rule: Arc<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Add multiple rules
    pub fn rules(mut self, rules: impl IntoIterator<Item = Arc<dyn Rule>>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn build(self) -> RuleEngine {
        let mut engine = RuleEngine::new(self.workers);
        engine.register_all(self.rules);
        engine
    }
}
