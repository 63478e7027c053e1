//! Base rule trait and types
//!
//! This module defines the core abstractions for issue detection:
//! - `Rule` trait that all rules implement, with one hook per entity kind
//! - `RuleInput`, the read-only view of a finished metric pass
//! - `RuleResult` for capturing execution results
//! - `RuleConfig` for thresholds and severity overrides

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::classfile::TypeModel;
use crate::graph::{DependencyGraph, PackageMetrics};
use crate::metrics::{ClassMetrics, MethodMetrics};
use crate::models::{Issue, IssueKind, Severity};

/// Everything a rule may look at. Built once after the metric barrier.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    /// Analyzed types, sorted by name
    pub models: &'a [TypeModel],
    pub graph: &'a DependencyGraph,
    pub class_metrics: &'a BTreeMap<String, ClassMetrics>,
    pub method_metrics: &'a BTreeMap<String, MethodMetrics>,
    pub package_metrics: &'a [PackageMetrics],
    /// Type-level cycles in discovery order
    pub cycles: &'a [Vec<String>],
    /// Package-level cycles in discovery order
    pub package_cycles: &'a [Vec<String>],
}

/// Result from running a single rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule_name: String,
    pub issues: Vec<Issue>,
    /// Execution time in milliseconds
    pub duration_ms: u64,
    pub success: bool,
    /// Error message if the rule failed
    pub error: Option<String>,
}

impl RuleResult {
    /// Create a successful result
    pub fn success(rule_name: String, issues: Vec<Issue>, duration_ms: u64) -> Self {
        Self {
            rule_name,
            issues,
            duration_ms,
            success: true,
            error: None,
        }
    }

    /// Create a failed result
    pub fn failure(rule_name: String, error: String, duration_ms: u64) -> Self {
        Self {
            rule_name,
            issues: Vec::new(),
            duration_ms,
            success: false,
            error: Some(error),
        }
    }
}

/// Configuration options for rules
#[derive(Debug, Clone, Default)]
pub struct RuleConfig {
    /// Replaces the severity the rule would assign
    pub severity_override: Option<Severity>,
    /// Maximum issues to keep from this rule
    pub max_issues: Option<usize>,
    /// Rule-specific thresholds and options
    pub options: HashMap<String, serde_json::Value>,
}

impl RuleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity_override = Some(severity);
        self
    }

    pub fn with_max_issues(mut self, max: usize) -> Self {
        self.max_issues = Some(max);
        self
    }

    /// Set a custom option
    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Get a typed option value
    pub fn get_option<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.options
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Get an option with a default value
    pub fn get_option_or<T: serde::de::DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get_option(key).unwrap_or(default)
    }
}

/// Trait for all issue rules
///
/// A rule implements whichever hooks apply to it; the rest default to
/// reporting nothing. Hooks must be pure: no rule sees or suppresses
/// another rule's output.
///
/// # Example Implementation
///
/// ```ignore
/// pub struct WideTypeRule {
///     config: RuleConfig,
/// }
///
/// impl Rule for WideTypeRule {
///     fn name(&self) -> &'static str {
///         "wide-type"
///     }
///
///     fn description(&self) -> &'static str {
///         "Types with too many fields"
///     }
///
///     fn kind(&self) -> IssueKind {
///         IssueKind::GodClass
///     }
///
///     fn check_class(&self, model: &TypeModel, metrics: &ClassMetrics) -> Vec<Issue> {
///         vec![]
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Kebab-case identifier, also the `[rules.<name>]` config key
    fn name(&self) -> &'static str;

    /// Human-readable description of what this rule finds
    fn description(&self) -> &'static str;

    /// Kind of the issues this rule produces
    fn kind(&self) -> IssueKind;

    fn check_class(&self, _model: &TypeModel, _metrics: &ClassMetrics) -> Vec<Issue> {
        Vec::new()
    }

    /// `owner` is the metric record of the declaring type
    fn check_method(&self, _method: &MethodMetrics, _owner: &ClassMetrics) -> Option<Issue> {
        None
    }

    fn check_package(&self, _package: &PackageMetrics) -> Option<Issue> {
        None
    }

    fn check_graph(&self, _input: &RuleInput<'_>) -> Vec<Issue> {
        Vec::new()
    }

    /// Get the configuration for this rule
    fn config(&self) -> Option<&RuleConfig> {
        None
    }

    /// Run every hook over the input
    fn evaluate(&self, input: &RuleInput<'_>) -> Vec<Issue> {
        let mut issues = Vec::new();
        for model in input.models {
            if let Some(metrics) = input.class_metrics.get(&model.name) {
                issues.extend(self.check_class(model, metrics));
            }
        }
        for method in input.method_metrics.values() {
            if let Some(owner) = input.class_metrics.get(&method.type_name) {
                issues.extend(self.check_method(method, owner));
            }
        }
        for package in input.package_metrics {
            issues.extend(self.check_package(package));
        }
        issues.extend(self.check_graph(input));
        issues
    }
}

/// Summary statistics from running all rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSummary {
    pub rules_run: usize,
    pub rules_succeeded: usize,
    pub rules_failed: usize,
    pub total_issues: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub total_duration_ms: u64,
}

impl RuleSummary {
    /// Update summary with a rule result
    pub fn add_result(&mut self, result: &RuleResult) {
        self.rules_run += 1;
        self.total_duration_ms += result.duration_ms;

        if result.success {
            self.rules_succeeded += 1;
            self.total_issues += result.issues.len();

            for issue in &result.issues {
                *self.by_severity.entry(issue.severity).or_insert(0) += 1;
            }
        } else {
            self.rules_failed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;

    #[test]
    fn test_rule_config() {
        let config = RuleConfig::new()
            .with_max_issues(100)
            .with_severity(Severity::High)
            .with_option("threshold", serde_json::json!(10));

        assert_eq!(config.max_issues, Some(100));
        assert_eq!(config.severity_override, Some(Severity::High));
        assert_eq!(config.get_option::<i32>("threshold"), Some(10));
        assert_eq!(config.get_option_or("missing", 5), 5);
        // Wrong type falls back to default
        assert_eq!(config.get_option_or::<bool>("threshold", true), true);
    }

    #[test]
    fn test_rule_result_success() {
        let result = RuleResult::success("god-class".to_string(), vec![], 100);
        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.duration_ms, 100);
    }

    #[test]
    fn test_rule_result_failure() {
        let result = RuleResult::failure("god-class".to_string(), "oops".to_string(), 50);
        assert!(!result.success);
        assert_eq!(result.error, Some("oops".to_string()));
    }

    #[test]
    fn test_rule_summary() {
        let mut summary = RuleSummary::default();
        let issue = Issue::new(
            "r1",
            IssueKind::GodClass,
            Severity::High,
            Location::of_type("a.B"),
            "t",
            "d",
            "r",
        );

        summary.add_result(&RuleResult::success("r1".to_string(), vec![issue], 100));
        summary.add_result(&RuleResult::failure("r2".to_string(), "err".to_string(), 50));

        assert_eq!(summary.rules_run, 2);
        assert_eq!(summary.rules_succeeded, 1);
        assert_eq!(summary.rules_failed, 1);
        assert_eq!(summary.total_issues, 1);
        assert_eq!(summary.by_severity.get(&Severity::High), Some(&1));
        assert_eq!(summary.total_duration_ms, 150);
    }
}
