//! Complex method rule
//!
//! Flags methods whose cyclomatic complexity exceeds the threshold.

use super::base::{Rule, RuleConfig};
use crate::classify::TypeRole;
use crate::metrics::{ClassMetrics, MethodMetrics};
use crate::models::{Issue, IssueKind, Location, Severity};

pub struct ComplexMethodRule {
    config: RuleConfig,
    max_complexity: u32,
    high_complexity: u32,
    critical_complexity: u32,
}

impl ComplexMethodRule {
    pub fn new() -> Self {
        Self::with_config(RuleConfig::new())
    }

    pub fn with_config(config: RuleConfig) -> Self {
        Self {
            max_complexity: config
                .get_option("max_complexity")
                .or_else(|| config.get_option("complexity"))
                .unwrap_or(10),
            high_complexity: config.get_option_or("high_complexity", 20),
            critical_complexity: config.get_option_or("critical_complexity", 50),
            config,
        }
    }

    fn calculate_severity(&self, complexity: u32) -> Severity {
        match complexity {
            c if c >= self.critical_complexity => Severity::Critical,
            c if c >= self.high_complexity => Severity::High,
            _ => Severity::Medium,
        }
    }
}

impl Default for ComplexMethodRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for ComplexMethodRule {
    fn name(&self) -> &'static str {
        "complex-method"
    }

    fn description(&self) -> &'static str {
        "Detects methods with high cyclomatic complexity"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::ComplexMethod
    }

    fn check_method(&self, method: &MethodMetrics, owner: &ClassMetrics) -> Option<Issue> {
        if owner.role == TypeRole::Test || method.complexity <= self.max_complexity {
            return None;
        }
        Some(Issue::new(
            self.name(),
            self.kind(),
            self.calculate_severity(method.complexity),
            Location::member(&method.type_name, format!("{}{}", method.name, method.descriptor)),
            format!("Complex method: {}", method.name),
            format!(
                "{} has cyclomatic complexity {} ({} decision points), above the limit of {}.",
                method.id, method.complexity, method.decision_points, self.max_complexity
            ),
            "Extract the branches into smaller, well-named methods or replace \
             conditional chains with polymorphism or lookup tables.",
        ))
    }

    fn config(&self) -> Option<&RuleConfig> {
        Some(&self.config)
    }
}
