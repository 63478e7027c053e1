//! Deep inheritance rule
//!
//! Flags types whose depth of inheritance tree exceeds the threshold.

use super::base::{Rule, RuleConfig};
use crate::classfile::{TypeKind, TypeModel};
use crate::metrics::ClassMetrics;
use crate::models::{Issue, IssueKind, Location, Severity};

pub struct DeepInheritanceRule {
    config: RuleConfig,
    max_depth: usize,
    high_depth: usize,
}

impl DeepInheritanceRule {
    pub fn new() -> Self {
        Self::with_config(RuleConfig::new())
    }

    pub fn with_config(config: RuleConfig) -> Self {
        Self {
            max_depth: config
                .get_option("max_depth")
                .or_else(|| config.get_option("depth"))
                .unwrap_or(5),
            high_depth: config.get_option_or("high_depth", 8),
            config,
        }
    }
}

impl Default for DeepInheritanceRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for DeepInheritanceRule {
    fn name(&self) -> &'static str {
        "deep-inheritance"
    }

    fn description(&self) -> &'static str {
        "Detects deep inheritance hierarchies"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::DeepInheritance
    }

    fn check_class(&self, model: &TypeModel, m: &ClassMetrics) -> Vec<Issue> {
        if model.kind != TypeKind::Class || m.inheritance_depth <= self.max_depth {
            return vec![];
        }
        let severity = if m.inheritance_depth >= self.high_depth {
            Severity::High
        } else {
            Severity::Medium
        };
        vec![Issue::new(
            self.name(),
            self.kind(),
            severity,
            Location::of_type(&model.name),
            format!("Deep inheritance: {} (depth {})", model.simple_name(), m.inheritance_depth),
            format!(
                "{} sits {} levels deep in its inheritance tree (limit {}), so its \
                 behaviour is spread across many ancestors.",
                model.name, m.inheritance_depth, self.max_depth
            ),
            "Prefer composition over inheritance: collapse intermediate levels or \
             delegate to collaborators.",
        )]
    }

    fn config(&self) -> Option<&RuleConfig> {
        Some(&self.config)
    }
}
