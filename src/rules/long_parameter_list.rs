//! Long parameter list rule
//!
//! Methods taking many parameters are hard to call correctly and often
//! hide a missing parameter object.

use super::base::{Rule, RuleConfig};
use crate::metrics::{ClassMetrics, MethodMetrics};
use crate::models::{Issue, IssueKind, Location, Severity};

/// Thresholds for long parameter list detection
#[derive(Debug, Clone)]
pub struct LongParameterThresholds {
    /// Parameter counts above this are flagged
    pub max_params: usize,
    pub high_params: usize,
    pub critical_params: usize,
}

impl Default for LongParameterThresholds {
    fn default() -> Self {
        Self {
            max_params: 5,
            high_params: 8,
            critical_params: 12,
        }
    }
}

pub struct LongParameterListRule {
    config: RuleConfig,
    thresholds: LongParameterThresholds,
}

impl LongParameterListRule {
    pub fn new() -> Self {
        Self::with_config(RuleConfig::new())
    }

    pub fn with_config(config: RuleConfig) -> Self {
        let d = LongParameterThresholds::default();
        let thresholds = LongParameterThresholds {
            max_params: config
                .get_option("max_params")
                .or_else(|| config.get_option("parameters"))
                .unwrap_or(d.max_params),
            high_params: config.get_option_or("high_params", d.high_params),
            critical_params: config.get_option_or("critical_params", d.critical_params),
        };
        Self { config, thresholds }
    }

    fn calculate_severity(&self, count: usize) -> Severity {
        let t = &self.thresholds;
        if count >= t.critical_params {
            Severity::High
        } else if count >= t.high_params {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

impl Default for LongParameterListRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for LongParameterListRule {
    fn name(&self) -> &'static str {
        "long-parameter-list"
    }

    fn description(&self) -> &'static str {
        "Detects methods with too many parameters"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::LongParameterList
    }

    fn check_method(&self, method: &MethodMetrics, _owner: &ClassMetrics) -> Option<Issue> {
        let count = method.parameter_count;
        if count <= self.thresholds.max_params {
            return None;
        }
        Some(Issue::new(
            self.name(),
            self.kind(),
            self.calculate_severity(count),
            Location::member(&method.type_name, format!("{}{}", method.name, method.descriptor)),
            format!("Long parameter list: {} ({} params)", method.name, count),
            format!(
                "{} takes {} parameters, more than the limit of {}.",
                method.id, count, self.thresholds.max_params
            ),
            "Group related parameters into a parameter object or builder.",
        ))
    }

    fn config(&self) -> Option<&RuleConfig> {
        Some(&self.config)
    }
}
