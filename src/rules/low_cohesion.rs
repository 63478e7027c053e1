//! Low cohesion rule
//!
//! Flags types whose methods share little state: normalised LCOM (LCOM2)
//! at or above the threshold over enough eligible methods. Many unrelated
//! methods on one type usually mean several responsibilities.

use super::base::{Rule, RuleConfig};
use crate::classfile::TypeModel;
use crate::classify::TypeRole;
use crate::metrics::ClassMetrics;
use crate::models::{Issue, IssueKind, Location, Severity};

#[derive(Debug, Clone)]
pub struct LowCohesionThresholds {
    /// Types with fewer eligible methods are ignored
    pub min_methods: usize,
    pub max_lcom2: f64,
    /// Method count from which the issue is High
    pub high_methods: usize,
    /// LCOM2 from which the issue is High regardless of size
    pub high_lcom2: f64,
}

impl Default for LowCohesionThresholds {
    fn default() -> Self {
        Self {
            min_methods: 5,
            max_lcom2: 0.8,
            high_methods: 20,
            high_lcom2: 0.95,
        }
    }
}

pub struct LowCohesionRule {
    config: RuleConfig,
    thresholds: LowCohesionThresholds,
}

impl LowCohesionRule {
    pub fn new() -> Self {
        Self {
            config: RuleConfig::new(),
            thresholds: LowCohesionThresholds::default(),
        }
    }

    pub fn with_config(config: RuleConfig) -> Self {
        let d = LowCohesionThresholds::default();
        let thresholds = LowCohesionThresholds {
            min_methods: config.get_option_or("min_methods", d.min_methods),
            max_lcom2: config
                .get_option("lcom2")
                .or_else(|| config.get_option("max_lcom2"))
                .unwrap_or(d.max_lcom2),
            high_methods: config.get_option_or("high_methods", d.high_methods),
            high_lcom2: config.get_option_or("high_lcom2", d.high_lcom2),
        };
        Self { config, thresholds }
    }
}

impl Default for LowCohesionRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for LowCohesionRule {
    fn name(&self) -> &'static str {
        "low-cohesion"
    }

    fn description(&self) -> &'static str {
        "Detects types whose methods share few fields"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::LowCohesion
    }

    fn check_class(&self, model: &TypeModel, metrics: &ClassMetrics) -> Vec<Issue> {
        let t = &self.thresholds;
        if metrics.role == TypeRole::Test
            || metrics.cohesion_methods < t.min_methods
            || metrics.lcom2 < t.max_lcom2
        {
            return vec![];
        }

        let severity = if metrics.cohesion_methods >= t.high_methods || metrics.lcom2 >= t.high_lcom2 {
            Severity::High
        } else {
            Severity::Medium
        };

        let mut description = format!(
            "{} has LCOM2 {:.2} and TCC {:.2} over {} methods",
            model.name, metrics.lcom2, metrics.tcc, metrics.cohesion_methods
        );
        if metrics.lcom4 > 1 {
            description.push_str(&format!(
                "; its methods fall into {} unrelated groups",
                metrics.lcom4
            ));
        }
        description.push('.');

        vec![Issue::new(
            self.name(),
            self.kind(),
            severity,
            Location::of_type(&model.name),
            format!("Low cohesion: {}", model.simple_name()),
            description,
            "Move each group of methods that works on its own fields into a \
             separate type.",
        )]
    }

    fn config(&self) -> Option<&RuleConfig> {
        Some(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::tests::class_fixture;

    #[test]
    fn test_cohesive_type_passes() {
        let (model, metrics) = class_fixture("a.Cart", |m| {
            m.cohesion_methods = 10;
            m.lcom2 = 0.2;
        });
        assert!(LowCohesionRule::new().check_class(&model, &metrics).is_empty());
    }

    #[test]
    fn test_few_methods_are_ignored() {
        let (model, metrics) = class_fixture("a.Pair", |m| {
            m.cohesion_methods = 3;
            m.lcom2 = 1.0;
        });
        assert!(LowCohesionRule::new().check_class(&model, &metrics).is_empty());
    }

    #[test]
    fn test_medium_and_high() {
        let (model, metrics) = class_fixture("a.Mixed", |m| {
            m.cohesion_methods = 8;
            m.lcom2 = 0.85;
            m.lcom4 = 3;
        });
        let issues = LowCohesionRule::new().check_class(&model, &metrics);
        assert_eq!(issues[0].severity, Severity::Medium);
        assert!(issues[0].description.contains("3 unrelated groups"));

        let (model, metrics) = class_fixture("a.Kitchen", |m| {
            m.cohesion_methods = 25;
            m.lcom2 = 0.9;
        });
        let issues = LowCohesionRule::new().check_class(&model, &metrics);
        assert_eq!(issues[0].severity, Severity::High);
    }
}
