//! High coupling rule
//!
//! Flags types that depend on too many distinct types (efferent coupling)
//! or that too many distinct types depend on (afferent coupling). The
//! latter is reported at a lower severity: a widely used type is only a
//! problem when it is also unstable.

use super::base::{Rule, RuleConfig};
use crate::classfile::TypeModel;
use crate::classify::TypeRole;
use crate::metrics::ClassMetrics;
use crate::models::{Issue, IssueKind, Location, Severity};

pub struct HighCouplingRule {
    config: RuleConfig,
    max_efferent: usize,
    critical_efferent: usize,
    max_afferent: usize,
}

impl HighCouplingRule {
    pub fn new() -> Self {
        Self::with_config(RuleConfig::new())
    }

    pub fn with_config(config: RuleConfig) -> Self {
        Self {
            max_efferent: config
                .get_option("max_efferent")
                .or_else(|| config.get_option("efferent"))
                .unwrap_or(20),
            critical_efferent: config.get_option_or("critical_efferent", 40),
            max_afferent: config.get_option_or("max_afferent", 50),
            config,
        }
    }
}

impl Default for HighCouplingRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for HighCouplingRule {
    fn name(&self) -> &'static str {
        "high-coupling"
    }

    fn description(&self) -> &'static str {
        "Detects types coupled to too many other types"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::HighCoupling
    }

    fn check_class(&self, model: &TypeModel, m: &ClassMetrics) -> Vec<Issue> {
        if m.role == TypeRole::Test {
            return vec![];
        }

        let mut issues = Vec::new();
        if m.efferent > self.max_efferent {
            let severity = if m.efferent >= self.critical_efferent {
                Severity::High
            } else {
                Severity::Medium
            };
            issues.push(Issue::new(
                self.name(),
                self.kind(),
                severity,
                Location::of_type(&model.name),
                format!("High efferent coupling: {}", model.simple_name()),
                format!(
                    "{} depends on {} distinct types ({} references), above the limit of {}.",
                    model.name, m.efferent, m.dependency_strength, self.max_efferent
                ),
                "Introduce a facade or narrower interfaces so the type talks to fewer \
                 collaborators.",
            ));
        }

        // Afferent coupling only hurts on concrete, unstable types
        if m.afferent > self.max_afferent && m.abstractness < 0.5 && m.instability > 0.5 {
            issues.push(Issue::new(
                self.name(),
                self.kind(),
                Severity::Medium,
                Location::of_type(&model.name),
                format!("High afferent coupling: {}", model.simple_name()),
                format!(
                    "{} is used by {} types but is concrete and unstable (I = {:.2}).",
                    model.name, m.afferent, m.instability
                ),
                "Extract an interface for the widely used behaviour and reduce the \
                 type's own outgoing dependencies.",
            ));
        }

        issues
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
    fn test_efferent_bands() {
        let rule = HighCouplingRule::new();
        let (model, metrics) = class_fixture("a.Hub", |m| m.efferent = 20);
        assert!(rule.check_class(&model, &metrics).is_empty());

        let (model, metrics) = class_fixture("a.Hub", |m| m.efferent = 25);
        assert_eq!(rule.check_class(&model, &metrics)[0].severity, Severity::Medium);

        let (model, metrics) = class_fixture("a.Hub", |m| m.efferent = 45);
        assert_eq!(rule.check_class(&model, &metrics)[0].severity, Severity::High);
    }

    #[test]
    fn test_afferent_only_for_unstable_concrete_types() {
        let rule = HighCouplingRule::new();
        let (model, stable) = class_fixture("a.Util", |m| {
            m.afferent = 60;
            m.instability = 0.1;
        });
        assert!(rule.check_class(&model, &stable).is_empty());

        let (model, unstable) = class_fixture("a.Util", |m| {
            m.afferent = 60;
            m.efferent = 15;
            m.instability = 0.8;
        });
        assert_eq!(rule.check_class(&model, &unstable).len(), 1);
    }
}
