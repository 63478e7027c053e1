//! God class rule - finds types that do too much
//!
//! A "god class" is a type that:
//! - Has too many methods
//! - Has too many fields
//! - Has too much accumulated complexity (WMC)
//! - Has low cohesion (methods don't share data)
//!
//! One critical violation, or two regular ones, make a god class.
//! Configuration types are exempt: they legitimately declare many
//! factory methods.

use tracing::debug;

use super::base::{Rule, RuleConfig};
use crate::classfile::TypeModel;
use crate::classify::TypeRole;
use crate::metrics::ClassMetrics;
use crate::models::{Issue, IssueKind, Location, Severity};

/// Thresholds for god class detection
#[derive(Debug, Clone)]
pub struct GodClassThresholds {
    /// Method count above which a type is suspicious
    pub max_methods: usize,
    /// Method count for critical severity
    pub critical_methods: usize,
    pub max_fields: usize,
    pub critical_fields: usize,
    /// Weighted methods per class above which a type is suspicious
    pub max_wmc: u32,
    pub critical_wmc: u32,
    /// Normalised LCOM above which cohesion counts as a violation
    pub max_lcom2: f64,
}

impl Default for GodClassThresholds {
    fn default() -> Self {
        Self {
            max_methods: 20,
            critical_methods: 40,
            max_fields: 15,
            critical_fields: 30,
            max_wmc: 50,
            critical_wmc: 100,
            max_lcom2: 0.8,
        }
    }
}

/// Detects god classes (types with too many responsibilities)
pub struct GodClassRule {
    config: RuleConfig,
    thresholds: GodClassThresholds,
}

impl GodClassRule {
    /// Create a new rule with default thresholds
    pub fn new() -> Self {
        Self::with_thresholds(GodClassThresholds::default())
    }

    pub fn with_thresholds(thresholds: GodClassThresholds) -> Self {
        Self {
            config: RuleConfig::new(),
            thresholds,
        }
    }

    /// Create with custom config
    ///
    /// Accepts both `max_methods` and `method_count`.
    pub fn with_config(config: RuleConfig) -> Self {
        let d = GodClassThresholds::default();
        let thresholds = GodClassThresholds {
            max_methods: config
                .get_option("max_methods")
                .or_else(|| config.get_option("method_count"))
                .unwrap_or(d.max_methods),
            critical_methods: config.get_option_or("critical_methods", d.critical_methods),
            max_fields: config.get_option_or("max_fields", d.max_fields),
            critical_fields: config.get_option_or("critical_fields", d.critical_fields),
            max_wmc: config
                .get_option("max_wmc")
                .or_else(|| config.get_option("wmc"))
                .unwrap_or(d.max_wmc),
            critical_wmc: config.get_option_or("critical_wmc", d.critical_wmc),
            max_lcom2: config.get_option_or("lcom2", d.max_lcom2),
        };
        Self { config, thresholds }
    }

    /// Violations as (reason, is_critical)
    fn violations(&self, m: &ClassMetrics) -> Vec<(String, bool)> {
        let t = &self.thresholds;
        let mut reasons = Vec::new();

        if m.method_count >= t.critical_methods {
            reasons.push((format!("very high method count ({})", m.method_count), true));
        } else if m.method_count >= t.max_methods {
            reasons.push((format!("high method count ({})", m.method_count), false));
        }

        if m.field_count >= t.critical_fields {
            reasons.push((format!("very high field count ({})", m.field_count), true));
        } else if m.field_count >= t.max_fields {
            reasons.push((format!("high field count ({})", m.field_count), false));
        }

        if m.wmc >= t.critical_wmc {
            reasons.push((format!("very high total complexity (WMC {})", m.wmc), true));
        } else if m.wmc >= t.max_wmc {
            reasons.push((format!("high total complexity (WMC {})", m.wmc), false));
        }

        if m.cohesion_methods > 1 && m.lcom2 >= t.max_lcom2 {
            reasons.push((format!("low cohesion (LCOM2 {:.2})", m.lcom2), false));
        }

        reasons
    }

    fn severity(critical: usize, total: usize) -> Severity {
        match (critical, total) {
            (c, _) if c >= 2 => Severity::Critical,
            (1, _) => Severity::High,
            (_, t) if t >= 3 => Severity::High,
            _ => Severity::Medium,
        }
    }
}

impl Default for GodClassRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for GodClassRule {
    fn name(&self) -> &'static str {
        "god-class"
    }

    fn description(&self) -> &'static str {
        "Detects types with too many responsibilities"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::GodClass
    }

    fn check_class(&self, model: &TypeModel, metrics: &ClassMetrics) -> Vec<Issue> {
        if matches!(metrics.role, TypeRole::Configuration | TypeRole::Test) || model.is_abstract() {
            return vec![];
        }

        let violations = self.violations(metrics);
        let critical = violations.iter().filter(|(_, c)| *c).count();
        if critical == 0 && violations.len() < 2 {
            return vec![];
        }

        let severity = Self::severity(critical, violations.len());
        let reasons: Vec<&str> = violations.iter().map(|(r, _)| r.as_str()).collect();
        debug!("God class {}: {}", model.name, reasons.join(", "));

        vec![Issue::new(
            self.name(),
            self.kind(),
            severity,
            Location::of_type(&model.name),
            format!("God class: {}", model.simple_name()),
            format!(
                "{} concentrates too much responsibility: {}.",
                model.name,
                reasons.join(", ")
            ),
            "Split the type along its responsibilities: group methods by the \
             fields they use and extract each group into its own collaborator.",
        )]
    }

    fn config(&self) -> Option<&RuleConfig> {
        Some(&self.config)
    }
}
