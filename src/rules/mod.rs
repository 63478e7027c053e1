//! Rule engine and built-in rules
//!
//! Rules turn finished metrics into severity-tagged issues. Each rule is an
//! independent [`Rule`] implementation; the [`RuleEngine`] runs an ordered,
//! open list of them in parallel and concatenates their output.

mod base;
mod engine;

mod complex_method;
mod cyclic_dependency;
mod deep_inheritance;
mod field_injection;
mod god_class;
mod high_coupling;
mod long_parameter_list;
mod low_cohesion;
mod main_sequence_distance;
mod package_cycle;
mod transactional_proxy_bypass;

pub use base::{Rule, RuleConfig, RuleInput, RuleResult, RuleSummary};
pub(crate) use engine::effective_workers;
pub use engine::{RuleEngine, RuleEngineBuilder, RuleOutcome};

pub use complex_method::ComplexMethodRule;
pub use cyclic_dependency::CyclicDependencyRule;
pub use deep_inheritance::DeepInheritanceRule;
pub use field_injection::FieldInjectionRule;
pub use god_class::{GodClassRule, GodClassThresholds};
pub use high_coupling::HighCouplingRule;
pub use long_parameter_list::{LongParameterListRule, LongParameterThresholds};
pub use low_cohesion::{LowCohesionRule, LowCohesionThresholds};
pub use main_sequence_distance::MainSequenceDistanceRule;
pub use package_cycle::PackageCycleRule;
pub use transactional_proxy_bypass::TransactionalProxyBypassRule;

use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ProjectConfig;

/// Names of the built-in rules, in registration order
pub const BUILTIN_RULES: [&str; 11] = [
    "god-class",
    "low-cohesion",
    "complex-method",
    "long-parameter-list",
    "high-coupling",
    "deep-inheritance",
    "cyclic-dependency",
    "package-cycle",
    "main-sequence-distance",
    "field-injection",
    "transactional-proxy-bypass",
];

/// Build a built-in rule by name
pub fn builtin_rule(name: &str, config: RuleConfig) -> Option<Arc<dyn Rule>> {
    let rule: Arc<dyn Rule> = match name {
        "god-class" => Arc::new(GodClassRule::with_config(config)),
        "low-cohesion" => Arc::new(LowCohesionRule::with_config(config)),
        "complex-method" => Arc::new(ComplexMethodRule::with_config(config)),
        "long-parameter-list" => Arc::new(LongParameterListRule::with_config(config)),
        "high-coupling" => Arc::new(HighCouplingRule::with_config(config)),
        "deep-inheritance" => Arc::new(DeepInheritanceRule::with_config(config)),
        "cyclic-dependency" => Arc::new(CyclicDependencyRule::with_config(config)),
        "package-cycle" => Arc::new(PackageCycleRule::with_config(config)),
        "main-sequence-distance" => Arc::new(MainSequenceDistanceRule::with_config(config)),
        "field-injection" => Arc::new(FieldInjectionRule::with_config(config)),
        "transactional-proxy-bypass" => Arc::new(TransactionalProxyBypassRule::with_config(config)),
        _ => return None,
    };
    Some(rule)
}

/// Every built-in rule with its project configuration applied.
///
/// Rules disabled in the config are left out.
pub fn default_rules(config: &ProjectConfig) -> Vec<Arc<dyn Rule>> {
    for name in unknown_disabled_rules(config) {
        warn!("Config disables unknown rule {}", name);
    }
    BUILTIN_RULES
        .iter()
        .filter(|name| {
            let enabled = config.is_rule_enabled(name);
            if !enabled {
                debug!("Rule {} disabled by config", name);
            }
            enabled
        })
        .filter_map(|name| builtin_rule(name, config.rule_config(name)))
        .collect()
}

/// Disabled rule names in the config that match no built-in rule
pub fn unknown_disabled_rules(config: &ProjectConfig) -> Vec<String> {
    config
        .disabled_rules()
        .into_iter()
        .filter(|name| !BUILTIN_RULES.contains(&name.as_str()))
        .collect()
}
