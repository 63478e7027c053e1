//! Package cycle rule
//!
//! Cycles between packages block modularisation more than type cycles do:
//! no package in the loop can be released, tested or extracted alone.

use super::base::{Rule, RuleConfig, RuleInput};
use super::cyclic_dependency::CyclicDependencyRule;
use crate::models::{Issue, IssueKind, Location, Severity};

pub struct PackageCycleRule {
    config: RuleConfig,
}

impl PackageCycleRule {
    pub fn new() -> Self {
        Self::with_config(RuleConfig::new())
    }

    pub fn with_config(config: RuleConfig) -> Self {
        Self { config }
    }

    fn calculate_severity(cycle_length: usize) -> Severity {
        match cycle_length {
            n if n >= 5 => Severity::Critical,
            n if n >= 3 => Severity::High,
            _ => Severity::Medium,
        }
    }
}

impl Default for PackageCycleRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for PackageCycleRule {
    fn name(&self) -> &'static str {
        "package-cycle"
    }

    fn description(&self) -> &'static str {
        "Detects dependency cycles between packages"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::PackageCycle
    }

    fn check_graph(&self, input: &RuleInput<'_>) -> Vec<Issue> {
        input
            .package_cycles
            .iter()
            .map(|cycle| {
                Issue::new(
                    self.name(),
                    self.kind(),
                    Self::calculate_severity(cycle.len()),
                    Location::group(cycle.clone()),
                    format!("Package cycle between {} packages", cycle.len()),
                    format!(
                        "Packages depend on each other in a loop: {}",
                        CyclicDependencyRule::display_cycle(cycle)
                    ),
                    "Move the types that create the back edge into the package they \
                     depend on, or introduce an interface package both sides can \
                     depend on.",
                )
            })
            .collect()
    }

    fn config(&self) -> Option<&RuleConfig> {
        Some(&self.config)
    }
}
