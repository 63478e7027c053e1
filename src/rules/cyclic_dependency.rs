//! Cyclic dependency rule
//!
//! Reports every type-level cycle found by the dependency graph's DFS. One
//! issue per cycle; severity grows with the number of types involved.

use super::base::{Rule, RuleConfig, RuleInput};
use crate::models::{Issue, IssueKind, Location, Severity};

pub struct CyclicDependencyRule {
    config: RuleConfig,
}

impl CyclicDependencyRule {
    pub fn new() -> Self {
        Self::with_config(RuleConfig::new())
    }

    pub fn with_config(config: RuleConfig) -> Self {
        Self { config }
    }

    /// Calculate severity based on cycle length
    pub(crate) fn calculate_severity(cycle_length: usize) -> Severity {
        match cycle_length {
            n if n >= 10 => Severity::Critical,
            n if n >= 5 => Severity::High,
            n if n >= 3 => Severity::Medium,
            _ => Severity::Low,
        }
    }

    /// `a -> b -> c -> a`, truncated after five members
    pub(crate) fn display_cycle(cycle: &[String]) -> String {
        let mut shown: Vec<&str> = cycle.iter().take(5).map(|s| s.as_str()).collect();
        if cycle.len() > 5 {
            return format!("{} ... ({} total)", shown.join(" -> "), cycle.len());
        }
        if let Some(first) = cycle.first() {
            shown.push(first.as_str());
        }
        shown.join(" -> ")
    }

    fn suggest_fix(cycle_length: usize) -> &'static str {
        if cycle_length >= 5 {
            "Large dependency cycle. Extract the shared abstractions into their own \
             types, invert the dependencies that point back up the chain, and layer \
             the participants with one clear direction."
        } else {
            "Small dependency cycle. Merge the participants if they are one concept, \
             or introduce an interface owned by one side so the other side depends \
             only on it."
        }
    }
}

impl Default for CyclicDependencyRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for CyclicDependencyRule {
    fn name(&self) -> &'static str {
        "cyclic-dependency"
    }

    fn description(&self) -> &'static str {
        "Detects dependency cycles between types"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::CyclicDependency
    }

    fn check_graph(&self, input: &RuleInput<'_>) -> Vec<Issue> {
        input
            .cycles
            .iter()
            .map(|cycle| {
                let len = cycle.len();
                Issue::new(
                    self.name(),
                    self.kind(),
                    Self::calculate_severity(len),
                    Location::group(cycle.clone()),
                    format!("Dependency cycle between {} types", len),
                    format!("Types depend on each other in a loop: {}", Self::display_cycle(cycle)),
                    Self::suggest_fix(len),
                )
            })
            .collect()
    }

    fn config(&self) -> Option<&RuleConfig> {
        Some(&self.config)
    }
}
