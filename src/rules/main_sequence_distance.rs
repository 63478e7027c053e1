//! Main sequence distance rule
//!
//! Flags packages far from Martin's main sequence (`A + I = 1`). A package
//! that is stable and concrete is in the zone of pain: hard to change yet
//! depended upon. One that is unstable and abstract is in the zone of
//! uselessness: abstractions nobody uses.

use super::base::{Rule, RuleConfig};
use crate::graph::PackageMetrics;
use crate::models::{Issue, IssueKind, Location, Severity};

pub struct MainSequenceDistanceRule {
    config: RuleConfig,
    max_distance: f64,
    high_distance: f64,
    /// Packages with fewer types are too small to judge
    min_types: usize,
}

impl MainSequenceDistanceRule {
    pub fn new() -> Self {
        Self::with_config(RuleConfig::new())
    }

    pub fn with_config(config: RuleConfig) -> Self {
        Self {
            max_distance: config
                .get_option("max_distance")
                .or_else(|| config.get_option("distance"))
                .unwrap_or(0.7),
            high_distance: config.get_option_or("high_distance", 0.9),
            min_types: config.get_option_or("min_types", 3),
            config,
        }
    }

    fn zone(p: &PackageMetrics) -> &'static str {
        if p.abstractness + p.instability < 1.0 {
            "zone of pain (stable and concrete)"
        } else {
            "zone of uselessness (unstable and abstract)"
        }
    }
}

impl Default for MainSequenceDistanceRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for MainSequenceDistanceRule {
    fn name(&self) -> &'static str {
        "main-sequence-distance"
    }

    fn description(&self) -> &'static str {
        "Detects packages far from the main sequence"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::MainSequenceDistance
    }

    fn check_package(&self, p: &PackageMetrics) -> Option<Issue> {
        if p.types < self.min_types || p.distance <= self.max_distance {
            return None;
        }
        // An isolated package has I = 0 by definition; nothing depends on it
        if p.afferent == 0 && p.efferent == 0 {
            return None;
        }
        let severity = if p.distance >= self.high_distance {
            Severity::High
        } else {
            Severity::Medium
        };
        Some(Issue::new(
            self.name(),
            self.kind(),
            severity,
            Location::package(&p.name),
            format!("Package off the main sequence: {}", p.name),
            format!(
                "Package {} has distance {:.2} (A = {:.2}, I = {:.2}) and is in the {}.",
                p.name,
                p.distance,
                p.abstractness,
                p.instability,
                Self::zone(p)
            ),
            "Balance abstractness against stability: add interfaces to heavily used \
             concrete packages, or remove unused abstractions.",
        ))
    }

    fn config(&self) -> Option<&RuleConfig> {
        Some(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(types: usize, abstractness: f64, instability: f64, afferent: usize) -> PackageMetrics {
        PackageMetrics {
            name: "com.acme.core".into(),
            types,
            abstract_types: (types as f64 * abstractness) as usize,
            afferent,
            efferent: 1,
            instability,
            abstractness,
            distance: (abstractness + instability - 1.0).abs(),
        }
    }

    #[test]
    fn test_zone_of_pain() {
        let issue = MainSequenceDistanceRule::new().check_package(&package(10, 0.0, 0.05, 19));
        let issue = issue.map(|i| (i.severity, i.description));
        assert_eq!(issue.as_ref().map(|(s, _)| *s), Some(Severity::High));
        assert!(issue.map(|(_, d)| d.contains("zone of pain")).unwrap_or(false));
    }

    #[test]
    fn test_on_the_main_sequence() {
        let rule = MainSequenceDistanceRule::new();
        assert!(rule.check_package(&package(10, 0.5, 0.5, 1)).is_none());
        // Too small to judge
        assert!(rule.check_package(&package(2, 0.0, 0.0, 3)).is_none());
    }
}
