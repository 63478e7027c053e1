//! Core data models for classlens
//!
//! Issues, severities and locations shared by the rule engine, the scorer
//! and the reporters.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

/// Generate a deterministic issue ID based on content hash.
///
/// The ID is a 16-character hex string derived from the rule name, the
/// location and the title, so the same issue keeps its ID across runs.
pub fn deterministic_issue_id(rule: &str, location: &str, title: &str) -> String {
    let input = format!("{rule}\n{location}\n{title}");
    format!("{:016x}", xxh3_64(input.as_bytes()))
}

/// Severity levels for issues
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!(
                "unknown severity '{}' (expected low, medium, high or critical)",
                other
            )),
        }
    }
}

/// Closed taxonomy of issue kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    GodClass,
    LowCohesion,
    ComplexMethod,
    LongParameterList,
    HighCoupling,
    DeepInheritance,
    CyclicDependency,
    PackageCycle,
    MainSequenceDistance,
    FieldInjection,
    TransactionalProxyBypass,
}

impl IssueKind {
    pub const ALL: [IssueKind; 11] = [
        IssueKind::GodClass,
        IssueKind::LowCohesion,
        IssueKind::ComplexMethod,
        IssueKind::LongParameterList,
        IssueKind::HighCoupling,
        IssueKind::DeepInheritance,
        IssueKind::CyclicDependency,
        IssueKind::PackageCycle,
        IssueKind::MainSequenceDistance,
        IssueKind::FieldInjection,
        IssueKind::TransactionalProxyBypass,
    ];

    /// Kebab-case name, used as the config key in `[scoring.kind_weights]`
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::GodClass => "god-class",
            IssueKind::LowCohesion => "low-cohesion",
            IssueKind::ComplexMethod => "complex-method",
            IssueKind::LongParameterList => "long-parameter-list",
            IssueKind::HighCoupling => "high-coupling",
            IssueKind::DeepInheritance => "deep-inheritance",
            IssueKind::CyclicDependency => "cyclic-dependency",
            IssueKind::PackageCycle => "package-cycle",
            IssueKind::MainSequenceDistance => "main-sequence-distance",
            IssueKind::FieldInjection => "field-injection",
            IssueKind::TransactionalProxyBypass => "transactional-proxy-bypass",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an issue was found
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Location {
    Package { name: String },
    Type { name: String },
    Member { type_name: String, member: String },
    /// A group of types or packages (cycles)
    Group { members: Vec<String> },
}

impl Location {
    pub fn package(name: impl Into<String>) -> Self {
        Location::Package { name: name.into() }
    }

    pub fn of_type(name: impl Into<String>) -> Self {
        Location::Type { name: name.into() }
    }

    pub fn member(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        Location::Member {
            type_name: type_name.into(),
            member: member.into(),
        }
    }

    pub fn group(members: Vec<String>) -> Self {
        Location::Group { members }
    }

    /// Owning type, if the location is inside one
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Location::Type { name } => Some(name),
            Location::Member { type_name, .. } => Some(type_name),
            _ => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Package { name } => write!(f, "package {}", name),
            Location::Type { name } => f.write_str(name),
            Location::Member { type_name, member } => write!(f, "{}#{}", type_name, member),
            Location::Group { members } => write!(f, "{}", members.join(" -> ")),
        }
    }
}

/// A rule violation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    /// Name of the rule that produced this issue
    pub rule: String,
    pub kind: IssueKind,
    pub severity: Severity,
    pub location: Location,
    pub title: String,
    pub description: String,
    pub recommendation: String,
}

impl Issue {
    pub fn new(
        rule: &str,
        kind: IssueKind,
        severity: Severity,
        location: Location,
        title: impl Into<String>,
        description: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        let title = title.into();
        Self {
            id: deterministic_issue_id(rule, &location.to_string(), &title),
            rule: rule.to_string(),
            kind,
            severity,
            location,
            title,
            description: description.into(),
            recommendation: recommendation.into(),
        }
    }
}

/// Sort issues: severity descending, then location, then rule name
pub fn sort_issues(issues: &mut [Issue]) {
    issues.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.location.cmp(&b.location))
            .then_with(|| a.rule.cmp(&b.rule))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Summary of issues by severity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total: usize,
}

impl IssueSummary {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut summary = Self::default();
        for i in issues {
            match i.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
            summary.total += 1;
        }
        summary
    }

    pub fn at_or_above(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.critical + self.high,
            Severity::Medium => self.critical + self.high + self.medium,
            Severity::Low => self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(severity: Severity, location: Location, rule: &str) -> Issue {
        Issue::new(rule, IssueKind::GodClass, severity, location, "t", "d", "r")
    }

    #[test]
    fn test_deterministic_id_is_stable() {
        let a = deterministic_issue_id("god-class", "com.acme.Foo", "God class");
        let b = deterministic_issue_id("god-class", "com.acme.Foo", "God class");
        let c = deterministic_issue_id("god-class", "com.acme.Bar", "God class");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_severity_ordering_and_parse() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Medium > Severity::Low);
        assert_eq!("HIGH".parse::<Severity>().unwrap(), Severity::High);
        assert!("info".parse::<Severity>().is_err());
    }

    #[test]
    fn test_sort_issues() {
        let mut issues = vec![
            issue(Severity::Low, Location::of_type("a.A"), "x"),
            issue(Severity::High, Location::of_type("b.B"), "x"),
            issue(Severity::High, Location::of_type("a.A"), "y"),
            issue(Severity::High, Location::of_type("a.A"), "x"),
        ];
        sort_issues(&mut issues);
        assert_eq!(issues[0].rule, "x");
        assert_eq!(issues[0].location, Location::of_type("a.A"));
        assert_eq!(issues[1].rule, "y");
        assert_eq!(issues[2].location, Location::of_type("b.B"));
        assert_eq!(issues[3].severity, Severity::Low);
    }

    #[test]
    fn test_summary_counts() {
        let issues = vec![
            issue(Severity::Critical, Location::of_type("a"), "x"),
            issue(Severity::Medium, Location::of_type("b"), "x"),
            issue(Severity::Low, Location::of_type("c"), "x"),
        ];
        let s = IssueSummary::from_issues(&issues);
        assert_eq!(s.total, 3);
        assert_eq!(s.at_or_above(Severity::High), 1);
        assert_eq!(s.at_or_above(Severity::Medium), 2);
    }
}
