//! Penalty/bonus quality scorer

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::{PillarWeights, ScoringConfig};
use crate::metrics::{ClassMetrics, MethodMetrics};
use crate::models::{Issue, IssueKind, IssueSummary, Severity};

/// Maximum bonus points for each positive signal
const MAX_MODULARITY_BONUS: f64 = 10.0;
const MAX_COHESION_BONUS: f64 = 5.0;
const MAX_CLEAN_DEPS_BONUS: f64 = 10.0;
const MAX_COMPLEXITY_DIST_BONUS: f64 = 5.0;

/// Methods at or below this complexity count as simple
const SIMPLE_METHOD_COMPLEXITY: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Pillar {
    Structure,
    Quality,
    Architecture,
}

impl Pillar {
    fn of(kind: IssueKind) -> Self {
        match kind {
            IssueKind::ComplexMethod | IssueKind::LongParameterList | IssueKind::DeepInheritance => {
                Pillar::Structure
            }
            IssueKind::GodClass
            | IssueKind::LowCohesion
            | IssueKind::FieldInjection
            | IssueKind::TransactionalProxyBypass => Pillar::Quality,
            IssueKind::HighCoupling
            | IssueKind::CyclicDependency
            | IssueKind::PackageCycle
            | IssueKind::MainSequenceDistance => Pillar::Architecture,
        }
    }
}

fn severity_points(severity: Severity) -> f64 {
    match severity {
        Severity::Critical => 10.0,
        Severity::High => 5.0,
        Severity::Medium => 1.5,
        Severity::Low => 0.3,
    }
}

/// Breakdown of a single pillar score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarScore {
    pub name: String,
    /// Penalty points from issues
    pub penalty: f64,
    /// Bonus before the cap
    pub raw_bonus: f64,
    /// Bonus actually applied
    pub bonus: f64,
    /// Individual bonus contributions (uncapped)
    pub bonuses: Vec<(String, f64)>,
    pub score: f64,
    pub issue_count: usize,
}

/// Aggregate inputs the bonuses are computed from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSignals {
    pub types: usize,
    pub methods: usize,
    /// Mean distance from the main sequence over all types
    pub mean_distance: f64,
    /// Mean TCC over types with at least two eligible methods
    pub mean_tcc: f64,
    pub cycle_count: usize,
    /// Share of methods with complexity ≤ 10
    pub simple_method_ratio: f64,
}

impl ScoreSignals {
    pub fn from_metrics(
        class_metrics: &BTreeMap<String, ClassMetrics>,
        method_metrics: &BTreeMap<String, MethodMetrics>,
        cycle_count: usize,
    ) -> Self {
        let types = class_metrics.len();
        let methods = method_metrics.len();

        let mean_distance = if types == 0 {
            0.0
        } else {
            class_metrics.values().map(|m| m.distance).sum::<f64>() / types as f64
        };

        let cohesive: Vec<f64> = class_metrics
            .values()
            .filter(|m| m.cohesion_methods > 1)
            .map(|m| m.tcc)
            .collect();
        let mean_tcc = if cohesive.is_empty() {
            1.0
        } else {
            cohesive.iter().sum::<f64>() / cohesive.len() as f64
        };

        let simple = method_metrics
            .values()
            .filter(|m| m.complexity <= SIMPLE_METHOD_COMPLEXITY)
            .count();
        let simple_method_ratio = if methods == 0 {
            1.0
        } else {
            simple as f64 / methods as f64
        };

        Self {
            types,
            methods,
            mean_distance,
            mean_tcc,
            cycle_count,
            simple_method_ratio,
        }
    }

    fn size_factor(&self) -> f64 {
        ((self.types + self.methods) as f64).sqrt().max(5.0)
    }
}

/// Complete score with per-pillar breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    /// Overall score, 0-100
    pub overall: f64,
    /// Letter grade
    pub grade: String,
    pub structure: PillarScore,
    pub quality: PillarScore,
    pub architecture: PillarScore,
    pub issue_counts: BTreeMap<IssueKind, usize>,
    pub severity_counts: IssueSummary,
    pub signals: ScoreSignals,
}

impl QualityScore {
    pub fn pillars(&self) -> [&PillarScore; 3] {
        [&self.structure, &self.quality, &self.architecture]
    }
}

/// Penalty/bonus scorer
pub struct QualityScorer<'a> {
    config: &'a ScoringConfig,
    weights: PillarWeights,
}

impl<'a> QualityScorer<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        let mut weights = config.pillar_weights.clone();
        if !weights.is_valid() {
            weights.normalize();
        }
        Self { config, weights }
    }

    /// Calculate the score. Independent of the order of `issues`.
    pub fn score(&self, issues: &[Issue], signals: &ScoreSignals) -> QualityScore {
        let mut counts: BTreeMap<(IssueKind, Severity), usize> = BTreeMap::new();
        for issue in issues {
            *counts.entry((issue.kind, issue.severity)).or_insert(0) += 1;
        }

        let size_factor = signals.size_factor();
        let mut penalties: BTreeMap<Pillar, (f64, usize)> = BTreeMap::new();
        for (&(kind, severity), &count) in &counts {
            let per_issue = severity_points(severity) * self.config.kind_weight(kind) / size_factor;
            let entry = penalties.entry(Pillar::of(kind)).or_insert((0.0, 0));
            entry.0 += per_issue * count as f64;
            entry.1 += count;
        }
        let penalty_of = |p: Pillar| penalties.get(&p).copied().unwrap_or((0.0, 0));

        let modularity = self.modularity_bonus(signals);
        let cohesion = self.cohesion_bonus(signals);
        let clean_deps = self.clean_deps_bonus(signals);
        let complexity = self.complexity_bonus(signals);
        debug!(
            "Bonuses: modularity={:.2}, cohesion={:.2}, clean_deps={:.2}, complexity={:.2}",
            modularity, cohesion, clean_deps, complexity
        );

        let structure = self.build_pillar(
            "Structure",
            penalty_of(Pillar::Structure),
            vec![("Complexity distribution", complexity)],
        );
        let quality = self.build_pillar(
            "Quality",
            penalty_of(Pillar::Quality),
            vec![("Cohesion", cohesion)],
        );
        let architecture = self.build_pillar(
            "Architecture",
            penalty_of(Pillar::Architecture),
            vec![
                ("Modularity (main sequence)", modularity),
                ("Clean dependencies (no cycles)", clean_deps),
            ],
        );

        let w = &self.weights;
        let overall = (structure.score * w.structure
            + quality.score * w.quality
            + architecture.score * w.architecture)
            .clamp(0.0, 100.0);

        let mut issue_counts = BTreeMap::new();
        for (&(kind, _), &count) in &counts {
            *issue_counts.entry(kind).or_insert(0) += count;
        }
        let severity_counts = IssueSummary::from_issues(issues);
        let grade = Self::calculate_grade(overall, severity_counts.critical);

        info!(
            "Quality score: {:.1} ({}) - Structure: {:.1}, Quality: {:.1}, Architecture: {:.1}",
            overall, grade, structure.score, quality.score, architecture.score
        );

        QualityScore {
            overall,
            grade,
            structure,
            quality,
            architecture,
            issue_counts,
            severity_counts,
            signals: signals.clone(),
        }
    }

    fn build_pillar(&self, name: &str, penalty: (f64, usize), bonuses: Vec<(&str, f64)>) -> PillarScore {
        let (penalty, issue_count) = penalty;
        let raw_bonus: f64 = bonuses.iter().map(|(_, b)| b).sum();
        let bonus = raw_bonus.min(penalty * self.config.bonus_cap_ratio.max(0.0));
        let score = (100.0 - penalty + bonus).clamp(0.0, 100.0);

        PillarScore {
            name: name.to_string(),
            penalty,
            raw_bonus,
            bonus,
            bonuses: bonuses.into_iter().map(|(n, v)| (n.to_string(), v)).collect(),
            score,
            issue_count,
        }
    }

    /// Mean distance of 0.3 or less gets full bonus, 0.7 or more none
    fn modularity_bonus(&self, s: &ScoreSignals) -> f64 {
        if s.types == 0 {
            return 0.0;
        }
        let score = 1.0 - ((s.mean_distance - 0.3) / 0.4).clamp(0.0, 1.0);
        score * MAX_MODULARITY_BONUS
    }

    /// Mean TCC of 0.7 or more gets full bonus, 0.3 or less none
    fn cohesion_bonus(&self, s: &ScoreSignals) -> f64 {
        let score = ((s.mean_tcc - 0.3) / 0.4).clamp(0.0, 1.0);
        score * MAX_COHESION_BONUS
    }

    /// 0 cycles = full bonus, each cycle reduces by 20%
    fn clean_deps_bonus(&self, s: &ScoreSignals) -> f64 {
        let reduction = (s.cycle_count as f64 * 0.2).min(1.0);
        (1.0 - reduction) * MAX_CLEAN_DEPS_BONUS
    }

    /// 90%+ simple methods = full bonus, 50% = none
    fn complexity_bonus(&self, s: &ScoreSignals) -> f64 {
        let score = ((s.simple_method_ratio - 0.5) / 0.4).clamp(0.0, 1.0);
        score * MAX_COMPLEXITY_DIST_BONUS
    }

    /// Letter grade; any critical issue caps the grade at C
    fn calculate_grade(score: f64, critical_count: usize) -> String {
        let base = if score >= 97.0 {
            "A+"
        } else if score >= 93.0 {
            "A"
        } else if score >= 90.0 {
            "A-"
        } else if score >= 87.0 {
            "B+"
        } else if score >= 83.0 {
            "B"
        } else if score >= 80.0 {
            "B-"
        } else if score >= 77.0 {
            "C+"
        } else if score >= 73.0 {
            "C"
        } else if score >= 70.0 {
            "C-"
        } else if score >= 67.0 {
            "D+"
        } else if score >= 63.0 {
            "D"
        } else if score >= 60.0 {
            "D-"
        } else {
            "F"
        };

        if critical_count > 0 && (base.starts_with('A') || base.starts_with('B')) {
            "C".to_string()
        } else {
            base.to_string()
        }
    }

    /// Generate human-readable explanation of the score
    pub fn explain(&self, score: &QualityScore) -> String {
        let mut lines = Vec::new();
        lines.push(format!("Quality score: {:.1} ({})", score.overall, score.grade));
        lines.push(String::new());
        lines.push(format!(
            "Overall = Structure x {:.2} + Quality x {:.2} + Architecture x {:.2}",
            self.weights.structure, self.weights.quality, self.weights.architecture
        ));
        lines.push(format!(
            "Pillar  = 100 - penalties + bonuses (bonus capped at {:.0}% of penalty)",
            self.config.bonus_cap_ratio * 100.0
        ));
        lines.push(String::new());

        let s = &score.signals;
        lines.push("Signals:".to_string());
        lines.push(format!("  types analyzed:        {}", s.types));
        lines.push(format!("  methods analyzed:      {}", s.methods));
        lines.push(format!("  mean distance (D):     {:.2}", s.mean_distance));
        lines.push(format!("  mean TCC:              {:.2}", s.mean_tcc));
        lines.push(format!("  type cycles:           {}", s.cycle_count));
        lines.push(format!(
            "  simple methods:        {:.1}%",
            s.simple_method_ratio * 100.0
        ));
        lines.push(String::new());

        for pillar in score.pillars() {
            lines.push(format!("{}: {:.1}", pillar.name, pillar.score));
            lines.push(format!(
                "  penalty {:.2} from {} issues",
                pillar.penalty, pillar.issue_count
            ));
            for (name, value) in &pillar.bonuses {
                if *value > 0.001 {
                    lines.push(format!("  + {}: {:.2}", name, value));
                }
            }
            if pillar.raw_bonus > pillar.bonus {
                lines.push(format!("  bonus capped at {:.2}", pillar.bonus));
            }
        }

        if !score.issue_counts.is_empty() {
            lines.push(String::new());
            lines.push("Issues by kind:".to_string());
            for (kind, count) in &score.issue_counts {
                lines.push(format!("  {:<28} {}", kind.as_str(), count));
            }
        }

        lines.join("\n")
    }
}
