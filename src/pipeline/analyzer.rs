//! Whole-run orchestration
//!
//! ```text
//! models ─┬─ resolve (per type, parallel)
//!         │
//!   ══ barrier ══  DependencyGraph::build, cycles, package view
//!         │
//!         ├─ class/method metrics (per type, parallel)
//!         │
//!   ══ barrier ══  rules (per rule, parallel) → scoring
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::AnalysisContext;
use crate::classfile::TypeModel;
use crate::error::{AnalysisError, AnalysisWarning};
use crate::graph::{
    find_cycles, package_metrics, tangles, DependencyGraph, InheritanceIndex, NodeSpec,
    PackageMetrics,
};
use crate::metrics::{class_metrics, method_metrics, ClassMetrics, MethodMetrics};
use crate::models::{Issue, IssueSummary};
use crate::resolver::{resolve, IncludePolicy, ReferenceEdge};
use crate::rules::{RuleEngine, RuleInput, RuleResult};
use crate::scoring::{QualityScore, QualityScorer, ScoreSignals};

/// Everything one run produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub graph: DependencyGraph,
    /// Keyed by fully-qualified type name
    pub class_metrics: BTreeMap<String, ClassMetrics>,
    /// Keyed by method id (`Type#name(descriptor)`)
    pub method_metrics: BTreeMap<String, MethodMetrics>,
    pub issues: Vec<Issue>,
    pub score: QualityScore,
    /// What could not be analyzed, one line each
    pub errors: Vec<String>,

    pub package_metrics: Vec<PackageMetrics>,
    pub cycles: Vec<Vec<String>>,
    pub package_cycles: Vec<Vec<String>>,
    pub tangles: Vec<Vec<String>>,
    pub warnings: Vec<AnalysisWarning>,
    pub rule_results: Vec<RuleResult>,
    pub summary: IssueSummary,
}

impl AnalysisResult {
    /// A result with no analyzed types, carrying only `errors`
    pub fn empty(ctx: &AnalysisContext, errors: Vec<String>) -> Self {
        let class_metrics = BTreeMap::new();
        let method_metrics = BTreeMap::new();
        let signals = ScoreSignals::from_metrics(&class_metrics, &method_metrics, 0);
        Self {
            graph: DependencyGraph::new(),
            score: QualityScorer::new(&ctx.config.scoring).score(&[], &signals),
            class_metrics,
            method_metrics,
            issues: Vec::new(),
            errors,
            package_metrics: Vec::new(),
            cycles: Vec::new(),
            package_cycles: Vec::new(),
            tangles: Vec::new(),
            warnings: Vec::new(),
            rule_results: Vec::new(),
            summary: IssueSummary::default(),
        }
    }
}

pub struct Analyzer {
    ctx: AnalysisContext,
}

impl Analyzer {
    pub fn new(ctx: AnalysisContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &AnalysisContext {
        &self.ctx
    }

    /// Run every stage over already-extracted models.
    ///
    /// Fails only on cancellation or when a worker pool cannot be built.
    pub fn run(&self, models: Vec<TypeModel>) -> Result<AnalysisResult, AnalysisError> {
        let start = Instant::now();
        let ctx = &self.ctx;
        let (models, mut errors) = dedupe(models);
        info!("Analyzing {} types on {} workers", models.len(), ctx.workers);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(ctx.workers)
            .build()?;

        // Stage 1: per-type reference resolution
        let stage = Instant::now();
        let policy: &dyn IncludePolicy = ctx.policy.as_ref();
        let resolved: Result<Vec<(Vec<ReferenceEdge>, Vec<AnalysisWarning>)>, AnalysisError> =
            pool.install(|| {
                models
                    .par_iter()
                    .map(|model| {
                        ctx.cancel.check()?;
                        Ok((resolve(model, policy), decode_warnings(model)))
                    })
                    .collect()
            });

        let mut edges = Vec::new();
        let mut warnings = Vec::new();
        for (type_edges, type_warnings) in resolved? {
            edges.extend(type_edges);
            warnings.extend(type_warnings);
        }
        debug!("Resolved {} references in {:?}", edges.len(), stage.elapsed());

        // Barrier: the graph is built once, then only read
        ctx.cancel.check()?;
        let stage = Instant::now();
        let specs: Vec<NodeSpec> = models
            .iter()
            .map(|m| NodeSpec {
                name: m.name.clone(),
                is_abstract: m.is_abstract(),
            })
            .collect();
        let (graph, graph_warnings) = DependencyGraph::build(&specs, &edges);
        warnings.extend(graph_warnings);
        warnings.sort();
        warnings.dedup();
        for w in &warnings {
            debug!("{}", w);
        }

        let cycles = find_cycles(&graph, &ctx.cancel)?;
        let tangles = tangles(&graph);
        let packages = graph.package_view();
        let package_cycles = find_cycles(&packages, &ctx.cancel)?;
        let package_metrics = package_metrics(&packages);
        info!(
            "Graph: {} nodes, {} edges, {} cycles, {} package cycles ({:?})",
            graph.node_count(),
            graph.edge_count(),
            cycles.len(),
            package_cycles.len(),
            stage.elapsed()
        );

        // Stage 2: per-type metrics
        let stage = Instant::now();
        let inheritance = InheritanceIndex::new(&models);
        let measured: Result<Vec<(ClassMetrics, Vec<MethodMetrics>)>, AnalysisError> = pool
            .install(|| {
                models
                    .par_iter()
                    .map(|model| {
                        ctx.cancel.check()?;
                        let role = ctx.classifier.classify(model);
                        Ok((
                            class_metrics(model, &graph, &inheritance, role),
                            method_metrics(model),
                        ))
                    })
                    .collect()
            });

        let mut class_map = BTreeMap::new();
        let mut method_map = BTreeMap::new();
        for (class, methods) in measured? {
            for m in methods {
                method_map.insert(m.id.clone(), m);
            }
            class_map.insert(class.name.clone(), class);
        }
        debug!(
            "Computed metrics for {} types and {} methods in {:?}",
            class_map.len(),
            method_map.len(),
            stage.elapsed()
        );

        // Barrier: rules see only finished metrics
        ctx.cancel.check()?;
        let input = RuleInput {
            models: &models,
            graph: &graph,
            class_metrics: &class_map,
            method_metrics: &method_map,
            package_metrics: &package_metrics,
            cycles: &cycles,
            package_cycles: &package_cycles,
        };
        let mut engine = RuleEngine::new(ctx.workers);
        engine.register_all(ctx.rules.iter().cloned());
        let outcome = engine.run(&input, &ctx.cancel)?;
        for result in outcome.results.iter().filter(|r| !r.success) {
            errors.push(format!(
                "rule {} failed: {}",
                result.rule_name,
                result.error.as_deref().unwrap_or("unknown error")
            ));
        }

        ctx.cancel.check()?;
        let signals = ScoreSignals::from_metrics(&class_map, &method_map, cycles.len());
        let score = QualityScorer::new(&ctx.config.scoring).score(&outcome.issues, &signals);
        let summary = IssueSummary::from_issues(&outcome.issues);

        info!(
            "Analysis complete: {} issues, score {:.1} ({}) in {:?}",
            summary.total,
            score.overall,
            score.grade,
            start.elapsed()
        );

        Ok(AnalysisResult {
            graph,
            class_metrics: class_map,
            method_metrics: method_map,
            issues: outcome.issues,
            score,
            errors,
            package_metrics,
            cycles,
            package_cycles,
            tangles,
            warnings,
            rule_results: outcome.results,
            summary,
        })
    }
}

/// Analyze models with default configuration and the given include policy.
///
/// Always returns a result. If the run cannot start, the result is empty
/// and `errors` says why.
pub fn analyze(models: Vec<TypeModel>, policy: impl IncludePolicy + 'static) -> AnalysisResult {
    let ctx = AnalysisContext::new().with_policy(policy);
    let analyzer = Analyzer::new(ctx);
    match analyzer.run(models) {
        Ok(result) => result,
        Err(e) => {
            warn!("Analysis aborted: {}", e);
            AnalysisResult::empty(analyzer.context(), vec![e.to_string()])
        }
    }
}

/// Keep the first model per name and record the rest
fn dedupe(models: Vec<TypeModel>) -> (Vec<TypeModel>, Vec<String>) {
    let mut seen = BTreeSet::new();
    let mut kept = Vec::with_capacity(models.len());
    let mut errors = Vec::new();
    for model in models {
        if seen.insert(model.name.clone()) {
            kept.push(model);
        } else {
            warn!("Duplicate type {}", model.name);
            errors.push(format!(
                "duplicate type {}: keeping the first definition",
                model.name
            ));
        }
    }
    (kept, errors)
}

fn decode_warnings(model: &TypeModel) -> Vec<AnalysisWarning> {
    model
        .methods
        .iter()
        .filter_map(|m| {
            let message = m.instructions.as_ref()?.warning.clone()?;
            Some(AnalysisWarning::InstructionDecode {
                method: crate::metrics::method_id(&model.name, m),
                message,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{CallKind, InstructionEvent, InstructionSummary};
    use crate::classfile::{MemberModel, TypeKind};
    use crate::pipeline::CancellationToken;
    use crate::resolver::PrefixPolicy;

    fn calling(name: &str, target: &str) -> TypeModel {
        let summary = InstructionSummary::from_events(vec![InstructionEvent::Call {
            owner: Some(target.to_string()),
            name: "run".into(),
            descriptor: "()V".into(),
            kind: CallKind::Virtual,
        }]);
        TypeModel::new(name, TypeKind::Class)
            .with_method(MemberModel::method("go", "()V").with_instructions(summary))
    }

    #[test]
    fn test_duplicates_are_recorded() {
        let models = vec![
            TypeModel::new("a.A", TypeKind::Class),
            TypeModel::new("a.A", TypeKind::Interface),
        ];
        let result = analyze(models, PrefixPolicy::default());
        assert_eq!(result.class_metrics.len(), 1);
        assert_eq!(result.class_metrics["a.A"].kind, TypeKind::Class);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("duplicate type a.A"));
    }

    #[test]
    fn test_unresolved_target_becomes_placeholder() {
        let result = analyze(vec![calling("a.A", "a.Missing")], PrefixPolicy::default());
        assert!(result.graph.contains("a.Missing"));
        assert!(!result.class_metrics.contains_key("a.Missing"));
        assert_eq!(
            result.warnings,
            vec![AnalysisWarning::UnresolvedReference {
                source: "a.A".into(),
                target: "a.Missing".into(),
            }]
        );
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_decode_warning_surfaces() {
        let mut summary = InstructionSummary::default();
        summary.warning = Some("truncated operand".into());
        let model = TypeModel::new("a.A", TypeKind::Class)
            .with_method(MemberModel::method("bad", "()V").with_instructions(summary));
        let result = analyze(vec![model], PrefixPolicy::default());
        assert!(matches!(
            &result.warnings[..],
            [AnalysisWarning::InstructionDecode { method, .. }] if method == "a.A#bad()V"
        ));
        assert_eq!(result.method_metrics["a.A#bad()V"].complexity, 1);
    }

    #[test]
    fn test_cancelled_run() {
        let token = CancellationToken::new();
        token.cancel();
        let analyzer = Analyzer::new(AnalysisContext::new().with_cancellation(token));
        let out = analyzer.run(vec![TypeModel::new("a.A", TypeKind::Class)]);
        assert!(matches!(out, Err(AnalysisError::Cancelled)));
    }

    #[test]
    fn test_empty_input() {
        let result = analyze(Vec::new(), PrefixPolicy::default());
        assert!(result.issues.is_empty());
        assert!(result.errors.is_empty());
        assert_eq!(result.graph.node_count(), 0);
        assert!(result.score.overall > 99.0);
    }

    #[test]
    fn test_result_serializes() {
        let result = analyze(
            vec![calling("a.A", "a.B"), calling("a.B", "a.A")],
            PrefixPolicy::default(),
        );
        assert_eq!(result.cycles, vec![vec!["a.A".to_string(), "a.B".to_string()]]);
        let json = serde_json::to_string(&result).unwrap();
        let back: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.issues, result.issues);
        assert_eq!(back.class_metrics, result.class_metrics);
        assert_eq!(back.graph.edge_count(), 2);
    }
}
