//! Per-type and per-method metric records
//!
//! Pure functions of a `TypeModel` plus the finished dependency graph. The
//! pipeline computes them in parallel per type once the graph is built.

pub mod cohesion;
pub mod complexity;

pub use cohesion::{CohesionMetrics, MethodUsage};
pub use complexity::{method_complexity, type_complexity, ComplexityStats};

use serde::{Deserialize, Serialize};

use crate::bytecode::InstructionEvent;
use crate::classfile::{MemberModel, TypeKind, TypeModel};
use crate::classify::TypeRole;
use crate::graph::{
    distance_from_main_sequence, type_abstractness, Coupling, DependencyGraph, InheritanceIndex,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub name: String,
    pub package: String,
    pub kind: TypeKind,
    pub role: TypeRole,
    pub is_abstract: bool,
    pub field_count: usize,
    /// Methods and constructors
    pub method_count: usize,

    pub afferent: usize,
    pub efferent: usize,
    /// Total outgoing reference multiplicity
    pub dependency_strength: usize,
    pub instability: f64,
    pub abstractness: f64,
    pub distance: f64,

    pub lcom1: usize,
    pub lcom2: f64,
    pub lcom4: usize,
    pub tcc: f64,
    pub lcc: f64,
    pub cam: f64,
    pub cohesion_methods: usize,

    /// Weighted methods per class
    pub wmc: u32,
    pub max_complexity: u32,
    pub mean_complexity: f64,

    pub inheritance_depth: usize,
    pub children: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodMetrics {
    pub id: String,
    pub type_name: String,
    pub name: String,
    pub descriptor: String,
    pub complexity: u32,
    pub decision_points: u32,
    pub has_body: bool,
    pub parameter_count: usize,
    pub instruction_count: u32,
    pub call_count: usize,
    pub field_access_count: usize,
    /// Field accesses on other types
    pub foreign_data_accesses: usize,
}

/// `com.acme.Foo#bar(I)V`
pub fn method_id(type_name: &str, member: &MemberModel) -> String {
    format!("{}#{}", type_name, member.signature())
}

pub fn class_metrics(
    model: &TypeModel,
    graph: &DependencyGraph,
    inheritance: &InheritanceIndex,
    role: TypeRole,
) -> ClassMetrics {
    let coupling = Coupling::of(graph, &model.name);
    let instability = coupling.instability();
    let abstractness = type_abstractness(model);
    let cohesion = cohesion::compute(&cohesion::method_usages(model));
    let complexity = type_complexity(model);

    ClassMetrics {
        name: model.name.clone(),
        package: model.package().to_string(),
        kind: model.kind,
        role,
        is_abstract: model.is_abstract(),
        field_count: model.fields.len(),
        method_count: model.methods.len(),

        afferent: coupling.afferent,
        efferent: coupling.efferent,
        dependency_strength: graph.outgoing_strength(&model.name),
        instability,
        abstractness,
        distance: distance_from_main_sequence(abstractness, instability),

        lcom1: cohesion.lcom1,
        lcom2: cohesion.lcom2,
        lcom4: cohesion.lcom4,
        tcc: cohesion.tcc,
        lcc: cohesion.lcc,
        cam: cohesion.cam,
        cohesion_methods: cohesion.eligible_methods,

        wmc: complexity.sum,
        max_complexity: complexity.max,
        mean_complexity: complexity.mean,

        inheritance_depth: inheritance.depth(&model.name),
        children: inheritance.children(&model.name),
    }
}

/// One record per method and constructor, in declaration order
pub fn method_metrics(model: &TypeModel) -> Vec<MethodMetrics> {
    model
        .methods
        .iter()
        .map(|m| {
            let (calls, field_accesses, foreign) = match &m.instructions {
                Some(summary) => {
                    let foreign = summary
                        .field_accesses()
                        .filter(|e| {
                            matches!(e, InstructionEvent::FieldAccess { owner, .. } if owner != &model.name)
                        })
                        .count();
                    (summary.call_count(), summary.field_access_count(), foreign)
                }
                None => (0, 0, 0),
            };
            MethodMetrics {
                id: method_id(&model.name, m),
                type_name: model.name.clone(),
                name: m.name.clone(),
                descriptor: m.descriptor.clone(),
                complexity: method_complexity(m),
                decision_points: m.instructions.as_ref().map_or(0, |s| s.decision_points),
                has_body: m.instructions.is_some(),
                parameter_count: m.parameter_types().len(),
                instruction_count: m.instructions.as_ref().map_or(0, |s| s.instruction_count),
                call_count: calls,
                field_access_count: field_accesses,
                foreign_data_accesses: foreign,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{CallKind, FieldAccessKind, InstructionSummary};
    use crate::graph::NodeSpec;
    use crate::resolver::{resolve, PrefixPolicy};

    fn x_and_y() -> Vec<TypeModel> {
        let call_y = InstructionSummary::from_events(vec![
            InstructionEvent::Call {
                owner: Some("app.Y".into()),
                name: "work".into(),
                descriptor: "(I)V".into(),
                kind: CallKind::Virtual,
            },
            InstructionEvent::FieldAccess {
                owner: "app.Y".into(),
                name: "state".into(),
                descriptor: "I".into(),
                kind: FieldAccessKind::Get,
            },
        ]);
        vec![
            TypeModel::new("app.X", TypeKind::Class)
                .with_superclass("java.lang.Object")
                .with_method(MemberModel::method("run", "(Lapp/Y;)V").with_instructions(call_y)),
            TypeModel::new("app.Y", TypeKind::Class)
                .with_superclass("java.lang.Object")
                .with_field(MemberModel::field("state", "I"))
                .with_method(
                    MemberModel::method("work", "(I)V")
                        .with_instructions(InstructionSummary::default()),
                ),
        ]
    }

    #[test]
    fn test_class_metrics_for_caller_and_callee() {
        let models = x_and_y();
        let policy = PrefixPolicy::default();
        let edges: Vec<_> = models.iter().flat_map(|m| resolve(m, &policy)).collect();
        let nodes: Vec<NodeSpec> = models
            .iter()
            .map(|m| NodeSpec { name: m.name.clone(), is_abstract: m.is_abstract() })
            .collect();
        let (graph, _) = DependencyGraph::build(&nodes, &edges);
        let inheritance = InheritanceIndex::new(&models);

        let x = class_metrics(&models[0], &graph, &inheritance, TypeRole::Unclassified);
        assert_eq!(x.efferent, 1);
        assert_eq!(x.afferent, 0);
        assert_eq!(x.instability, 1.0);
        assert_eq!(x.dependency_strength, 3);
        assert_eq!(x.inheritance_depth, 1);

        let y = class_metrics(&models[1], &graph, &inheritance, TypeRole::Unclassified);
        assert_eq!(y.afferent, 1);
        assert_eq!(y.efferent, 0);
        assert_eq!(y.distance, 1.0);
        assert_eq!(y.tcc, 1.0);
    }

    #[test]
    fn test_method_metrics() {
        let models = x_and_y();
        let metrics = method_metrics(&models[0]);
        assert_eq!(metrics.len(), 1);
        let run = &metrics[0];
        assert_eq!(run.id, "app.X#run(Lapp/Y;)V");
        assert_eq!(run.complexity, 1);
        assert_eq!(run.parameter_count, 1);
        assert_eq!(run.call_count, 1);
        assert_eq!(run.foreign_data_accesses, 1);
        assert!(run.has_body);
    }
}
