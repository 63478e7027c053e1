//! Coupling metrics
//!
//! Robert C. Martin's package metrics, applied at both type and package
//! granularity:
//!
//! - **Afferent coupling (Ca)**: number of distinct nodes that depend on this one
//! - **Efferent coupling (Ce)**: number of distinct nodes this one depends on
//! - **Instability (I)**: `Ce / (Ca + Ce)`, 0 when both are 0
//! - **Abstractness (A)**: abstract share of the node
//! - **Distance (D)**: `|A + I - 1|`, distance from the main sequence
//!
//! A stable, concrete node (I≈0, A≈0) sits in the "zone of pain"; an
//! unstable, abstract one (I≈1, A≈1) in the "zone of uselessness".

use serde::{Deserialize, Serialize};

use super::DependencyGraph;
use crate::classfile::{TypeKind, TypeModel};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupling {
    pub afferent: usize,
    pub efferent: usize,
}

impl Coupling {
    pub fn of(graph: &DependencyGraph, node: &str) -> Self {
        Self {
            afferent: graph.afferent(node).len(),
            efferent: graph.efferent(node).len(),
        }
    }

    pub fn instability(&self) -> f64 {
        instability(self.afferent, self.efferent)
    }
}

/// `Ce / (Ca + Ce)`; 0 for an isolated node
pub fn instability(afferent: usize, efferent: usize) -> f64 {
    let total = afferent + efferent;
    if total == 0 {
        0.0
    } else {
        efferent as f64 / total as f64
    }
}

/// `|A + I - 1|`
pub fn distance_from_main_sequence(abstractness: f64, instability: f64) -> f64 {
    (abstractness + instability - 1.0).abs()
}

/// Abstract share of a type's methods.
///
/// Constructors and static initialisers are not counted. An interface or
/// annotation type with no methods is fully abstract.
pub fn type_abstractness(model: &TypeModel) -> f64 {
    let mut total = 0usize;
    let mut abstract_count = 0usize;
    for m in model.plain_methods() {
        total += 1;
        if m.modifiers.is_abstract() {
            abstract_count += 1;
        }
    }
    if total == 0 {
        return match model.kind {
            TypeKind::Interface | TypeKind::AnnotationType => 1.0,
            _ => 0.0,
        };
    }
    abstract_count as f64 / total as f64
}

/// Per-package Martin metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageMetrics {
    pub name: String,
    pub types: usize,
    pub abstract_types: usize,
    pub afferent: usize,
    pub efferent: usize,
    pub instability: f64,
    /// Abstract-or-interface types / types
    pub abstractness: f64,
    pub distance: f64,
}

/// Metrics for every non-placeholder node of a package view, sorted by name
pub fn package_metrics(packages: &DependencyGraph) -> Vec<PackageMetrics> {
    packages
        .node_names()
        .into_iter()
        .filter_map(|name| {
            let node = packages.node(name)?;
            if node.placeholder {
                return None;
            }
            let coupling = Coupling::of(packages, name);
            let instability = coupling.instability();
            let abstractness = if node.types == 0 {
                0.0
            } else {
                node.abstract_types as f64 / node.types as f64
            };
            Some(PackageMetrics {
                name: name.to_string(),
                types: node.types,
                abstract_types: node.abstract_types,
                afferent: coupling.afferent,
                efferent: coupling.efferent,
                instability,
                abstractness,
                distance: distance_from_main_sequence(abstractness, instability),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::{AccessFlags, MemberModel};
    use crate::graph::tests::graph_of;
    use crate::graph::NodeSpec;
    use crate::resolver::{ReferenceEdge, ReferenceKind};

    #[test]
    fn test_instability_bounds() {
        assert_eq!(instability(0, 0), 0.0);
        assert_eq!(instability(3, 0), 0.0);
        assert_eq!(instability(0, 3), 1.0);
        assert!((instability(1, 3) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_coupling_counts_distinct_nodes() {
        let g = graph_of(
            &["a.X", "a.Y", "a.Z"],
            &[("a.X", "a.Y"), ("a.X", "a.Y"), ("a.X", "a.Z"), ("a.Z", "a.Y")],
        );
        let x = Coupling::of(&g, "a.X");
        assert_eq!(x, Coupling { afferent: 0, efferent: 2 });
        let y = Coupling::of(&g, "a.Y");
        assert_eq!(y, Coupling { afferent: 2, efferent: 0 });
        assert_eq!(y.instability(), 0.0);
        for name in g.node_names() {
            let i = Coupling::of(&g, name).instability();
            assert!((0.0..=1.0).contains(&i));
        }
    }

    #[test]
    fn test_type_abstractness() {
        let iface = TypeModel::new("a.I", TypeKind::Interface);
        assert_eq!(type_abstractness(&iface), 1.0);

        let abstract_run = MemberModel::method("run", "()V")
            .with_modifiers(AccessFlags::new(AccessFlags::PUBLIC | AccessFlags::ABSTRACT));
        let half = TypeModel::new("a.Half", TypeKind::Class)
            .with_method(MemberModel::method("<init>", "()V"))
            .with_method(abstract_run)
            .with_method(MemberModel::method("stop", "()V"));
        assert_eq!(type_abstractness(&half), 0.5);

        let concrete = TypeModel::new("a.C", TypeKind::Class);
        assert_eq!(type_abstractness(&concrete), 0.0);
    }

    #[test]
    fn test_distance() {
        assert_eq!(distance_from_main_sequence(0.0, 0.0), 1.0);
        assert_eq!(distance_from_main_sequence(1.0, 0.0), 0.0);
        assert_eq!(distance_from_main_sequence(0.0, 1.0), 0.0);
    }

    #[test]
    fn test_package_metrics_use_type_share() {
        let nodes = [
            NodeSpec { name: "core.Api".into(), is_abstract: true },
            NodeSpec { name: "core.Impl".into(), is_abstract: false },
            NodeSpec { name: "web.Ctl".into(), is_abstract: false },
        ];
        let edges = [ReferenceEdge {
            source: "web.Ctl".into(),
            target: "core.Api".into(),
            kind: ReferenceKind::Call,
        }];
        let (g, _) = DependencyGraph::build(&nodes, &edges);
        let metrics = package_metrics(&g.package_view());
        assert_eq!(metrics.len(), 2);
        let core = &metrics[0];
        assert_eq!(core.name, "core");
        assert_eq!(core.abstractness, 0.5);
        assert_eq!(core.afferent, 1);
        assert_eq!(core.instability, 0.0);
        assert_eq!(core.distance, 0.5);
        let web = &metrics[1];
        assert_eq!(web.instability, 1.0);
        assert_eq!(web.distance, 0.0);
    }
}
