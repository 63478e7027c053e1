//! Dependency graph over analyzed types
//!
//! Built once per run from resolved reference edges, then read by the metric
//! engines and rules. Parallel edges between the same pair of types are
//! collapsed into one graph edge carrying per-kind counts and a total
//! strength.
//!
//! ```text
//! ReferenceEdge*  ──► DependencyGraph (types)  ──► package_view()  ──► DependencyGraph (packages)
//!                          │                              │
//!                          ├─ coupling / instability      └─ package cycles
//!                          ├─ find_cycles (iterative DFS)
//!                          └─ tangles (tarjan_scc)
//! ```

pub mod coupling;
pub mod cycles;
pub mod inheritance;

pub use coupling::{
    distance_from_main_sequence, instability, package_metrics, type_abstractness, Coupling,
    PackageMetrics,
};
pub use cycles::{find_cycles, normalize_cycle, tangles};
pub use inheritance::InheritanceIndex;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::classfile::package_of;
use crate::error::AnalysisWarning;
use crate::resolver::{ReferenceEdge, ReferenceKind};

/// A graph node: an analyzed type, a package, or a placeholder for an
/// in-scope type that was referenced but not supplied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub placeholder: bool,
    /// Abstract class or interface (packages: count of such types)
    pub abstract_types: usize,
    /// 1 for a type node; number of member types for a package node
    pub types: usize,
}

/// Collapsed dependency between two nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub strength: usize,
    pub kinds: BTreeMap<ReferenceKind, usize>,
}

impl Dependency {
    fn record(&mut self, kind: ReferenceKind, count: usize) {
        self.strength += count;
        *self.kinds.entry(kind).or_insert(0) += count;
    }

    fn merge(&mut self, other: &Dependency) {
        for (kind, count) in &other.kinds {
            self.record(*kind, *count);
        }
    }
}

/// Input description of one analyzed type for graph construction
#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub name: String,
    pub is_abstract: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "SerializedGraph")]
pub struct DependencyGraph {
    graph: DiGraph<Node, Dependency>,
    #[serde(skip)]
    index: FxHashMap<String, NodeIndex>,
}

#[derive(Deserialize)]
struct SerializedGraph {
    graph: DiGraph<Node, Dependency>,
}

impl From<SerializedGraph> for DependencyGraph {
    fn from(raw: SerializedGraph) -> Self {
        let index = raw
            .graph
            .node_indices()
            .map(|i| (raw.graph[i].name.clone(), i))
            .collect();
        Self {
            graph: raw.graph,
            index,
        }
    }
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the analyzed types and their resolved references.
    ///
    /// Targets that are not among `nodes` become placeholder nodes; each
    /// distinct (source, target) pair of that sort yields one warning.
    /// Self-references never become edges.
    pub fn build(nodes: &[NodeSpec], edges: &[ReferenceEdge]) -> (Self, Vec<AnalysisWarning>) {
        let mut graph = Self::new();
        let mut sorted: Vec<&NodeSpec> = nodes.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        for spec in sorted {
            graph.add_node(Node {
                name: spec.name.clone(),
                placeholder: false,
                abstract_types: usize::from(spec.is_abstract),
                types: 1,
            });
        }

        // Collapse to (source, target) -> Dependency in a stable order
        let mut collapsed: BTreeMap<(&str, &str), Dependency> = BTreeMap::new();
        for e in edges {
            if e.source == e.target {
                continue;
            }
            collapsed
                .entry((e.source.as_str(), e.target.as_str()))
                .or_default()
                .record(e.kind, 1);
        }

        let mut warnings = Vec::new();
        for ((source, target), dep) in collapsed {
            if !graph.index.contains_key(target) {
                warnings.push(AnalysisWarning::UnresolvedReference {
                    source: source.to_string(),
                    target: target.to_string(),
                });
                graph.add_node(Node {
                    name: target.to_string(),
                    placeholder: true,
                    abstract_types: 0,
                    types: 1,
                });
            }
            let Some(s) = graph.index.get(source).copied() else {
                continue;
            };
            let t = graph.index[target];
            graph.graph.add_edge(s, t, dep);
        }

        (graph, warnings)
    }

    fn add_node(&mut self, node: Node) -> NodeIndex {
        if let Some(&i) = self.index.get(&node.name) {
            return i;
        }
        let name = node.name.clone();
        let i = self.graph.add_node(node);
        self.index.insert(name, i);
        i
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.index.get(name).map(|&i| &self.graph[i])
    }

    /// Node names in sorted order
    pub fn node_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.graph.node_weights().map(|n| n.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Dependency between two nodes, if any
    pub fn dependency(&self, source: &str, target: &str) -> Option<&Dependency> {
        let s = *self.index.get(source)?;
        let t = *self.index.get(target)?;
        self.graph.find_edge(s, t).map(|e| &self.graph[e])
    }

    /// All edges as (source, target, dependency), sorted by names
    pub fn edges(&self) -> Vec<(&str, &str, &Dependency)> {
        let mut out: Vec<_> = self
            .graph
            .edge_references()
            .map(|e| {
                (
                    self.graph[e.source()].name.as_str(),
                    self.graph[e.target()].name.as_str(),
                    e.weight(),
                )
            })
            .collect();
        out.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        out
    }

    fn neighbours(&self, name: &str, direction: Direction) -> Vec<&str> {
        let Some(&i) = self.index.get(name) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .neighbors_directed(i, direction)
            .map(|n| self.graph[n].name.as_str())
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Nodes this node depends on, sorted
    pub fn efferent(&self, name: &str) -> Vec<&str> {
        self.neighbours(name, Direction::Outgoing)
    }

    /// Nodes depending on this node, sorted
    pub fn afferent(&self, name: &str) -> Vec<&str> {
        self.neighbours(name, Direction::Incoming)
    }

    /// Total outgoing reference multiplicity
    pub fn outgoing_strength(&self, name: &str) -> usize {
        let Some(&i) = self.index.get(name) else {
            return 0;
        };
        self.graph
            .edges_directed(i, Direction::Outgoing)
            .map(|e| e.weight().strength)
            .sum()
    }

    /// Collapse type nodes into package nodes, dropping intra-package edges.
    ///
    /// A package node is a placeholder only if every type in it is.
    pub fn package_view(&self) -> DependencyGraph {
        let mut packages: BTreeMap<&str, Node> = BTreeMap::new();
        for node in self.graph.node_weights() {
            let pkg = package_of(&node.name);
            let entry = packages.entry(pkg).or_insert_with(|| Node {
                name: pkg.to_string(),
                placeholder: true,
                abstract_types: 0,
                types: 0,
            });
            entry.placeholder &= node.placeholder;
            if !node.placeholder {
                entry.abstract_types += node.abstract_types;
                entry.types += node.types;
            }
        }

        let mut view = DependencyGraph::new();
        for (_, node) in packages {
            view.add_node(node);
        }

        let mut collapsed: BTreeMap<(&str, &str), Dependency> = BTreeMap::new();
        for (source, target, dep) in self.edges() {
            let (sp, tp) = (package_of(source), package_of(target));
            if sp != tp {
                collapsed.entry((sp, tp)).or_default().merge(dep);
            }
        }
        for ((sp, tp), dep) in collapsed {
            let s = view.index[sp];
            let t = view.index[tp];
            view.graph.add_edge(s, t, dep);
        }
        view
    }

    /// Sorted adjacency lists keyed by sorted node name
    pub(crate) fn sorted_adjacency(&self) -> Vec<(&str, Vec<&str>)> {
        self.node_names()
            .into_iter()
            .map(|n| (n, self.efferent(n)))
            .collect()
    }

    pub(crate) fn inner(&self) -> &DiGraph<Node, Dependency> {
        &self.graph
    }

    /// Every edge endpoint pair, used to check afferent/efferent symmetry
    pub fn edge_pairs(&self) -> FxHashSet<(String, String)> {
        self.graph
            .edge_references()
            .map(|e| {
                (
                    self.graph[e.source()].name.clone(),
                    self.graph[e.target()].name.clone(),
                )
            })
            .collect()
    }
}
