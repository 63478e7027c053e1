//! Cohesion metrics
//!
//! All variants work on the eligible methods of one type and the set of the
//! type's own fields each method touches:
//!
//! - **LCOM1**: `max(0, P - Q)`, P = pairs sharing no field, Q = pairs sharing one
//! - **LCOM2**: `1 - connected/total`, connected = pairs linked through a
//!   chain of shared fields
//! - **TCC**: directly connected pairs / total pairs
//! - **LCC**: transitively connected pairs / total pairs
//! - **LCOM4**: connected components when shared fields and intra-type calls
//!   both link methods
//! - **CAM**: `Σ|Pᵢ| / (k·l)` over parameter types
//!
//! A type with at most one eligible method is maximally cohesive.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::bytecode::InstructionEvent;
use crate::classfile::{MemberKind, MemberModel, TypeModel};

/// What one method touches inside its declaring type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodUsage {
    pub signature: String,
    pub fields: BTreeSet<String>,
    /// Signatures of other eligible methods of the same type it calls
    pub calls: BTreeSet<String>,
    pub parameter_types: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CohesionMetrics {
    pub eligible_methods: usize,
    pub lcom1: usize,
    pub lcom2: f64,
    pub lcom4: usize,
    pub tcc: f64,
    pub lcc: f64,
    pub cam: f64,
}

/// Whether a method takes part in cohesion metrics
pub fn is_eligible(method: &MemberModel) -> bool {
    let flags = method.modifiers;
    method.kind == MemberKind::Method
        && !method.is_static_initializer()
        && !flags.is_abstract()
        && !flags.is_native()
        && !flags.is_synthetic()
        && !flags.is_bridge()
        && !method.name.starts_with("access$")
}

/// Per-method usage sets for the eligible methods of a type
pub fn method_usages(model: &TypeModel) -> Vec<MethodUsage> {
    let own_fields: FxHashSet<&str> = model.fields.iter().map(|f| f.name.as_str()).collect();
    let eligible: Vec<&MemberModel> = model.methods.iter().filter(|m| is_eligible(m)).collect();
    let eligible_signatures: FxHashSet<String> = eligible.iter().map(|m| m.signature()).collect();

    eligible
        .iter()
        .map(|method| {
            let signature = method.signature();
            let mut usage = MethodUsage {
                parameter_types: method
                    .parameter_types()
                    .iter()
                    .map(|t| format!("{:?}", t))
                    .collect(),
                signature,
                ..Default::default()
            };
            if let Some(summary) = &method.instructions {
                for event in &summary.events {
                    match event {
                        InstructionEvent::FieldAccess { owner, name, .. }
                            if owner == &model.name && own_fields.contains(name.as_str()) =>
                        {
                            usage.fields.insert(name.clone());
                        }
                        InstructionEvent::Call {
                            owner: Some(owner),
                            name,
                            descriptor,
                            ..
                        } if owner == &model.name => {
                            let callee = format!("{}{}", name, descriptor);
                            if callee != usage.signature && eligible_signatures.contains(&callee) {
                                usage.calls.insert(callee);
                            }
                        }
                        _ => {}
                    }
                }
            }
            usage
        })
        .collect()
}

pub fn compute(usages: &[MethodUsage]) -> CohesionMetrics {
    let n = usages.len();
    let cam = cohesion_among_methods(usages);

    if n <= 1 {
        return CohesionMetrics {
            eligible_methods: n,
            lcom1: 0,
            lcom2: 0.0,
            lcom4: n,
            tcc: 1.0,
            lcc: 1.0,
            cam,
        };
    }

    let total_pairs = n * (n - 1) / 2;
    let mut sharing = 0usize;
    let mut field_links = DisjointSet::new(n);
    let mut all_links = DisjointSet::new(n);

    for i in 0..n {
        for j in (i + 1)..n {
            let shares = !usages[i].fields.is_disjoint(&usages[j].fields);
            if shares {
                sharing += 1;
                field_links.union(i, j);
                all_links.union(i, j);
            }
            if usages[i].calls.contains(&usages[j].signature)
                || usages[j].calls.contains(&usages[i].signature)
            {
                all_links.union(i, j);
            }
        }
    }

    let non_sharing = total_pairs - sharing;
    let connected_pairs: usize = field_links
        .component_sizes()
        .into_iter()
        .map(|size| size * (size - 1) / 2)
        .sum();

    let tcc = sharing as f64 / total_pairs as f64;
    let lcc = connected_pairs as f64 / total_pairs as f64;

    CohesionMetrics {
        eligible_methods: n,
        lcom1: non_sharing.saturating_sub(sharing),
        lcom2: 1.0 - lcc,
        lcom4: all_links.component_sizes().len(),
        tcc,
        lcc,
        cam,
    }
}

/// Σ|Pᵢ| / (k·l); 1 when there are no methods or no parameter types
fn cohesion_among_methods(usages: &[MethodUsage]) -> f64 {
    let all_types: BTreeSet<&String> = usages.iter().flat_map(|u| &u.parameter_types).collect();
    let k = usages.len();
    let l = all_types.len();
    if k == 0 || l == 0 {
        return 1.0;
    }
    let sum: usize = usages.iter().map(|u| u.parameter_types.len()).sum();
    sum as f64 / (k * l) as f64
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }

    fn component_sizes(&mut self) -> Vec<usize> {
        let n = self.parent.len();
        let mut sizes = vec![0usize; n];
        for i in 0..n {
            let root = self.find(i);
            sizes[root] += 1;
        }
        sizes.into_iter().filter(|&s| s > 0).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{CallKind, FieldAccessKind, InstructionSummary};
    use crate::classfile::{AccessFlags, TypeKind};

    fn usage(sig: &str, fields: &[&str]) -> MethodUsage {
        MethodUsage {
            signature: sig.to_string(),
            fields: fields.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_disjoint_fields() {
        let m = compute(&[usage("a()V", &["x"]), usage("b()V", &["y"]), usage("c()V", &["z"])]);
        assert_eq!(m.lcom2, 1.0);
        assert_eq!(m.tcc, 0.0);
        assert_eq!(m.lcom1, 3);
        assert_eq!(m.lcom4, 3);
    }

    #[test]
    fn test_full_field_set() {
        let all = ["x", "y"];
        let m = compute(&[usage("a()V", &all), usage("b()V", &all), usage("c()V", &all)]);
        assert_eq!(m.lcom2, 0.0);
        assert_eq!(m.tcc, 1.0);
        assert_eq!(m.lcom1, 0);
        assert_eq!(m.lcom4, 1);
    }

    #[test]
    fn test_single_method_is_cohesive() {
        let m = compute(&[usage("a()V", &["x"])]);
        assert_eq!(m.lcom2, 0.0);
        assert_eq!(m.tcc, 1.0);
        let empty = compute(&[]);
        assert_eq!(empty.lcom2, 0.0);
        assert_eq!(empty.tcc, 1.0);
        assert_eq!(empty.lcom4, 0);
    }

    #[test]
    fn test_transitive_links_raise_lcc_not_tcc() {
        // a-b share x, b-c share y: a and c connected only transitively
        let m = compute(&[
            usage("a()V", &["x"]),
            usage("b()V", &["x", "y"]),
            usage("c()V", &["y"]),
        ]);
        assert!((m.tcc - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(m.lcc, 1.0);
        assert_eq!(m.lcom2, 0.0);
        assert_eq!(m.lcom1, 0);
    }

    #[test]
    fn test_calls_join_lcom4_components() {
        let mut a = usage("a()V", &["x"]);
        a.calls.insert("b()V".into());
        let m = compute(&[a, usage("b()V", &["y"])]);
        assert_eq!(m.lcom4, 1);
        assert_eq!(m.tcc, 0.0);
    }

    #[test]
    fn test_cam() {
        let mut a = usage("a(I)V", &[]);
        a.parameter_types.insert("I".into());
        let mut b = usage("b(IJ)V", &[]);
        b.parameter_types.insert("I".into());
        b.parameter_types.insert("J".into());
        // (1 + 2) / (2 * 2)
        assert!((compute(&[a, b]).cam - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_usages_from_model() {
        let get = |field: &str| InstructionEvent::FieldAccess {
            owner: "app.Cart".into(),
            name: field.into(),
            descriptor: "I".into(),
            kind: FieldAccessKind::Get,
        };
        let foreign = InstructionEvent::FieldAccess {
            owner: "app.Other".into(),
            name: "items".into(),
            descriptor: "I".into(),
            kind: FieldAccessKind::Get,
        };
        let self_call = InstructionEvent::Call {
            owner: Some("app.Cart".into()),
            name: "total".into(),
            descriptor: "()I".into(),
            kind: CallKind::Virtual,
        };
        let model = TypeModel::new("app.Cart", TypeKind::Class)
            .with_field(MemberModel::field("items", "I"))
            .with_method(MemberModel::method("<init>", "()V").with_instructions(
                InstructionSummary::from_events(vec![get("items")]),
            ))
            .with_method(MemberModel::method("total", "()I").with_instructions(
                InstructionSummary::from_events(vec![get("items"), foreign]),
            ))
            .with_method(MemberModel::method("print", "()V").with_instructions(
                InstructionSummary::from_events(vec![self_call]),
            ))
            .with_method(
                MemberModel::method("access$000", "(Lapp/Cart;)I")
                    .with_modifiers(AccessFlags::new(AccessFlags::STATIC | AccessFlags::SYNTHETIC)),
            );

        let usages = method_usages(&model);
        assert_eq!(usages.len(), 2);
        assert_eq!(usages[0].signature, "total()I");
        assert_eq!(usages[0].fields.len(), 1);
        assert!(usages[1].calls.contains("total()I"));
    }
}
