//! Cyclomatic complexity
//!
//! Per-method complexity is the walker's decision-point count plus one.
//! Methods without a body (abstract, native) report 1 but stay out of the
//! type aggregates, as do compiler bridge methods.

use serde::{Deserialize, Serialize};

use crate::classfile::{MemberModel, TypeModel};

/// Complexity of one executable member (1 when it has no body)
pub fn method_complexity(method: &MemberModel) -> u32 {
    method
        .instructions
        .as_ref()
        .map(|s| s.complexity())
        .unwrap_or(1)
}

/// Whether a method contributes to type-level aggregates
pub fn counts_toward_type(method: &MemberModel) -> bool {
    method.is_executable() && method.instructions.is_some() && !method.modifiers.is_bridge()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexityStats {
    /// Weighted methods per class (sum of complexities)
    pub sum: u32,
    pub max: u32,
    pub mean: f64,
    pub methods: usize,
}

pub fn type_complexity(model: &TypeModel) -> ComplexityStats {
    let values: Vec<u32> = model
        .methods
        .iter()
        .filter(|m| counts_toward_type(m))
        .map(method_complexity)
        .collect();

    if values.is_empty() {
        return ComplexityStats::default();
    }

    let sum: u32 = values.iter().sum();
    ComplexityStats {
        sum,
        max: values.iter().copied().max().unwrap_or(0),
        mean: sum as f64 / values.len() as f64,
        methods: values.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{BranchKind, InstructionEvent, InstructionSummary};
    use crate::classfile::{AccessFlags, TypeKind};

    fn branches(n: usize) -> InstructionSummary {
        InstructionSummary::from_events(
            (0..n)
                .map(|i| InstructionEvent::Branch {
                    offset: i as u32 * 4,
                    kind: BranchKind::Conditional,
                })
                .collect(),
        )
    }

    #[test]
    fn test_n_branches_gives_n_plus_one() {
        let m = MemberModel::method("f", "()V").with_instructions(branches(4));
        assert_eq!(method_complexity(&m), 5);
        let flat = MemberModel::method("g", "()V").with_instructions(branches(0));
        assert_eq!(method_complexity(&flat), 1);
    }

    #[test]
    fn test_abstract_reports_one_but_is_excluded() {
        let abstract_method = MemberModel::method("a", "()V")
            .with_modifiers(AccessFlags::new(AccessFlags::PUBLIC | AccessFlags::ABSTRACT));
        assert_eq!(method_complexity(&abstract_method), 1);

        let model = TypeModel::new("x.T", TypeKind::Class)
            .with_method(abstract_method)
            .with_method(MemberModel::method("b", "()V").with_instructions(branches(2)))
            .with_method(MemberModel::method("c", "()V").with_instructions(branches(0)))
            .with_method(
                MemberModel::method("c", "()Ljava/lang/Object;")
                    .with_modifiers(AccessFlags::new(
                        AccessFlags::PUBLIC | AccessFlags::SYNTHETIC | AccessFlags::VOLATILE_OR_BRIDGE,
                    ))
                    .with_instructions(branches(0)),
            );
        let stats = type_complexity(&model);
        assert_eq!(stats.methods, 2);
        assert_eq!(stats.sum, 4);
        assert_eq!(stats.max, 3);
        assert_eq!(stats.mean, 2.0);
    }

    #[test]
    fn test_bodiless_type_has_zero_aggregates() {
        let iface = TypeModel::new("x.I", TypeKind::Interface).with_method(
            MemberModel::method("a", "()V")
                .with_modifiers(AccessFlags::new(AccessFlags::PUBLIC | AccessFlags::ABSTRACT)),
        );
        assert_eq!(type_complexity(&iface), ComplexityStats::default());
    }
}
