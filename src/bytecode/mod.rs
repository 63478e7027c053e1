//! Instruction walking
//!
//! Streams a method's `Code` attribute and classifies each instruction into
//! member calls, field accesses, constructions, casts and decision points.
//!
//! ```text
//! code bytes ──► walk() ──► InstructionSummary
//!                  │          ├─ events: Call | FieldAccess | Construction | Cast | Branch
//!                  │          ├─ decision_points (conditional jumps, switch arms, handlers)
//!                  │          └─ warning (partial decode)
//!                  └─ constant pool lookups for owners / names / descriptors
//! ```

pub mod opcodes;
mod walker;

pub use walker::{walk, ExceptionHandler};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    Virtual,
    Special,
    Static,
    Interface,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldAccessKind {
    Get,
    Put,
    GetStatic,
    PutStatic,
}

impl FieldAccessKind {
    pub fn is_write(&self) -> bool {
        matches!(self, FieldAccessKind::Put | FieldAccessKind::PutStatic)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastKind {
    CheckCast,
    InstanceOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BranchKind {
    Conditional,
    /// Switch with the number of non-default arms
    Switch { arms: u32 },
    /// Exception handler entry
    Handler,
}

/// One classified instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InstructionEvent {
    Call {
        /// Dotted owner type; `None` for `invokedynamic` call sites
        owner: Option<String>,
        name: String,
        descriptor: String,
        kind: CallKind,
    },
    FieldAccess {
        owner: String,
        name: String,
        descriptor: String,
        kind: FieldAccessKind,
    },
    Construction {
        type_name: String,
    },
    Cast {
        type_name: String,
        kind: CastKind,
    },
    Branch {
        offset: u32,
        kind: BranchKind,
    },
}

/// Classified view of one method body
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InstructionSummary {
    pub events: Vec<InstructionEvent>,
    /// Conditional jumps + non-default switch arms + typed exception handlers
    pub decision_points: u32,
    pub instruction_count: u32,
    pub code_length: u32,
    /// Set when decoding stopped early
    pub warning: Option<String>,
}

impl InstructionSummary {
    /// McCabe complexity: decision points + 1
    pub fn complexity(&self) -> u32 {
        self.decision_points + 1
    }

    /// Summary carrying only the given events; decision points are derived
    /// from the branch events.
    pub fn from_events(events: Vec<InstructionEvent>) -> Self {
        let decision_points = events
            .iter()
            .map(|e| match e {
                InstructionEvent::Branch {
                    kind: BranchKind::Switch { arms },
                    ..
                } => *arms,
                InstructionEvent::Branch { .. } => 1,
                _ => 0,
            })
            .sum();
        Self {
            instruction_count: events.len() as u32,
            events,
            decision_points,
            code_length: 0,
            warning: None,
        }
    }

    pub fn calls(&self) -> impl Iterator<Item = &InstructionEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, InstructionEvent::Call { .. }))
    }

    pub fn field_accesses(&self) -> impl Iterator<Item = &InstructionEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, InstructionEvent::FieldAccess { .. }))
    }

    pub fn call_count(&self) -> usize {
        self.calls().count()
    }

    pub fn field_access_count(&self) -> usize {
        self.field_accesses().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary_has_complexity_one() {
        assert_eq!(InstructionSummary::default().complexity(), 1);
    }

    #[test]
    fn test_from_events_counts_branches() {
        let summary = InstructionSummary::from_events(vec![
            InstructionEvent::Branch { offset: 0, kind: BranchKind::Conditional },
            InstructionEvent::Branch { offset: 4, kind: BranchKind::Switch { arms: 3 } },
            InstructionEvent::Construction { type_name: "a.B".into() },
        ]);
        assert_eq!(summary.decision_points, 4);
        assert_eq!(summary.complexity(), 5);
    }
}
