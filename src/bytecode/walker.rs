//! Linear-sweep decoder over a `Code` attribute

use std::collections::BTreeSet;

use tracing::debug;

use super::opcodes::{self, *};
use super::{
    BranchKind, CallKind, CastKind, FieldAccessKind, InstructionEvent, InstructionSummary,
};
use crate::classfile::constant_pool::ConstantPool;
use crate::classfile::descriptor::{class_constant_to_type, internal_to_dotted};

/// One entry of a method's exception table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionHandler {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    /// Constant-pool index of the caught type; 0 for `finally`
    pub catch_type: u16,
}

/// Walk a method body and classify every instruction.
///
/// Decoding never fails outright: on a malformed stream the events decoded
/// so far are kept, decision points fall back to 0 and `warning` explains
/// where decoding stopped.
pub fn walk(code: &[u8], handlers: &[ExceptionHandler], pool: &ConstantPool) -> InstructionSummary {
    let mut walker = Walker {
        code,
        pool,
        pc: 0,
        events: Vec::new(),
        decision_points: 0,
        instruction_count: 0,
    };

    let outcome = walker.run();

    let mut summary = InstructionSummary {
        events: walker.events,
        decision_points: walker.decision_points,
        instruction_count: walker.instruction_count,
        code_length: code.len() as u32,
        warning: None,
    };

    match outcome {
        Ok(()) => {
            let mut seen = BTreeSet::new();
            for h in handlers.iter().filter(|h| h.catch_type != 0) {
                if seen.insert(h.handler_pc) {
                    summary.events.push(InstructionEvent::Branch {
                        offset: h.handler_pc as u32,
                        kind: BranchKind::Handler,
                    });
                    summary.decision_points += 1;
                }
            }
        }
        Err(message) => {
            debug!("Instruction decode stopped: {}", message);
            summary.decision_points = 0;
            summary.warning = Some(message);
        }
    }

    summary
}

struct Walker<'a> {
    code: &'a [u8],
    pool: &'a ConstantPool,
    pc: usize,
    events: Vec<InstructionEvent>,
    decision_points: u32,
    instruction_count: u32,
}

impl Walker<'_> {
    fn run(&mut self) -> Result<(), String> {
        while self.pc < self.code.len() {
            let start = self.pc;
            let op = self.code[start];
            self.instruction_count += 1;

            let next = match op {
                TABLESWITCH => self.table_switch(start)?,
                LOOKUPSWITCH => self.lookup_switch(start)?,
                WIDE => {
                    let modified = self.byte(start + 1)?;
                    let len = opcodes::wide_operand_length(modified).ok_or_else(|| {
                        format!("invalid wide opcode 0x{:02x} at {}", modified, start)
                    })?;
                    start + 2 + len
                }
                _ => {
                    let len = opcodes::operand_length(op)
                        .ok_or_else(|| format!("unknown opcode 0x{:02x} at {}", op, start))?;
                    if start + 1 + len > self.code.len() {
                        return Err(format!("truncated operands for 0x{:02x} at {}", op, start));
                    }
                    self.classify(op, start)?;
                    start + 1 + len
                }
            };

            if next > self.code.len() {
                return Err(format!("instruction at {} runs past end of code", start));
            }
            self.pc = next;
        }
        Ok(())
    }

    fn classify(&mut self, op: u8, pc: usize) -> Result<(), String> {
        let offset = pc as u32;
        match op {
            op if opcodes::is_conditional_branch(op) => {
                self.events.push(InstructionEvent::Branch {
                    offset,
                    kind: BranchKind::Conditional,
                });
                self.decision_points += 1;
            }
            GETSTATIC | PUTSTATIC | GETFIELD | PUTFIELD => {
                let member = self
                    .pool
                    .member_ref(self.u2(pc + 1)?)
                    .map_err(|e| format!("field access at {}: {}", pc, e))?;
                let kind = match op {
                    GETSTATIC => FieldAccessKind::GetStatic,
                    PUTSTATIC => FieldAccessKind::PutStatic,
                    GETFIELD => FieldAccessKind::Get,
                    _ => FieldAccessKind::Put,
                };
                self.events.push(InstructionEvent::FieldAccess {
                    owner: internal_to_dotted(&member.owner),
                    name: member.name,
                    descriptor: member.descriptor,
                    kind,
                });
            }
            INVOKEVIRTUAL | INVOKESPECIAL | INVOKESTATIC | INVOKEINTERFACE => {
                let member = self
                    .pool
                    .member_ref(self.u2(pc + 1)?)
                    .map_err(|e| format!("call at {}: {}", pc, e))?;
                let kind = match op {
                    INVOKEVIRTUAL => CallKind::Virtual,
                    INVOKESPECIAL => CallKind::Special,
                    INVOKESTATIC => CallKind::Static,
                    _ => CallKind::Interface,
                };
                // Calls on array receivers (`[I.clone()`) have no owning type
                self.events.push(InstructionEvent::Call {
                    owner: class_constant_to_type(&member.owner),
                    name: member.name,
                    descriptor: member.descriptor,
                    kind,
                });
            }
            INVOKEDYNAMIC => {
                let (name, descriptor) = self
                    .pool
                    .dynamic_site(self.u2(pc + 1)?)
                    .map_err(|e| format!("invokedynamic at {}: {}", pc, e))?;
                self.events.push(InstructionEvent::Call {
                    owner: None,
                    name: name.to_string(),
                    descriptor: descriptor.to_string(),
                    kind: CallKind::Dynamic,
                });
            }
            NEW | ANEWARRAY | MULTIANEWARRAY => {
                if let Some(type_name) = self.class_operand(pc)? {
                    self.events.push(InstructionEvent::Construction { type_name });
                }
            }
            CHECKCAST | INSTANCEOF => {
                if let Some(type_name) = self.class_operand(pc)? {
                    let kind = if op == CHECKCAST {
                        CastKind::CheckCast
                    } else {
                        CastKind::InstanceOf
                    };
                    self.events.push(InstructionEvent::Cast { type_name, kind });
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn class_operand(&self, pc: usize) -> Result<Option<String>, String> {
        let name = self
            .pool
            .class_name(self.u2(pc + 1)?)
            .map_err(|e| format!("class operand at {}: {}", pc, e))?;
        Ok(class_constant_to_type(name))
    }

    fn table_switch(&mut self, start: usize) -> Result<usize, String> {
        let mut pos = aligned(start);
        let default = self.i4(pos)?;
        let low = self.i4(pos + 4)?;
        let high = self.i4(pos + 8)?;
        pos += 12;
        if high < low {
            return Err(format!("tableswitch at {} has high < low", start));
        }
        let count = (high as i64 - low as i64 + 1) as usize;
        if count > self.code.len() {
            return Err(format!("tableswitch at {} is larger than the method", start));
        }
        let mut arms = 0;
        for i in 0..count {
            if self.i4(pos + i * 4)? != default {
                arms += 1;
            }
        }
        self.push_switch(start, arms);
        Ok(pos + count * 4)
    }

    fn lookup_switch(&mut self, start: usize) -> Result<usize, String> {
        let mut pos = aligned(start);
        let default = self.i4(pos)?;
        let npairs = self.i4(pos + 4)?;
        pos += 8;
        if npairs < 0 || npairs as usize > self.code.len() {
            return Err(format!("lookupswitch at {} has invalid pair count", start));
        }
        let mut arms = 0;
        for i in 0..npairs as usize {
            // match key at +0, jump offset at +4
            if self.i4(pos + i * 8 + 4)? != default {
                arms += 1;
            }
        }
        self.push_switch(start, arms);
        Ok(pos + npairs as usize * 8)
    }

    fn push_switch(&mut self, start: usize, arms: u32) {
        self.events.push(InstructionEvent::Branch {
            offset: start as u32,
            kind: BranchKind::Switch { arms },
        });
        self.decision_points += arms;
    }

    fn byte(&self, pos: usize) -> Result<u8, String> {
        self.code
            .get(pos)
            .copied()
            .ok_or_else(|| format!("unexpected end of code at {}", pos))
    }

    fn u2(&self, pos: usize) -> Result<u16, String> {
        Ok(u16::from_be_bytes([self.byte(pos)?, self.byte(pos + 1)?]))
    }

    fn i4(&self, pos: usize) -> Result<i32, String> {
        Ok(i32::from_be_bytes([
            self.byte(pos)?,
            self.byte(pos + 1)?,
            self.byte(pos + 2)?,
            self.byte(pos + 3)?,
        ]))
    }
}

/// First operand offset after a switch opcode: padded to a multiple of 4
fn aligned(opcode_pc: usize) -> usize {
    (opcode_pc + 4) & !3
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::reader::ByteReader;

    /// Pool: #1 Utf8 "a/B", #2 Class #1, #3 Utf8 "f", #4 Utf8 "I",
    /// #5 NameAndType #3 #4, #6 Fieldref #2 #5, #7 Utf8 "()V", #8 Utf8 "run",
    /// #9 NameAndType #8 #7, #10 Methodref #2 #9
    fn pool() -> ConstantPool {
        let mut bytes = 11u16.to_be_bytes().to_vec();
        bytes.extend_from_slice(&[1, 0, 3, b'a', b'/', b'B']);
        bytes.extend_from_slice(&[7, 0, 1]);
        bytes.extend_from_slice(&[1, 0, 1, b'f']);
        bytes.extend_from_slice(&[1, 0, 1, b'I']);
        bytes.extend_from_slice(&[12, 0, 3, 0, 4]);
        bytes.extend_from_slice(&[9, 0, 2, 0, 5]);
        bytes.extend_from_slice(&[1, 0, 3, b'(', b')', b'V']);
        bytes.extend_from_slice(&[1, 0, 3, b'r', b'u', b'n']);
        bytes.extend_from_slice(&[12, 0, 8, 0, 7]);
        bytes.extend_from_slice(&[10, 0, 2, 0, 9]);
        ConstantPool::parse(&mut ByteReader::new(&bytes)).unwrap()
    }

    #[test]
    fn test_branch_free_method() {
        // iconst_0; ireturn
        let s = walk(&[0x03, 0xac], &[], &pool());
        assert_eq!(s.decision_points, 0);
        assert_eq!(s.complexity(), 1);
        assert_eq!(s.instruction_count, 2);
        assert!(s.warning.is_none());
    }

    #[test]
    fn test_conditional_branches_count() {
        // iload_1; ifeq +3; iload_1; ifne +3; return
        let code = [0x1b, 0x99, 0x00, 0x03, 0x1b, 0x9a, 0x00, 0x03, 0xb1];
        let s = walk(&code, &[], &pool());
        assert_eq!(s.decision_points, 2);
        assert_eq!(s.complexity(), 3);
    }

    #[test]
    fn test_field_and_call_events() {
        // aload_0; getfield #6; aload_0; invokevirtual #10; new #2; return
        let code = [0x2a, 0xb4, 0, 6, 0x2a, 0xb6, 0, 10, 0xbb, 0, 2, 0xb1];
        let s = walk(&code, &[], &pool());
        assert_eq!(
            s.events,
            vec![
                InstructionEvent::FieldAccess {
                    owner: "a.B".into(),
                    name: "f".into(),
                    descriptor: "I".into(),
                    kind: FieldAccessKind::Get,
                },
                InstructionEvent::Call {
                    owner: Some("a.B".into()),
                    name: "run".into(),
                    descriptor: "()V".into(),
                    kind: CallKind::Virtual,
                },
                InstructionEvent::Construction { type_name: "a.B".into() },
            ]
        );
    }

    #[test]
    fn test_tableswitch_counts_non_default_arms() {
        // pc0 iload_1; pc1 tableswitch, pad to 4; default=20 low=0 high=2
        // targets: 10, 20 (== default), 30; then return
        let mut code = vec![0x1b, 0xaa, 0, 0];
        for v in [20i32, 0, 2, 10, 20, 30] {
            code.extend_from_slice(&v.to_be_bytes());
        }
        code.push(0xb1);
        let s = walk(&code, &[], &pool());
        assert_eq!(s.decision_points, 2);
        assert!(s.warning.is_none());
        assert_eq!(s.instruction_count, 3);
    }

    #[test]
    fn test_lookupswitch_alignment() {
        // pc0 lookupswitch, pad 3 bytes; default=9, npairs=2: (1 -> 9), (5 -> 12)
        let mut code = vec![0xab, 0, 0, 0];
        for v in [9i32, 2, 1, 9, 5, 12] {
            code.extend_from_slice(&v.to_be_bytes());
        }
        code.push(0xb1);
        let s = walk(&code, &[], &pool());
        assert_eq!(s.decision_points, 1);
        assert!(s.warning.is_none());
    }

    #[test]
    fn test_handlers_counted_once_per_target() {
        let handlers = [
            ExceptionHandler { start_pc: 0, end_pc: 1, handler_pc: 1, catch_type: 2 },
            ExceptionHandler { start_pc: 0, end_pc: 1, handler_pc: 1, catch_type: 2 },
            ExceptionHandler { start_pc: 0, end_pc: 1, handler_pc: 1, catch_type: 0 },
        ];
        let s = walk(&[0x00, 0xb1], &handlers, &pool());
        assert_eq!(s.decision_points, 1);
    }

    #[test]
    fn test_truncated_stream_degrades() {
        // ifeq with a missing operand byte
        let s = walk(&[0x1b, 0x99, 0x00, 0x03, 0x99, 0x00], &[], &pool());
        assert_eq!(s.decision_points, 0);
        assert_eq!(s.complexity(), 1);
        assert!(s.warning.is_some());
        assert_eq!(s.events.len(), 1);
    }

    #[test]
    fn test_unknown_opcode_degrades() {
        let s = walk(&[0xcb], &[], &pool());
        assert!(s.warning.is_some());
        assert_eq!(s.complexity(), 1);
    }

    #[test]
    fn test_alignment() {
        assert_eq!(aligned(0), 4);
        assert_eq!(aligned(1), 4);
        assert_eq!(aligned(3), 4);
        assert_eq!(aligned(4), 8);
    }
}
