//! JVM opcode constants and operand layout

pub const IFEQ: u8 = 0x99;
pub const IF_ACMPNE: u8 = 0xa6;
pub const GOTO: u8 = 0xa7;
pub const JSR: u8 = 0xa8;
pub const RET: u8 = 0xa9;
pub const TABLESWITCH: u8 = 0xaa;
pub const LOOKUPSWITCH: u8 = 0xab;
pub const GETSTATIC: u8 = 0xb2;
pub const PUTSTATIC: u8 = 0xb3;
pub const GETFIELD: u8 = 0xb4;
pub const PUTFIELD: u8 = 0xb5;
pub const INVOKEVIRTUAL: u8 = 0xb6;
pub const INVOKESPECIAL: u8 = 0xb7;
pub const INVOKESTATIC: u8 = 0xb8;
pub const INVOKEINTERFACE: u8 = 0xb9;
pub const INVOKEDYNAMIC: u8 = 0xba;
pub const NEW: u8 = 0xbb;
pub const ANEWARRAY: u8 = 0xbd;
pub const CHECKCAST: u8 = 0xc0;
pub const INSTANCEOF: u8 = 0xc1;
pub const WIDE: u8 = 0xc4;
pub const MULTIANEWARRAY: u8 = 0xc5;
pub const IFNULL: u8 = 0xc6;
pub const IFNONNULL: u8 = 0xc7;
pub const GOTO_W: u8 = 0xc8;
pub const JSR_W: u8 = 0xc9;

const IINC: u8 = 0x84;

/// Conditional jumps: `ifeq`..`if_acmpne`, `ifnull`, `ifnonnull`
pub fn is_conditional_branch(op: u8) -> bool {
    (IFEQ..=IF_ACMPNE).contains(&op) || op == IFNULL || op == IFNONNULL
}

/// Fixed operand length in bytes for opcodes with a static layout.
///
/// Returns `None` for the variable-length opcodes (`tableswitch`,
/// `lookupswitch`, `wide`) and for bytes that are not defined opcodes.
pub fn operand_length(op: u8) -> Option<usize> {
    let len = match op {
        0x00..=0x0f => 0,              // nop, constants
        0x10 => 1,                     // bipush
        0x11 => 2,                     // sipush
        0x12 => 1,                     // ldc
        0x13 | 0x14 => 2,              // ldc_w, ldc2_w
        0x15..=0x19 => 1,              // xload idx
        0x1a..=0x35 => 0,              // xload_n, xaload
        0x36..=0x3a => 1,              // xstore idx
        0x3b..=0x83 => 0,              // xstore_n, xastore, stack, arithmetic
        IINC => 2,
        0x85..=0x98 => 0,              // conversions, comparisons
        IFEQ..=JSR => 2,               // conditional branches, goto, jsr
        RET => 1,
        0xac..=0xb1 => 0,              // returns
        GETSTATIC..=INVOKESTATIC => 2, // field access, invoke*
        INVOKEINTERFACE | INVOKEDYNAMIC => 4,
        NEW => 2,
        0xbc => 1, // newarray
        ANEWARRAY => 2,
        0xbe | 0xbf => 0, // arraylength, athrow
        CHECKCAST | INSTANCEOF => 2,
        0xc2 | 0xc3 => 0, // monitorenter, monitorexit
        MULTIANEWARRAY => 3,
        IFNULL | IFNONNULL => 2,
        GOTO_W | JSR_W => 4,
        _ => return None,
    };
    Some(len)
}

/// Operand length following a `wide` prefix for the modified opcode
pub fn wide_operand_length(op: u8) -> Option<usize> {
    match op {
        IINC => Some(4),
        0x15..=0x19 | 0x36..=0x3a | RET => Some(2),
        _ => None,
    }
}
