//! Opcode table and instruction decoding for the LS-8.
//!
//! Opcodes are laid out as `AABCDDDD`:
//! - `AA`: number of operand bytes that follow
//! - `B`: set for ALU instructions
//! - `C`: set for instructions that write the PC
//! - `DDDD`: instruction identifier
//!
//! The operand count and PC behavior are still spelled out per opcode in
//! [`OPCODES`]; the bit layout is only checked against it in tests.

use serde::{Serialize, Deserialize};

pub const HLT: u8 = 0b0000_0001;
pub const LDI: u8 = 0b1000_0010;
pub const PRN: u8 = 0b0100_0111;
pub const ADD: u8 = 0b1010_0000;
pub const SUB: u8 = 0b1010_0001;
pub const MUL: u8 = 0b1010_0010;
pub const DIV: u8 = 0b1010_0011;
pub const CMP: u8 = 0b1010_0111;
pub const PUSH: u8 = 0b0100_0101;
pub const POP: u8 = 0b0100_0110;
pub const CALL: u8 = 0b0101_0000;
pub const RET: u8 = 0b0001_0001;
pub const JMP: u8 = 0b0101_0100;
pub const JEQ: u8 = 0b0101_0101;
pub const JNE: u8 = 0b0101_0110;

/// Which routine executes an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handler {
    Halt,
    LoadImmediate,
    Print,
    /// ALU operation; the operator is taken from the opcode's low nibble.
    Alu,
    Push,
    Pop,
    Call,
    Return,
    Jump,
    JumpIfEqual,
    JumpIfNotEqual,
}

/// How an instruction treats the program counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PcControl {
    /// The control unit advances past the instruction.
    Advance,
    /// The handler always sets the PC.
    Redirect,
    /// The handler sets the PC when its condition holds, otherwise the
    /// control unit advances.
    Conditional,
}

/// Static metadata for one opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpInfo {
    pub opcode: u8,
    pub mnemonic: &'static str,
    pub operands: u8,
    pub pc: PcControl,
    pub handler: Handler,
}

impl OpInfo {
    /// Size of the instruction in bytes.
    pub const fn width(&self) -> usize {
        1 + self.operands as usize
    }
}

const fn op(opcode: u8, mnemonic: &'static str, operands: u8, pc: PcControl, handler: Handler) -> OpInfo {
    OpInfo { opcode, mnemonic, operands, pc, handler }
}

/// Every opcode the LS-8 understands.
pub const OPCODES: &[OpInfo] = &[
    op(HLT, "HLT", 0, PcControl::Advance, Handler::Halt),
    op(LDI, "LDI", 2, PcControl::Advance, Handler::LoadImmediate),
    op(PRN, "PRN", 1, PcControl::Advance, Handler::Print),
    op(ADD, "ADD", 2, PcControl::Advance, Handler::Alu),
    op(SUB, "SUB", 2, PcControl::Advance, Handler::Alu),
    op(MUL, "MUL", 2, PcControl::Advance, Handler::Alu),
    op(DIV, "DIV", 2, PcControl::Advance, Handler::Alu),
    op(CMP, "CMP", 2, PcControl::Advance, Handler::Alu),
    op(PUSH, "PUSH", 1, PcControl::Advance, Handler::Push),
    op(POP, "POP", 1, PcControl::Advance, Handler::Pop),
    op(CALL, "CALL", 1, PcControl::Redirect, Handler::Call),
    op(RET, "RET", 0, PcControl::Redirect, Handler::Return),
    op(JMP, "JMP", 1, PcControl::Redirect, Handler::Jump),
    op(JEQ, "JEQ", 1, PcControl::Conditional, Handler::JumpIfEqual),
    op(JNE, "JNE", 1, PcControl::Conditional, Handler::JumpIfNotEqual),
];

const fn build_dispatch() -> [Option<OpInfo>; 256] {
    let mut table = [None; 256];
    let mut i = 0;
    while i < OPCODES.len() {
        table[OPCODES[i].opcode as usize] = Some(OPCODES[i]);
        i += 1;
    }
    table
}

static DISPATCH: [Option<OpInfo>; 256] = build_dispatch();

/// Look up the metadata for an opcode byte.
#[inline]
pub fn lookup(opcode: u8) -> Option<&'static OpInfo> {
    DISPATCH[opcode as usize].as_ref()
}

/// A fetched instruction: the opcode's metadata plus the two bytes that
/// followed it in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// Address the opcode was fetched from.
    pub pc: usize,
    pub info: &'static OpInfo,
    pub operand_a: u8,
    pub operand_b: u8,
}

impl Instruction {
    pub fn width(&self) -> usize {
        self.info.width()
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let info = self.info;
        match (info.handler, info.operands) {
            (_, 0) => write!(f, "{}", info.mnemonic),
            (Handler::LoadImmediate, _) => {
                write!(f, "{} R{}, {}", info.mnemonic, self.operand_a, self.operand_b)
            }
            (_, 1) => write!(f, "{} R{}", info.mnemonic, self.operand_a),
            _ => write!(f, "{} R{}, R{}", info.mnemonic, self.operand_a, self.operand_b),
        }
    }
}
