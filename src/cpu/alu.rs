//! Arithmetic-logic unit.
//!
//! Every operation takes two register indices. The result lands in the
//! first register, except CMP which only touches the flags. All
//! arithmetic wraps at the byte width.

use crate::cpu::registers::{Flags, Registers};
use crate::cpu::execute::CpuError;
use serde::{Serialize, Deserialize};

/// ALU operator, identified by the low nibble of an ALU opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    Div,
    Cmp,
}

impl AluOp {
    /// Decode an operator tag.
    pub fn from_tag(tag: u8) -> Result<Self, CpuError> {
        match tag {
            0x0 => Ok(AluOp::Add),
            0x1 => Ok(AluOp::Sub),
            0x2 => Ok(AluOp::Mul),
            0x3 => Ok(AluOp::Div),
            0x7 => Ok(AluOp::Cmp),
            other => Err(CpuError::UnsupportedOperation(other)),
        }
    }

    /// Operator tag carried by an ALU opcode byte.
    pub fn from_opcode(opcode: u8) -> Result<Self, CpuError> {
        Self::from_tag(opcode & 0x0F)
    }
}

/// Apply `op` to registers `a` and `b`.
pub fn execute(
    op: AluOp,
    regs: &mut Registers,
    flags: &mut Flags,
    a: u8,
    b: u8,
) -> Result<(), CpuError> {
    let lhs = regs.get(a)?;
    let rhs = regs.get(b)?;

    let result = match op {
        AluOp::Add => lhs.wrapping_add(rhs),
        AluOp::Sub => lhs.wrapping_sub(rhs),
        AluOp::Mul => lhs.wrapping_mul(rhs),
        AluOp::Div => lhs.checked_div(rhs).ok_or(CpuError::DivideByZero)?,
        AluOp::Cmp => {
            flags.compare(lhs, rhs);
            return Ok(());
        }
    };

    regs.set(a, result)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regs_with(a: u8, b: u8) -> Registers {
        let mut regs = Registers::new();
        regs.set(0, a).unwrap();
        regs.set(1, b).unwrap();
        regs
    }

    fn run(op: AluOp, a: u8, b: u8) -> Result<(Registers, Flags), CpuError> {
        let mut regs = regs_with(a, b);
        let mut flags = Flags::default();
        execute(op, &mut regs, &mut flags, 0, 1)?;
        Ok((regs, flags))
    }

    #[test]
    fn test_arithmetic_wraps() {
        assert_eq!(run(AluOp::Add, 200, 100).unwrap().0.get(0).unwrap(), 44);
        assert_eq!(run(AluOp::Sub, 3, 5).unwrap().0.get(0).unwrap(), 254);
        assert_eq!(run(AluOp::Mul, 16, 17).unwrap().0.get(0).unwrap(), 16);
        assert_eq!(run(AluOp::Mul, 8, 9).unwrap().0.get(0).unwrap(), 72);
    }

    #[test]
    fn test_operand_b_untouched() {
        let (regs, _) = run(AluOp::Add, 1, 2).unwrap();
        assert_eq!(regs.get(1).unwrap(), 2);
    }

    #[test]
    fn test_integer_division() {
        let (regs, _) = run(AluOp::Div, 17, 5).unwrap();
        assert_eq!(regs.get(0).unwrap(), 3);
    }

    #[test]
    fn test_divide_by_zero_leaves_registers() {
        let mut regs = regs_with(17, 0);
        let mut flags = Flags::default();

        let err = execute(AluOp::Div, &mut regs, &mut flags, 0, 1).unwrap_err();

        assert!(matches!(err, CpuError::DivideByZero));
        assert_eq!(regs, regs_with(17, 0));
    }

    #[test]
    fn test_cmp_only_touches_flags() {
        let (regs, flags) = run(AluOp::Cmp, 4, 9).unwrap();

        assert!(flags.less_than);
        assert!(!flags.equal && !flags.greater_than);
        assert_eq!(regs, regs_with(4, 9));
    }

    #[test]
    fn test_bad_register_index() {
        let mut regs = Registers::new();
        let mut flags = Flags::default();

        let err = execute(AluOp::Add, &mut regs, &mut flags, 0, 8).unwrap_err();
        assert!(matches!(err, CpuError::RegisterOutOfBounds(_)));
    }

    #[test]
    fn test_operator_tags() {
        assert_eq!(AluOp::from_opcode(0xA2).unwrap(), AluOp::Mul);
        assert_eq!(AluOp::from_opcode(0xA7).unwrap(), AluOp::Cmp);
        assert!(matches!(
            AluOp::from_tag(0x5),
            Err(CpuError::UnsupportedOperation(0x5))
        ));
    }
}
