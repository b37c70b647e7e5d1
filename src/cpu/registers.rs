//! LS-8 CPU registers.
//!
//! The LS-8 has 8 general purpose byte registers, R0-R7. R7 doubles as
//! the stack pointer. Comparison results live in a separate flags
//! register with three independent bits.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Number of general purpose registers.
pub const REGISTER_COUNT: usize = 8;

/// Index of the stack pointer register.
pub const SP: u8 = 7;

/// Address the stack pointer holds when a program starts.
pub const SP_INIT: u8 = 0xF4;

/// The LS-8 register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    regs: [u8; REGISTER_COUNT],
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self {
            regs: [0; REGISTER_COUNT],
        }
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        self.regs = [0; REGISTER_COUNT];
    }

    /// Read register `index`.
    #[inline]
    pub fn get(&self, index: u8) -> Result<u8, RegisterError> {
        self.regs
            .get(index as usize)
            .copied()
            .ok_or(RegisterError::IndexOutOfRange(index))
    }

    /// Write register `index`.
    #[inline]
    pub fn set(&mut self, index: u8, value: u8) -> Result<(), RegisterError> {
        let slot = self.regs
            .get_mut(index as usize)
            .ok_or(RegisterError::IndexOutOfRange(index))?;
        *slot = value;
        Ok(())
    }

    /// Current stack pointer.
    #[inline]
    pub fn sp(&self) -> u8 {
        self.regs[SP as usize]
    }

    #[inline]
    pub fn set_sp(&mut self, value: u8) {
        self.regs[SP as usize] = value;
    }

    /// All eight registers, R0 first.
    pub fn as_array(&self) -> &[u8; REGISTER_COUNT] {
        &self.regs
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// The flags register.
///
/// At most one bit is set at a time. Only CMP writes it; every other
/// instruction leaves it alone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    pub equal: bool,
    pub less_than: bool,
    pub greater_than: bool,
}

impl Flags {
    /// Record the outcome of comparing `a` against `b`.
    pub fn compare(&mut self, a: u8, b: u8) {
        *self = Flags::default();
        match a.cmp(&b) {
            std::cmp::Ordering::Equal => self.equal = true,
            std::cmp::Ordering::Less => self.less_than = true,
            std::cmp::Ordering::Greater => self.greater_than = true,
        }
    }

    /// Packed `00000LGE` form, as the hardware documents it.
    pub fn bits(&self) -> u8 {
        (self.less_than as u8) << 2 | (self.greater_than as u8) << 1 | self.equal as u8
    }
}

/// Errors from register file access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("register index {0} out of range (0-7)")]
    IndexOutOfRange(u8),
}
