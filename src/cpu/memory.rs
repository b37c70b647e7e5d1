//! LS-8 memory subsystem.
//!
//! A flat, zero-initialized array of 256 bytes. The stack lives in the
//! same storage and obeys the same bounds rules.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of addressable bytes.
pub const MEMORY_SIZE: usize = 256;

/// LS-8 memory: 256 bytes.
#[derive(Clone, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<u8>,
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Read a byte.
    #[inline]
    pub fn read(&self, addr: usize) -> Result<u8, MemoryError> {
        self.cells
            .get(addr)
            .copied()
            .ok_or(MemoryError::AddressOutOfRange(addr))
    }

    /// Write a byte.
    #[inline]
    pub fn write(&mut self, addr: usize, value: u8) -> Result<(), MemoryError> {
        let cell = self.cells
            .get_mut(addr)
            .ok_or(MemoryError::AddressOutOfRange(addr))?;
        *cell = value;
        Ok(())
    }

    /// Read without faulting. Used by the trace dump, which must be able
    /// to describe a PC sitting at the very end of memory.
    pub fn peek(&self, addr: usize) -> Option<u8> {
        self.cells.get(addr).copied()
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Load a program image into memory starting at the given address.
    pub fn load_program(&mut self, start_addr: usize, program: &[u8]) -> Result<(), MemoryError> {
        let available = MEMORY_SIZE.saturating_sub(start_addr);
        if start_addr > MEMORY_SIZE || program.len() > available {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available,
            });
        }

        self.cells[start_addr..start_addr + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Dump memory contents (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, u8)> {
        let end = start.saturating_add(count).min(MEMORY_SIZE);
        (start.min(end)..end)
            .map(|i| (i, self.cells[i]))
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&b| b != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Address is outside valid memory range.
    #[error("memory address {0:#x} out of range (0x00-0xFF)")]
    AddressOutOfRange(usize),

    /// Push with the stack pointer already at address 0.
    #[error("stack overflow: push below address 0x00")]
    StackOverflow,

    /// Pop with the stack pointer at the top of memory.
    #[error("stack underflow: pop past address 0xFF")]
    StackUnderflow,

    /// Program is too large to fit in memory.
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}
