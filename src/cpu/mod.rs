//! CPU emulation for the LS-8.
//!
//! This module implements the complete LS-8 architecture:
//! - 256 bytes of memory
//! - 8 byte registers, R7 being the stack pointer
//! - an equal/less/greater flags register
//! - 15 instructions dispatched through a static opcode table

pub mod memory;
pub mod registers;
pub mod alu;
pub mod decode;
pub mod execute;

pub use memory::{Memory, MemoryError};
pub use registers::{Flags, Registers, RegisterError};
pub use alu::AluOp;
pub use decode::{Instruction, OpInfo, Handler, PcControl};
pub use execute::{Cpu, CpuError, CpuState};
