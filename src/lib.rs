//! # LS-8 Emulator
//!
//! An emulator for the LS-8, a small 8-bit register machine with 256 bytes
//! of memory, eight registers and a downward-growing stack.
//!
//! A [`Cpu`] owns all of its state, so any number of machines can run side
//! by side. Programs are loaded from the binary-literal text format by
//! [`loader`], and PRN output goes to whatever [`std::io::Write`] the caller
//! hands to [`Cpu::run`].

pub mod cpu;
pub mod disasm;
pub mod loader;
pub mod session;

// Re-export commonly used types
pub use cpu::{Cpu, CpuState, CpuError, Memory, Registers, Flags, Instruction};
pub use disasm::disassemble;
pub use loader::{load_program, parse_program, LoadError};
pub use session::{run_file, run_image, RunOptions, RunReport};
