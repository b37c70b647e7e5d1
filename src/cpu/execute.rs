//! CPU execution engine for the LS-8.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::cpu::{Memory, Registers};
use crate::cpu::alu::{self, AluOp};
use crate::cpu::decode::{self, Handler, Instruction, PcControl};
use crate::cpu::memory::MemoryError;
use crate::cpu::registers::{Flags, RegisterError, SP_INIT};
use serde::{Serialize, Deserialize};
use std::io::Write;
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has halted (executed HLT instruction).
    Halted,
    /// CPU stopped on a fault.
    Faulted,
}

/// What a handler did with the program counter.
enum Flow {
    Next,
    Jump(usize),
    Stop,
}

/// The LS-8 CPU.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// General purpose registers, R7 being the stack pointer.
    pub regs: Registers,
    /// Comparison flags.
    pub flags: Flags,
    /// Main memory.
    pub mem: Memory,
    /// Program counter.
    pub pc: usize,
    /// Current execution state.
    pub state: CpuState,
    /// Instruction count.
    pub cycles: u64,
    #[serde(skip)]
    last_instr: Option<Instruction>,
}

impl Cpu {
    /// Create a new CPU with zeroed memory and the stack pointer at its
    /// starting address.
    pub fn new() -> Self {
        let mut regs = Registers::new();
        regs.set_sp(SP_INIT);
        Self {
            regs,
            flags: Flags::default(),
            mem: Memory::new(),
            pc: 0,
            state: CpuState::Running,
            cycles: 0,
            last_instr: None,
        }
    }

    /// Reset the CPU to initial state.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.regs.set_sp(SP_INIT);
        self.flags = Flags::default();
        self.mem.clear();
        self.pc = 0;
        self.state = CpuState::Running;
        self.cycles = 0;
        self.last_instr = None;
    }

    /// Load a program image at address 0.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), MemoryError> {
        self.mem.load_program(0, program)
    }

    /// Execute a single instruction, writing any PRN output to `out`.
    ///
    /// Returns the instruction that was executed. A fault moves the CPU
    /// into [`CpuState::Faulted`] and leaves memory and registers as they
    /// were when it was raised.
    pub fn step<W: Write>(&mut self, out: &mut W) -> Result<Instruction, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        match self.fetch_and_execute(out) {
            Ok(instr) => {
                self.cycles += 1;
                self.last_instr = Some(instr);
                Ok(instr)
            }
            Err(e) => {
                log::debug!("fault at PC={:#04x}: {}", self.pc, e);
                self.state = CpuState::Faulted;
                Err(e)
            }
        }
    }

    fn fetch_and_execute<W: Write>(&mut self, out: &mut W) -> Result<Instruction, CpuError> {
        let pc = self.pc;
        let opcode = self.mem.read(pc)?;
        let info = decode::lookup(opcode);

        // HLT stops before the operand window is read.
        let (operand_a, operand_b) = match info {
            Some(info) if info.handler == Handler::Halt => (0, 0),
            _ => (self.mem.read(pc + 1)?, self.mem.read(pc + 2)?),
        };

        let info = info.ok_or(CpuError::IllegalInstruction { opcode, pc })?;
        let instr = Instruction { pc, info, operand_a, operand_b };
        log::debug!("{:02X}: {}", pc, instr);

        match self.execute(&instr, out)? {
            Flow::Next => self.pc = pc + instr.width(),
            Flow::Jump(target) => {
                debug_assert!(info.pc != PcControl::Advance, "{} redirected the PC", info.mnemonic);
                self.pc = target;
            }
            Flow::Stop => {}
        }

        Ok(instr)
    }

    /// Run until halt or error.
    ///
    /// Returns the number of instructions executed.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while self.state == CpuState::Running {
            self.step(out)?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited<W: Write>(&mut self, out: &mut W, max_cycles: u64) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let limit = self.cycles + max_cycles;

        while self.state == CpuState::Running && self.cycles < limit {
            self.step(out)?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Execute a decoded instruction.
    fn execute<W: Write>(&mut self, instr: &Instruction, out: &mut W) -> Result<Flow, CpuError> {
        let a = instr.operand_a;
        let b = instr.operand_b;

        let flow = match instr.info.handler {
            Handler::Halt => {
                self.state = CpuState::Halted;
                log::info!("halted at PC={:#04x} after {} instructions", instr.pc, self.cycles + 1);
                Flow::Stop
            }

            Handler::LoadImmediate => {
                self.regs.set(a, b)?;
                Flow::Next
            }

            Handler::Print => {
                let value = self.regs.get(a)?;
                writeln!(out, "Printing: {}", value)
                    .map_err(|e| CpuError::Output(e.to_string()))?;
                Flow::Next
            }

            Handler::Alu => {
                let op = AluOp::from_opcode(instr.info.opcode)?;
                alu::execute(op, &mut self.regs, &mut self.flags, a, b)?;
                Flow::Next
            }

            // ==================== Stack ====================

            Handler::Push => {
                let value = self.regs.get(a)?;
                self.push(value)?;
                Flow::Next
            }

            Handler::Pop => {
                // Validate the destination first so a bad index leaves SP alone.
                self.regs.get(a)?;
                let value = self.pop()?;
                self.regs.set(a, value)?;
                Flow::Next
            }

            // ==================== Control Flow ====================

            Handler::Call => {
                let target = self.regs.get(a)?;
                let return_addr = instr.pc + instr.width();
                let return_addr = u8::try_from(return_addr)
                    .map_err(|_| MemoryError::AddressOutOfRange(return_addr))?;
                self.push(return_addr)?;
                Flow::Jump(target as usize)
            }

            Handler::Return => Flow::Jump(self.pop()? as usize),

            Handler::Jump => Flow::Jump(self.regs.get(a)? as usize),

            Handler::JumpIfEqual => self.jump_if(self.flags.equal, a)?,

            Handler::JumpIfNotEqual => self.jump_if(!self.flags.equal, a)?,
        };

        Ok(flow)
    }

    fn jump_if(&self, taken: bool, reg: u8) -> Result<Flow, CpuError> {
        if taken {
            Ok(Flow::Jump(self.regs.get(reg)? as usize))
        } else {
            Ok(Flow::Next)
        }
    }

    /// Decrement SP, then store `value` at the new top of stack.
    fn push(&mut self, value: u8) -> Result<(), CpuError> {
        let sp = self.regs.sp();
        let new_sp = sp
            .checked_sub(1)
            .ok_or(MemoryError::StackOverflow)?;
        self.mem.write(new_sp as usize, value)?;
        self.regs.set_sp(new_sp);
        Ok(())
    }

    /// Read the top of stack, then increment SP.
    fn pop(&mut self) -> Result<u8, CpuError> {
        let sp = self.regs.sp();
        let new_sp = sp
            .checked_add(1)
            .ok_or(MemoryError::StackUnderflow)?;
        let value = self.mem.read(sp as usize)?;
        self.regs.set_sp(new_sp);
        Ok(value)
    }

    /// One-line dump of the machine state:
    /// `TRACE: PC | b0 b1 b2 | R0 .. R7`, all in two-digit hex.
    pub fn trace(&self) -> String {
        let byte = |addr: usize| match self.mem.peek(addr) {
            Some(b) => format!("{:02X}", b),
            None => "--".to_string(),
        };

        let mut line = format!(
            "TRACE: {:02X} | {} {} {} |",
            self.pc,
            byte(self.pc),
            byte(self.pc + 1),
            byte(self.pc + 2),
        );
        for r in self.regs.as_array() {
            line.push_str(&format!(" {:02X}", r));
        }
        line
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("pc", &self.pc)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .field("flags", &self.flags)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("{0}")]
    MemoryOutOfBounds(#[from] MemoryError),

    #[error("{0}")]
    RegisterOutOfBounds(#[from] RegisterError),

    #[error("illegal instruction {opcode:#010b} (0x{opcode:02X}) at PC=0x{pc:02X}")]
    IllegalInstruction { opcode: u8, pc: usize },

    #[error("division by zero")]
    DivideByZero,

    #[error("unsupported ALU operation tag 0x{0:X}")]
    UnsupportedOperation(u8),

    #[error("output error: {0}")]
    Output(String),
}

impl CpuError {
    /// Name of the fault category, as shown to the user.
    pub fn kind(&self) -> &'static str {
        match self {
            CpuError::NotRunning(_) => "NotRunning",
            CpuError::MemoryOutOfBounds(_) | CpuError::RegisterOutOfBounds(_) => "OutOfBounds",
            CpuError::IllegalInstruction { .. } => "IllegalInstruction",
            CpuError::DivideByZero => "DivideByZero",
            CpuError::UnsupportedOperation(_) => "UnsupportedOperation",
            CpuError::Output(_) => "Output",
        }
    }
}
