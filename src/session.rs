//! One program run, from image to exit status.
//!
//! The CLI is a thin shell over [`run_file`]: everything it prints to
//! stdout goes through the caller's writer, and the single line it prints
//! to stderr comes back in [`RunReport::diagnostic`].

use crate::cpu::{Cpu, CpuError};
use crate::loader;
use std::io::Write;
use std::path::Path;

/// Settings for a run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Stop after this many instructions.
    pub max_steps: Option<u64>,
    /// Write a state dump before every instruction.
    pub trace: bool,
    /// Write the final machine state as JSON after the run.
    pub dump_state: bool,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Process exit status: 0 on halt or step limit, 1 on any failure.
    pub status: i32,
    /// Message for stderr, if any.
    pub diagnostic: Option<String>,
}

impl RunReport {
    fn ok() -> Self {
        Self { status: 0, diagnostic: None }
    }

    fn failed(message: String) -> Self {
        Self { status: 1, diagnostic: Some(message) }
    }
}

/// Format a fault for the user. Faults whose error value carries no
/// program address get the PC they were raised at.
pub fn describe_fault(err: &CpuError, pc: usize) -> String {
    match err {
        CpuError::IllegalInstruction { .. } => format!("❌ {} fault: {}", err.kind(), err),
        _ => format!("❌ {} fault at PC=0x{:02X}: {}", err.kind(), pc, err),
    }
}

/// Load a program image from disk and run it.
pub fn run_file<P: AsRef<Path>, W: Write>(path: P, opts: &RunOptions, out: &mut W) -> RunReport {
    let path = path.as_ref();
    match loader::load_program(path) {
        Ok(image) => {
            log::info!("loaded {} bytes from {}", image.len(), path.display());
            run_image(&image, opts, out)
        }
        Err(e) => RunReport::failed(format!("❌ Failed to load {}: {}", path.display(), e)),
    }
}

/// Run a program image on a fresh CPU, writing PRN output, trace lines
/// and the optional state dump to `out`.
pub fn run_image<W: Write>(image: &[u8], opts: &RunOptions, out: &mut W) -> RunReport {
    let mut cpu = Cpu::new();
    if let Err(e) = cpu.load_program(image) {
        return RunReport::failed(format!("❌ Failed to load program: {}", e));
    }

    let limit = opts.max_steps.unwrap_or(u64::MAX);
    let mut result = drive(&mut cpu, opts.trace, limit, out);

    if opts.dump_state {
        let dumped = serde_json::to_string_pretty(&cpu)
            .map_err(|e| CpuError::Output(e.to_string()))
            .and_then(|json| writeln!(out, "{}", json).map_err(|e| CpuError::Output(e.to_string())));
        if result.is_ok() {
            result = dumped;
        }
    }

    if result.is_ok() {
        result = out.flush().map_err(|e| CpuError::Output(e.to_string()));
    }

    match result {
        Err(e) => RunReport::failed(describe_fault(&e, cpu.pc)),
        Ok(()) if cpu.is_running() => RunReport {
            status: 0,
            diagnostic: Some(format!("⚠️  Reached step limit ({}) without halting", limit)),
        },
        Ok(()) => {
            log::info!("{} instructions executed", cpu.cycles);
            RunReport::ok()
        }
    }
}

fn drive<W: Write>(cpu: &mut Cpu, trace: bool, limit: u64, out: &mut W) -> Result<(), CpuError> {
    while cpu.is_running() && cpu.cycles < limit {
        if trace {
            writeln!(out, "{}", cpu.trace()).map_err(|e| CpuError::Output(e.to_string()))?;
        }
        cpu.step(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::{DIV, HLT, JMP, LDI, MUL, PRN};

    fn run(image: &[u8], opts: RunOptions) -> (RunReport, String) {
        let mut out = Vec::new();
        let report = run_image(image, &opts, &mut out);
        (report, String::from_utf8(out).unwrap())
    }

    /// Accepts `budget` bytes, then fails every write.
    struct BrokenPipe {
        budget: usize,
    }

    impl Write for BrokenPipe {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if buf.len() > self.budget {
                return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"));
            }
            self.budget -= buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_halt_exits_zero() {
        let (report, out) = run(&[LDI, 0, 8, LDI, 1, 9, MUL, 0, 1, PRN, 0, HLT], RunOptions::default());

        assert_eq!(report, RunReport { status: 0, diagnostic: None });
        assert_eq!(out, "Printing: 72\n");
    }

    #[test]
    fn test_fault_is_one_message_with_pc() {
        let (report, out) = run(&[LDI, 0, 10, DIV, 0, 1, HLT], RunOptions::default());

        assert_eq!(report.status, 1);
        assert_eq!(
            report.diagnostic.as_deref(),
            Some("❌ DivideByZero fault at PC=0x03: division by zero")
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_illegal_instruction_message() {
        let (report, _) = run(&[0xFF, 0, 0], RunOptions::default());

        assert_eq!(report.status, 1);
        let message = report.diagnostic.unwrap();
        assert!(message.starts_with("❌ IllegalInstruction fault: "), "{}", message);
        assert!(message.contains("(0xFF) at PC=0x00"), "{}", message);
    }

    #[test]
    fn test_out_of_bounds_message_names_pc_and_address() {
        let mut image = vec![LDI, 0, 0xFE, JMP, 0];
        image.resize(0xFE, 0);
        image.push(PRN);

        let (report, _) = run(&image, RunOptions::default());

        assert_eq!(
            report.diagnostic.as_deref(),
            Some("❌ OutOfBounds fault at PC=0xFE: memory address 0x100 out of range (0x00-0xFF)")
        );
    }

    #[test]
    fn test_step_limit_warns_and_exits_zero() {
        let opts = RunOptions { max_steps: Some(10), ..RunOptions::default() };
        let (report, _) = run(&[LDI, 0, 3, JMP, 0], opts);

        assert_eq!(report.status, 0);
        assert_eq!(
            report.diagnostic.as_deref(),
            Some("⚠️  Reached step limit (10) without halting")
        );
    }

    #[test]
    fn test_trace_lines_precede_each_step() {
        let opts = RunOptions { trace: true, ..RunOptions::default() };
        let (report, out) = run(&[LDI, 0, 8, PRN, 0, HLT], opts);

        assert_eq!(report.status, 0);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "TRACE: 00 | 82 00 08 | 00 00 00 00 00 00 00 F4");
        assert!(lines[1].starts_with("TRACE: 03 | 47 00 01 | 08"));
        assert_eq!(lines[2], "Printing: 8");
        assert!(lines[3].starts_with("TRACE: 05 | 01 "));
    }

    #[test]
    fn test_dump_state_is_json() {
        let opts = RunOptions { dump_state: true, ..RunOptions::default() };
        let (report, out) = run(&[LDI, 2, 5, HLT], opts);

        assert_eq!(report.status, 0);
        let state: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(state["state"], "Halted");
        assert_eq!(state["pc"], 3);
        assert_eq!(state["regs"]["regs"][2], 5);
        assert_eq!(state["regs"]["regs"][7], 0xF4);
    }

    #[test]
    fn test_dump_state_after_fault() {
        let opts = RunOptions { dump_state: true, ..RunOptions::default() };
        let (report, out) = run(&[LDI, 0, 10, DIV, 0, 1], opts);

        assert_eq!(report.status, 1);
        let state: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(state["state"], "Faulted");
    }

    #[test]
    fn test_trace_write_failure_is_reported() {
        let opts = RunOptions { trace: true, ..RunOptions::default() };
        let mut out = BrokenPipe { budget: 0 };

        let report = run_image(&[HLT], &opts, &mut out);

        assert_eq!(report.status, 1);
        assert_eq!(
            report.diagnostic.as_deref(),
            Some("❌ Output fault at PC=0x00: output error: pipe closed")
        );
    }

    #[test]
    fn test_print_failure_is_reported() {
        let mut out = BrokenPipe { budget: 0 };

        let report = run_image(&[LDI, 0, 1, PRN, 0, HLT], &RunOptions::default(), &mut out);

        assert_eq!(report.status, 1);
        assert!(report.diagnostic.unwrap().contains("Output fault at PC=0x03"));
    }

    #[test]
    fn test_oversized_image_is_rejected() {
        let (report, _) = run(&[0; 300], RunOptions::default());

        assert_eq!(report.status, 1);
        assert!(report.diagnostic.unwrap().contains("program size 300 exceeds available space 256"));
    }

    #[test]
    fn test_missing_file() {
        let mut out = Vec::new();
        let report = run_file("/definitely/not/here.ls8", &RunOptions::default(), &mut out);

        assert_eq!(report.status, 1);
        assert!(report.diagnostic.unwrap().starts_with("❌ Failed to load /definitely/not/here.ls8"));
    }
}
