//! Disassembler for LS-8 program images.
//!
//! Walks a byte image using the opcode table's operand counts. Bytes that
//! are not a known opcode are shown as raw data.

use crate::cpu::decode::{lookup, Instruction};

/// Disassemble the instruction starting at `addr`.
///
/// Returns the text and the number of bytes it covers. Missing operand
/// bytes past the end of the image read as zero.
pub fn disassemble_at(image: &[u8], addr: usize) -> (String, usize) {
    let byte = |i: usize| image.get(i).copied().unwrap_or(0);
    let opcode = byte(addr);

    match lookup(opcode) {
        Some(info) => {
            let instr = Instruction {
                pc: addr,
                info,
                operand_a: byte(addr + 1),
                operand_b: byte(addr + 2),
            };
            (instr.to_string(), info.width())
        }
        None => (format!("DB 0x{:02X}", opcode), 1),
    }
}

/// Disassemble a whole image.
pub fn disassemble(image: &[u8]) -> String {
    let mut output = String::new();
    output.push_str("; LS-8 Disassembly\n");
    output.push_str("; ----------------\n\n");

    let mut addr = 0;
    while addr < image.len() {
        let (text, width) = disassemble_at(image, addr);
        let end = (addr + width).min(image.len());
        let raw: Vec<String> = image[addr..end].iter().map(|b| format!("{:08b}", b)).collect();
        output.push_str(&format!("{:02X}: {:<12} ; {}\n", addr, text, raw.join(" ")));
        addr += width;
    }

    output
}
