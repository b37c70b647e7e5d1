//! Program image loader.
//!
//! LS-8 programs are plain text:
//! - One byte per line, written as a base-2 literal
//! - Everything from `#` to the end of a line is a comment
//! - Blank lines are ignored
//!
//! Bytes are placed in memory from address 0 in file order.

use std::path::Path;
use thiserror::Error;

/// Comment marker.
const COMMENT: char = '#';

/// Parse a program image from source text.
pub fn parse_program(source: &str) -> Result<Vec<u8>, LoadError> {
    let mut program = Vec::new();

    for (line_num, line) in source.lines().enumerate() {
        let code = match line.split_once(COMMENT) {
            Some((code, _)) => code,
            None => line,
        };
        let code = code.trim();

        if code.is_empty() {
            continue;
        }

        let byte = u8::from_str_radix(code, 2)
            .map_err(|e| LoadError::ParseError {
                line: line_num + 1,
                message: format!("`{}` is not an 8-bit binary literal ({})", code, e),
            })?;

        program.push(byte);
    }

    Ok(program)
}

/// Load a program image from disk.
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, LoadError> {
    let source = std::fs::read_to_string(path.as_ref())
        .map_err(|e| LoadError::IoError(e.to_string()))?;
    parse_program(&source)
}

/// Errors that can occur while loading a program image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },
}
