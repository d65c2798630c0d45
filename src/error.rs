//! Error taxonomy shared by the assembler and both execution engines.
//!
//! Every failure is classified by a single [`ErrorKind`]. Execution errors
//! ([`ExecError`]) add the offending opcode word and instruction pointer;
//! assembler errors ([`AsmError`]) add a human-readable message that ends up
//! in a line diagnostic. Callers branch on [`ExecError::kind`] /
//! [`AsmError::kind`] rather than on message text.

use std::fmt;

use thiserror::Error;

use crate::bytecode::op::Opcode;

/// The closed set of failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An operation needed more stack entries than were available.
    TooFewValues,
    /// A popped value's tag is not valid for the operation.
    InvalidType,
    /// A frame-relative or absolute index fell outside the legal stack range.
    IndexOutOfBounds,
    /// The code ended while an operand word was still required.
    MissingConstArg,
    /// A word with no known opcode mapping.
    InvalidOpcode,
    /// An operand literal could not be parsed into its declared type.
    InvalidArgValue,
    /// An opcode received fewer or more argument tokens than it declares.
    InvalidArgCount,
    /// Integer or unsigned division by zero.
    DivisionByZero,
}

impl ErrorKind {
    pub const fn message(self) -> &'static str {
        match self {
            ErrorKind::TooFewValues => "too few arguments on stack",
            ErrorKind::InvalidType => "invalid type",
            ErrorKind::IndexOutOfBounds => "index out of bounds",
            ErrorKind::MissingConstArg => "missing const arg",
            ErrorKind::InvalidOpcode => "invalid opcode",
            ErrorKind::InvalidArgValue => "invalid argument value",
            ErrorKind::InvalidArgCount => "incorrect number of arguments",
            ErrorKind::DivisionByZero => "division by zero",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A fail-fast execution error raised by either engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} for {} at {ip}", opcode_name(.opcode))]
pub struct ExecError {
    pub kind: ErrorKind,
    /// The raw opcode word being executed when the error was raised.
    pub opcode: u32,
    /// Offset of that opcode word in the code.
    pub ip: usize,
}

impl ExecError {
    pub const fn new(kind: ErrorKind, opcode: u32, ip: usize) -> Self {
        Self { kind, opcode, ip }
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }
}

fn opcode_name(word: &u32) -> String {
    match Opcode::try_from(*word) {
        Ok(op) => op.mnemonic().to_string(),
        Err(_) => format!("0x{word:x}"),
    }
}

/// A single line's assembly failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct AsmError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AsmError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgValue, message)
    }

    pub fn invalid_count(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgCount, message)
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }
}
