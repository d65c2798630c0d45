use crate::bytecode::codec::{emit_f32, emit_f64, emit_u32, emit_u64};
use crate::bytecode::op::Operand;
use crate::error::AsmError;

use super::literal::{cut_space, parse_f32, parse_f64, parse_int, parse_uint};

/// The literal type an opcode expects for one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgType {
    Int32,
    Int64,
    Uint32,
    Uint64,
    Float32,
    Float64,
}

impl ArgType {
    /// The argument type that encodes `operand`, if it has one.
    pub const fn for_operand(operand: Operand) -> Option<ArgType> {
        match operand {
            Operand::None => None,
            Operand::I32 => Some(ArgType::Int32),
            Operand::I64 => Some(ArgType::Int64),
            Operand::U32 => Some(ArgType::Uint32),
            Operand::U64 => Some(ArgType::Uint64),
            Operand::F32 => Some(ArgType::Float32),
            Operand::F64 => Some(ArgType::Float64),
        }
    }

    pub const fn words(self) -> usize {
        match self {
            ArgType::Int32 | ArgType::Uint32 | ArgType::Float32 => 1,
            ArgType::Int64 | ArgType::Uint64 | ArgType::Float64 => 2,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ArgType::Int32 => "i32",
            ArgType::Int64 => "i64",
            ArgType::Uint32 => "u32",
            ArgType::Uint64 => "u64",
            ArgType::Float32 => "f32",
            ArgType::Float64 => "f64",
        }
    }

    /// Consumes one token from `rest` and appends its encoded word(s).
    ///
    /// The operand slot is always filled: on a missing or malformed token
    /// zero words are appended instead. Returns the text left after the
    /// token together with the outcome.
    pub fn parse<'a>(self, rest: &'a str, out: &mut Vec<u32>) -> (&'a str, Result<(), AsmError>) {
        if rest.is_empty() {
            self.emit_placeholder(out);
            return (
                "",
                Err(AsmError::invalid_count(format!(
                    "missing {} argument",
                    self.name()
                ))),
            );
        }

        let (token, rest, _) = cut_space(rest);
        let result = self.encode(token, out);
        if result.is_err() {
            self.emit_placeholder(out);
        }
        (rest, result)
    }

    fn encode(self, token: &str, out: &mut Vec<u32>) -> Result<(), AsmError> {
        match self {
            ArgType::Int32 => emit_u32(out, parse_int(token, 32)? as i32 as u32),
            ArgType::Int64 => emit_u64(out, parse_int(token, 64)? as u64),
            ArgType::Uint32 => emit_u32(out, parse_uint(token, 32)? as u32),
            ArgType::Uint64 => emit_u64(out, parse_uint(token, 64)?),
            ArgType::Float32 => emit_f32(out, parse_f32(token)?),
            ArgType::Float64 => emit_f64(out, parse_f64(token)?),
        }
        Ok(())
    }

    fn emit_placeholder(self, out: &mut Vec<u32>) {
        out.extend(std::iter::repeat_n(0, self.words()));
    }
}
