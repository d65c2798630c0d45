//! Operand codec shared by the assembler (encode) and the engines (decode).
//!
//! A 32-bit operand occupies one word. A 64-bit operand occupies two words,
//! high half first. Floats travel as their IEEE-754 bit patterns.

use crate::error::ErrorKind;
use crate::lang::value::Value;

use super::op::Operand;

#[inline]
pub fn const_arg_u32(code: &[u32], idx: usize) -> Result<u32, ErrorKind> {
    code.get(idx).copied().ok_or(ErrorKind::MissingConstArg)
}

#[inline]
pub fn const_arg_u64(code: &[u32], idx: usize) -> Result<u64, ErrorKind> {
    let hi = const_arg_u32(code, idx)?;
    let lo = const_arg_u32(code, idx.checked_add(1).ok_or(ErrorKind::MissingConstArg)?)?;
    Ok(join_words(hi, lo))
}

#[inline]
pub fn const_arg_i32(code: &[u32], idx: usize) -> Result<i32, ErrorKind> {
    const_arg_u32(code, idx).map(|w| w as i32)
}

#[inline]
pub fn const_arg_i64(code: &[u32], idx: usize) -> Result<i64, ErrorKind> {
    const_arg_u64(code, idx).map(|w| w as i64)
}

#[inline]
pub fn const_arg_f32(code: &[u32], idx: usize) -> Result<f32, ErrorKind> {
    const_arg_u32(code, idx).map(f32::from_bits)
}

#[inline]
pub fn const_arg_f64(code: &[u32], idx: usize) -> Result<f64, ErrorKind> {
    const_arg_u64(code, idx).map(f64::from_bits)
}

/// Decodes the operand at `idx` into the stack value it pushes.
///
/// 32-bit signed operands sign-extend, 32-bit unsigned operands zero-extend
/// and `f32` widens to `f64`.
#[inline]
pub fn const_value(operand: Operand, code: &[u32], idx: usize) -> Result<Value, ErrorKind> {
    Ok(match operand {
        Operand::I32 => Value::Int(const_arg_i32(code, idx)? as i64),
        Operand::I64 => Value::Int(const_arg_i64(code, idx)?),
        Operand::U32 => Value::Uint(const_arg_u32(code, idx)? as u64),
        Operand::U64 => Value::Uint(const_arg_u64(code, idx)?),
        Operand::F32 => Value::Float(const_arg_f32(code, idx)? as f64),
        Operand::F64 => Value::Float(const_arg_f64(code, idx)?),
        Operand::None => return Err(ErrorKind::MissingConstArg),
    })
}

#[inline]
pub const fn join_words(hi: u32, lo: u32) -> u64 {
    ((hi as u64) << 32) | lo as u64
}

/// Splits a 64-bit value into `[high, low]` words.
#[inline]
pub const fn split_words(value: u64) -> [u32; 2] {
    [(value >> 32) as u32, value as u32]
}

pub fn emit_u32(out: &mut Vec<u32>, value: u32) {
    out.push(value);
}

pub fn emit_u64(out: &mut Vec<u32>, value: u64) {
    out.extend_from_slice(&split_words(value));
}

pub fn emit_f32(out: &mut Vec<u32>, value: f32) {
    out.push(value.to_bits());
}

pub fn emit_f64(out: &mut Vec<u32>, value: f64) {
    emit_u64(out, value.to_bits());
}
