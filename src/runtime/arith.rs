//! Arithmetic shared by both engines.
//!
//! Integer and unsigned arithmetic wraps; integer or unsigned division by
//! zero is an error. Float arithmetic is plain IEEE-754.

use crate::bytecode::op::ArithOp;
use crate::error::ErrorKind;
use crate::lang::value::Value;

#[inline]
pub fn int_arith(op: ArithOp, a: i64, b: i64) -> Result<i64, ErrorKind> {
    Ok(match op {
        ArithOp::Add => a.wrapping_add(b),
        ArithOp::Sub => a.wrapping_sub(b),
        ArithOp::Mul => a.wrapping_mul(b),
        ArithOp::Div => {
            if b == 0 {
                return Err(ErrorKind::DivisionByZero);
            }
            a.wrapping_div(b)
        }
    })
}

#[inline]
pub fn uint_arith(op: ArithOp, a: u64, b: u64) -> Result<u64, ErrorKind> {
    Ok(match op {
        ArithOp::Add => a.wrapping_add(b),
        ArithOp::Sub => a.wrapping_sub(b),
        ArithOp::Mul => a.wrapping_mul(b),
        ArithOp::Div => a.checked_div(b).ok_or(ErrorKind::DivisionByZero)?,
    })
}

#[inline]
pub fn float_arith(op: ArithOp, a: f64, b: f64) -> f64 {
    match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => a / b,
    }
}

/// `top OP under` with both sides coerced to signed 64. The top of the stack
/// is the left operand.
#[inline]
pub fn apply_int(op: ArithOp, top: Value, under: Value) -> Result<Value, ErrorKind> {
    int_arith(op, top.to_int(), under.to_int()).map(Value::Int)
}

/// `top OP constant`, computed in the constant's domain.
#[inline]
pub fn apply_const(op: ArithOp, top: Value, constant: Value) -> Result<Value, ErrorKind> {
    match constant {
        Value::Int(c) => int_arith(op, top.to_int(), c).map(Value::Int),
        Value::Uint(c) => uint_arith(op, top.to_uint(), c).map(Value::Uint),
        Value::Float(c) => Ok(Value::Float(float_arith(op, top.to_float(), c))),
    }
}
