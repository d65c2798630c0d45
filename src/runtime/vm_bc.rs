use tracing::{debug, instrument};

use crate::bytecode::codec::{
    const_arg_f32, const_arg_f64, const_arg_i32, const_arg_i64, const_arg_u32, const_arg_u64,
    const_value,
};
use crate::bytecode::op::{ArithOp, Opcode};
use crate::error::{ErrorKind, ExecError};
use crate::lang::value::Value;
use crate::runtime::arith::{apply_const, apply_int};
use crate::runtime::stack::ValueStack;

#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Pre-allocated stack slots. A hint, never a limit.
    pub stack_capacity: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            stack_capacity: 1024,
        }
    }
}

/// The streaming engine: runs a whole program in one call.
pub struct Vm {
    stack: ValueStack,
    config: VmConfig,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        Self {
            stack: ValueStack::with_capacity(config.stack_capacity),
            config,
        }
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    pub fn stack(&self) -> &[Value] {
        self.stack.values()
    }

    pub fn frame_base(&self) -> usize {
        self.stack.frame_base()
    }

    /// Runs `code` against a fresh, empty stack.
    ///
    /// Returns on `Halt`, when the pointer runs past the end, or at the first
    /// error. The stack is left as it was at that point.
    #[instrument(skip_all, fields(words = code.len()))]
    pub fn execute(&mut self, code: &[u32]) -> Result<(), ExecError> {
        self.stack.clear();
        self.stack.reserve(self.config.stack_capacity);
        self.finish(code)
    }

    /// Runs `code` against a caller-supplied stack and frame base.
    #[instrument(skip_all, fields(words = code.len(), frame_base = stack.frame_base()))]
    pub fn execute_with(&mut self, code: &[u32], stack: ValueStack) -> Result<(), ExecError> {
        self.stack = stack;
        self.finish(code)
    }

    fn finish(&mut self, code: &[u32]) -> Result<(), ExecError> {
        let result = self.exec_words(code);
        match &result {
            Ok(()) => debug!(depth = self.stack.len(), "execution finished"),
            Err(e) => debug!(depth = self.stack.len(), error = %e, "execution faulted"),
        }
        result
    }

    fn exec_words(&mut self, code: &[u32]) -> Result<(), ExecError> {
        let mut ip: usize = 0;

        while ip < code.len() {
            let word = code[ip];
            let fail = move |kind: ErrorKind| ExecError::new(kind, word, ip);
            let op = Opcode::try_from(word).map_err(|_| fail(ErrorKind::InvalidOpcode))?;
            let arg = ip + 1;

            match op {
                Opcode::Noop => {}
                Opcode::Halt => return Ok(()),

                // Constants
                Opcode::PushInt32 => {
                    let n = const_arg_i32(code, arg).map_err(fail)?;
                    self.stack.push(Value::Int(n as i64));
                }
                Opcode::PushInt64 => {
                    let n = const_arg_i64(code, arg).map_err(fail)?;
                    self.stack.push(Value::Int(n));
                }
                Opcode::PushUint32 => {
                    let n = const_arg_u32(code, arg).map_err(fail)?;
                    self.stack.push(Value::Uint(n as u64));
                }
                Opcode::PushUint64 => {
                    let n = const_arg_u64(code, arg).map_err(fail)?;
                    self.stack.push(Value::Uint(n));
                }
                Opcode::PushFloat32 => {
                    let n = const_arg_f32(code, arg).map_err(fail)?;
                    self.stack.push(Value::Float(n as f64));
                }
                Opcode::PushFloat64 => {
                    let n = const_arg_f64(code, arg).map_err(fail)?;
                    self.stack.push(Value::Float(n));
                }

                // Stack shuffling
                Opcode::Pop => {
                    self.stack.pop().map_err(fail)?;
                }
                Opcode::PopN => {
                    let n = const_arg_u32(code, arg).map_err(fail)?;
                    self.stack.pop_n(n as usize).map_err(fail)?;
                }
                Opcode::Copy => {
                    let offset = const_arg_u32(code, arg).map_err(fail)?;
                    self.stack.copy(offset).map_err(fail)?;
                }
                Opcode::Swap => {
                    let offset = const_arg_u32(code, arg).map_err(fail)?;
                    self.stack.swap(offset).map_err(fail)?;
                }

                // Unary
                Opcode::Negative => self.stack.map_top(|v| Ok(v.negate())).map_err(fail)?,
                Opcode::Increment => self.stack.map_top(|v| Ok(v.increment())).map_err(fail)?,
                Opcode::Decrement => self.stack.map_top(|v| Ok(v.decrement())).map_err(fail)?,

                // Stack binary
                Opcode::AddInt => self.int_binary(ArithOp::Add).map_err(fail)?,
                Opcode::SubInt => self.int_binary(ArithOp::Sub).map_err(fail)?,
                Opcode::MulInt => self.int_binary(ArithOp::Mul).map_err(fail)?,
                Opcode::DivInt => self.int_binary(ArithOp::Div).map_err(fail)?,

                // Constant binary
                Opcode::AddConstInt32
                | Opcode::AddConstInt64
                | Opcode::AddConstUint32
                | Opcode::AddConstUint64
                | Opcode::AddConstFloat32
                | Opcode::AddConstFloat64 => {
                    self.const_binary(ArithOp::Add, op, code, arg).map_err(fail)?
                }
                Opcode::SubConstInt32
                | Opcode::SubConstInt64
                | Opcode::SubConstUint32
                | Opcode::SubConstUint64
                | Opcode::SubConstFloat32
                | Opcode::SubConstFloat64 => {
                    self.const_binary(ArithOp::Sub, op, code, arg).map_err(fail)?
                }
                Opcode::MulConstInt32
                | Opcode::MulConstInt64
                | Opcode::MulConstUint32
                | Opcode::MulConstUint64
                | Opcode::MulConstFloat32
                | Opcode::MulConstFloat64 => {
                    self.const_binary(ArithOp::Mul, op, code, arg).map_err(fail)?
                }
                Opcode::DivConstInt32
                | Opcode::DivConstInt64
                | Opcode::DivConstUint32
                | Opcode::DivConstUint64
                | Opcode::DivConstFloat32
                | Opcode::DivConstFloat64 => {
                    self.const_binary(ArithOp::Div, op, code, arg).map_err(fail)?
                }
            }

            ip += op.width();
        }

        Ok(())
    }

    #[inline]
    fn int_binary(&mut self, arith: ArithOp) -> Result<(), ErrorKind> {
        let (under, top) = self.stack.pop_pair()?;
        self.stack.push(apply_int(arith, top, under)?);
        Ok(())
    }

    #[inline]
    fn const_binary(
        &mut self,
        arith: ArithOp,
        op: Opcode,
        code: &[u32],
        arg: usize,
    ) -> Result<(), ErrorKind> {
        let constant = const_value(op.operand(), code, arg)?;
        self.stack.map_top(|top| apply_const(arith, top, constant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::codec::{emit_f32, emit_f64, emit_u32, emit_u64};

    // ============================================================
    // Test Helpers
    // ============================================================

    /// Builds code from opcodes and raw operand words.
    fn words(parts: &[&[u32]]) -> Vec<u32> {
        parts.concat()
    }

    fn op(op: Opcode) -> u32 {
        op as u32
    }

    fn push_i32(n: i32) -> Vec<u32> {
        vec![op(Opcode::PushInt32), n as u32]
    }

    fn push_i64(n: i64) -> Vec<u32> {
        let mut out = vec![op(Opcode::PushInt64)];
        emit_u64(&mut out, n as u64);
        out
    }

    fn push_u32(n: u32) -> Vec<u32> {
        vec![op(Opcode::PushUint32), n]
    }

    fn push_f64(n: f64) -> Vec<u32> {
        let mut out = vec![op(Opcode::PushFloat64)];
        emit_f64(&mut out, n);
        out
    }

    /// Run words and return the resulting stack
    fn run_words(code: &[u32]) -> Result<Vec<Value>, ExecError> {
        let mut vm = Vm::new();
        vm.execute(code)?;
        Ok(vm.stack().to_vec())
    }

    /// Assert stack contains expected values
    fn assert_stack(code: &[u32], expected: Vec<Value>) {
        let stack = run_words(code).expect("execution should succeed");
        assert_eq!(stack, expected, "stack mismatch");
    }

    /// Assert execution fails with the given kind at the given ip
    fn assert_error(code: &[u32], kind: ErrorKind, ip: usize) {
        match run_words(code) {
            Ok(stack) => panic!("expected {kind:?}, got stack: {stack:?}"),
            Err(e) => {
                assert_eq!(e.kind(), kind, "{e}");
                assert_eq!(e.ip, ip, "{e}");
            }
        }
    }

    // ============================================================
    // Control
    // ============================================================

    #[test]
    fn test_empty_program() {
        assert_stack(&[], vec![]);
    }

    #[test]
    fn test_noop() {
        assert_stack(&[op(Opcode::Noop), op(Opcode::Noop)], vec![]);
    }

    #[test]
    fn test_halt_stops_before_remaining_code() {
        let code = words(&[&push_i32(1), &[op(Opcode::Halt)], &push_i32(2)]);
        assert_stack(&code, vec![Value::Int(1)]);
    }

    #[test]
    fn test_invalid_opcode() {
        assert_error(&[op(Opcode::Noop), 43], ErrorKind::InvalidOpcode, 1);
        let err = run_words(&[0xFFFF_FFFF]).unwrap_err();
        assert_eq!(err.opcode, 0xFFFF_FFFF);
    }

    // ============================================================
    // Constants
    // ============================================================

    #[test]
    fn test_push_i32_sign_extends() {
        assert_stack(&push_i32(-1), vec![Value::Int(-1)]);
        assert_stack(&push_i32(i32::MIN), vec![Value::Int(i32::MIN as i64)]);
    }

    #[test]
    fn test_push_u32_zero_extends() {
        assert_stack(&push_u32(u32::MAX), vec![Value::Uint(u32::MAX as u64)]);
    }

    #[test]
    fn test_push_64_bit_high_word_first() {
        assert_stack(
            &[op(Opcode::PushUint64), 0x0123_4567, 0x89AB_CDEF],
            vec![Value::Uint(0x0123_4567_89AB_CDEF)],
        );
        assert_stack(&push_i64(i64::MIN), vec![Value::Int(i64::MIN)]);
    }

    #[test]
    fn test_push_floats_widen_bits() {
        let mut code = vec![op(Opcode::PushFloat32)];
        emit_f32(&mut code, 1.5);
        code.extend(push_f64(-0.25));
        assert_stack(&code, vec![Value::Float(1.5), Value::Float(-0.25)]);
    }

    #[test]
    fn test_missing_const_arg() {
        assert_error(&[op(Opcode::PushInt32)], ErrorKind::MissingConstArg, 0);
        assert_error(&[op(Opcode::PushInt64), 1], ErrorKind::MissingConstArg, 0);
        assert_error(
            &[op(Opcode::Noop), op(Opcode::PushFloat64), 0],
            ErrorKind::MissingConstArg,
            1,
        );
        assert_error(&[op(Opcode::PopN)], ErrorKind::MissingConstArg, 0);
    }

    // ============================================================
    // Stack shuffling
    // ============================================================

    #[test]
    fn test_pop() {
        let code = words(&[&push_i32(1), &push_i32(2), &[op(Opcode::Pop)]]);
        assert_stack(&code, vec![Value::Int(1)]);
    }

    #[test]
    fn test_pop_empty() {
        assert_error(&[op(Opcode::Pop)], ErrorKind::TooFewValues, 0);
    }

    #[test]
    fn test_pop_n() {
        let code = words(&[
            &push_i32(1),
            &push_i32(2),
            &push_i32(3),
            &[op(Opcode::PopN), 2],
        ]);
        assert_stack(&code, vec![Value::Int(1)]);

        let zero = words(&[&push_i32(1), &[op(Opcode::PopN), 0]]);
        assert_stack(&zero, vec![Value::Int(1)]);

        let too_many = words(&[&push_i32(1), &[op(Opcode::PopN), 2]]);
        assert_error(&too_many, ErrorKind::TooFewValues, 2);
    }

    #[test]
    fn test_copy() {
        let code = words(&[&push_i32(7), &push_i32(8), &[op(Opcode::Copy), 0]]);
        assert_stack(&code, vec![Value::Int(7), Value::Int(8), Value::Int(7)]);

        let out_of_range = words(&[&push_i32(7), &[op(Opcode::Copy), 1]]);
        assert_error(&out_of_range, ErrorKind::IndexOutOfBounds, 2);
    }

    #[test]
    fn test_swap() {
        let code = words(&[
            &push_i32(1),
            &push_i32(2),
            &push_i32(3),
            &[op(Opcode::Swap), 0],
        ]);
        assert_stack(&code, vec![Value::Int(3), Value::Int(2), Value::Int(1)]);

        assert_error(&[op(Opcode::Swap), 0], ErrorKind::IndexOutOfBounds, 0);
    }

    #[test]
    fn test_frame_base_guards_every_removal() {
        let frame = || {
            ValueStack::with_frame(vec![Value::Int(1), Value::Int(2)], 1).expect("valid frame")
        };
        let run = |code: &[u32]| {
            let mut vm = Vm::new();
            let result = vm.execute_with(code, frame());
            (result.map_err(|e| e.kind()), vm.stack().to_vec())
        };

        let (result, stack) = run(&[op(Opcode::Pop)]);
        assert_eq!(result, Ok(()));
        assert_eq!(stack, vec![Value::Int(1)]);

        let (result, _) = run(&[op(Opcode::Pop), op(Opcode::Pop)]);
        assert_eq!(result, Err(ErrorKind::IndexOutOfBounds));

        let (result, _) = run(&[op(Opcode::PopN), 2]);
        assert_eq!(result, Err(ErrorKind::IndexOutOfBounds));

        let (result, stack) = run(&[op(Opcode::Copy), 0]);
        assert_eq!(result, Ok(()));
        assert_eq!(stack, vec![Value::Int(1), Value::Int(2), Value::Int(2)]);

        let (result, _) = run(&[op(Opcode::Copy), 1]);
        assert_eq!(result, Err(ErrorKind::IndexOutOfBounds));

        let (result, _) = run(&[op(Opcode::Pop), op(Opcode::Negative)]);
        assert_eq!(result, Err(ErrorKind::IndexOutOfBounds));
    }

    #[test]
    fn test_execute_resets_previous_state() {
        let mut vm = Vm::new();
        vm.execute(&push_i32(5)).unwrap();
        vm.execute(&push_i32(6)).unwrap();
        assert_eq!(vm.stack(), &[Value::Int(6)]);
        assert_eq!(vm.frame_base(), 0);
    }

    // ============================================================
    // Arithmetic
    // ============================================================

    #[test]
    fn test_add_int() {
        let code = words(&[&push_i32(10), &push_i32(32), &[op(Opcode::AddInt)]]);
        assert_stack(&code, vec![Value::Int(42)]);
    }

    #[test]
    fn test_sub_int_top_is_left_operand() {
        let code = words(&[&push_i32(10), &push_i32(3), &[op(Opcode::SubInt)]]);
        assert_stack(&code, vec![Value::Int(-7)]);

        let code = words(&[&push_i32(3), &push_i32(10), &[op(Opcode::SubInt)]]);
        assert_stack(&code, vec![Value::Int(7)]);
    }

    #[test]
    fn test_mul_int_coerces_tags() {
        let code = words(&[&push_f64(2.9), &push_u32(3), &[op(Opcode::MulInt)]]);
        assert_stack(&code, vec![Value::Int(6)]);
    }

    #[test]
    fn test_div_int() {
        let code = words(&[&push_i32(2), &push_i32(-7), &[op(Opcode::DivInt)]]);
        assert_stack(&code, vec![Value::Int(-3)]);

        let code = words(&[&push_i32(10), &push_i32(2), &[op(Opcode::DivInt)]]);
        assert_stack(&code, vec![Value::Int(0)]);

        let wrap = words(&[&push_i32(-1), &push_i64(i64::MIN), &[op(Opcode::DivInt)]]);
        assert_stack(&wrap, vec![Value::Int(i64::MIN)]);
    }

    #[test]
    fn test_div_int_by_zero() {
        let code = words(&[&push_i32(0), &push_i32(1), &[op(Opcode::DivInt)]]);
        assert_error(&code, ErrorKind::DivisionByZero, 4);
    }

    #[test]
    fn test_binary_needs_two() {
        let code = words(&[&push_i32(1), &[op(Opcode::AddInt)]]);
        assert_error(&code, ErrorKind::TooFewValues, 2);
    }

    #[test]
    fn test_negative_keeps_tag() {
        let code = words(&[&push_u32(1), &[op(Opcode::Negative)]]);
        assert_stack(&code, vec![Value::Uint(u64::MAX)]);

        let code = words(&[&push_f64(2.5), &[op(Opcode::Negative)]]);
        assert_stack(&code, vec![Value::Float(-2.5)]);

        assert_error(&[op(Opcode::Negative)], ErrorKind::TooFewValues, 0);
    }

    #[test]
    fn test_increment_decrement() {
        let code = words(&[
            &push_i32(41),
            &[op(Opcode::Increment)],
            &push_u32(0),
            &[op(Opcode::Decrement)],
        ]);
        assert_stack(&code, vec![Value::Int(42), Value::Uint(u64::MAX)]);

        assert_error(&[op(Opcode::Increment)], ErrorKind::TooFewValues, 0);
    }

    #[test]
    fn test_const_binary_domains() {
        let mut code = push_i32(10);
        code.extend([op(Opcode::SubConstInt32), 3]);
        assert_stack(&code, vec![Value::Int(7)]);

        let mut code = push_i32(-1);
        code.push(op(Opcode::AddConstUint64));
        emit_u64(&mut code, 2);
        assert_stack(&code, vec![Value::Uint(1)]);

        let mut code = push_i32(3);
        code.push(op(Opcode::MulConstFloat32));
        emit_f32(&mut code, 0.5);
        assert_stack(&code, vec![Value::Float(1.5)]);

        let mut code = push_f64(1.0);
        code.push(op(Opcode::DivConstFloat64));
        emit_f64(&mut code, 0.0);
        assert_stack(&code, vec![Value::Float(f64::INFINITY)]);
    }

    #[test]
    fn test_const_binary_errors() {
        let mut code = push_i32(9);
        code.extend([op(Opcode::DivConstUint32), 0]);
        assert_error(&code, ErrorKind::DivisionByZero, 2);

        assert_error(
            &[op(Opcode::AddConstInt32), 1],
            ErrorKind::TooFewValues,
            0,
        );

        let mut code = push_i32(1);
        code.push(op(Opcode::AddConstInt64));
        emit_u32(&mut code, 0);
        assert_error(&code, ErrorKind::MissingConstArg, 2);
    }

    #[test]
    fn test_error_display_names_opcode() {
        let err = run_words(&[op(Opcode::Pop)]).unwrap_err();
        assert_eq!(err.to_string(), "too few arguments on stack for Pop at 0");
    }
}
