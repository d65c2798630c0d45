//! The steppable engine: one opcode per call, for tracing and verification.
//!
//! ```text
//!  start ──► Ready ──step──► Running ──step──► Running ...
//!                 │              │
//!                 │              ├── Halt / end of code ──► Halted
//!                 └──────────────┴── any other error ─────► Faulted
//! ```
//!
//! Only a fresh [`Stepper::start`] leaves `Halted` or `Faulted`. Stepping a
//! halted machine reports `Halted` again; stepping a faulted one returns the
//! same error again.

use tracing::{debug, trace};

use crate::bytecode::codec::const_value;
use crate::bytecode::op::{Opcode, Operand};
use crate::error::{ErrorKind, ExecError};
use crate::lang::value::Value;
use crate::runtime::arith::{apply_const, apply_int};
use crate::runtime::stack::ValueStack;
use crate::runtime::vm_bc::VmConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Ready,
    Running,
    Halted,
    Faulted,
}

/// What a successful [`Stepper::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// One opcode ran; more may follow.
    Continue,
    /// A `Halt` ran or the pointer is past the end of the code.
    Halted,
}

pub struct Stepper {
    code: Vec<u32>,
    ip: usize,
    stack: ValueStack,
    state: State,
    fault: Option<ExecError>,
    config: VmConfig,
}

impl Default for Stepper {
    fn default() -> Self {
        Self::new()
    }
}

impl Stepper {
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        Self {
            code: Vec::new(),
            ip: 0,
            stack: ValueStack::with_capacity(config.stack_capacity),
            state: State::Ready,
            fault: None,
            config,
        }
    }

    /// Loads `code`, resetting the pointer and the stack.
    pub fn start(&mut self, code: &[u32]) {
        self.stack.clear();
        self.stack.reserve(self.config.stack_capacity);
        self.load(code);
    }

    /// Loads `code` to run against a caller-supplied stack and frame base.
    pub fn start_with(&mut self, code: &[u32], stack: ValueStack) {
        self.stack = stack;
        self.load(code);
    }

    fn load(&mut self, code: &[u32]) {
        self.code.clear();
        self.code.extend_from_slice(code);
        self.ip = 0;
        self.state = State::Ready;
        self.fault = None;
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn code(&self) -> &[u32] {
        &self.code
    }

    /// The word the next step will execute, if any.
    pub fn peek(&self) -> Option<u32> {
        self.code.get(self.ip).copied()
    }

    pub fn stack(&self) -> &[Value] {
        self.stack.values()
    }

    pub fn frame_base(&self) -> usize {
        self.stack.frame_base()
    }

    /// The error that faulted the machine, if it has faulted.
    pub fn fault(&self) -> Option<&ExecError> {
        self.fault.as_ref()
    }

    /// Executes exactly one opcode.
    pub fn step(&mut self) -> Result<StepOutcome, ExecError> {
        if let Some(err) = &self.fault {
            return Err(err.clone());
        }
        if self.state == State::Halted {
            return Ok(StepOutcome::Halted);
        }

        let Some(word) = self.peek() else {
            return Ok(self.halt());
        };

        match self.exec(word) {
            Ok(StepOutcome::Halted) => Ok(self.halt()),
            Ok(StepOutcome::Continue) => {
                self.state = State::Running;
                Ok(StepOutcome::Continue)
            }
            Err(kind) => {
                let err = ExecError::new(kind, word, self.ip);
                debug!(ip = self.ip, error = %err, "stepper faulted");
                self.state = State::Faulted;
                self.fault = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Steps until halt or the first error.
    pub fn run(&mut self) -> Result<(), ExecError> {
        while self.step()? == StepOutcome::Continue {}
        Ok(())
    }

    fn halt(&mut self) -> StepOutcome {
        if self.state != State::Halted {
            debug!(ip = self.ip, depth = self.stack.len(), "stepper halted");
        }
        self.state = State::Halted;
        StepOutcome::Halted
    }

    /// Decodes and runs the instruction at `ip`, advancing past it on success.
    fn exec(&mut self, word: u32) -> Result<StepOutcome, ErrorKind> {
        let op = Opcode::try_from(word).map_err(|_| ErrorKind::InvalidOpcode)?;
        let operand = match op.operand() {
            Operand::None => None,
            shape => Some(const_value(shape, &self.code, self.ip + 1)?),
        };

        trace!(ip = self.ip, op = %op, depth = self.stack.len(), "step");

        if let Some(arith) = op.int_op() {
            let (under, top) = self.stack.pop_pair()?;
            self.stack.push(apply_int(arith, top, under)?);
        } else if let (Some(arith), Some(constant)) = (op.const_op(), operand) {
            self.stack.map_top(|top| apply_const(arith, top, constant))?;
        } else {
            match op {
                Opcode::Noop => {}
                Opcode::Halt => {
                    self.ip += op.width();
                    return Ok(StepOutcome::Halted);
                }
                Opcode::PushInt32
                | Opcode::PushInt64
                | Opcode::PushUint32
                | Opcode::PushUint64
                | Opcode::PushFloat32
                | Opcode::PushFloat64 => {
                    self.stack.push(operand.ok_or(ErrorKind::MissingConstArg)?);
                }
                Opcode::Pop => {
                    self.stack.pop()?;
                }
                Opcode::PopN => self.stack.pop_n(index_operand(operand)? as usize)?,
                Opcode::Copy => self.stack.copy(index_operand(operand)?)?,
                Opcode::Swap => self.stack.swap(index_operand(operand)?)?,
                Opcode::Negative => self.stack.map_top(|v| Ok(v.negate()))?,
                Opcode::Increment => self.stack.map_top(|v| Ok(v.increment()))?,
                Opcode::Decrement => self.stack.map_top(|v| Ok(v.decrement()))?,
                _ => return Err(ErrorKind::InvalidOpcode),
            }
        }

        self.ip += op.width();
        Ok(StepOutcome::Continue)
    }
}

/// The u32 operand of `PopN`/`Copy`/`Swap`, decoded as an unsigned value.
fn index_operand(operand: Option<Value>) -> Result<u32, ErrorKind> {
    match operand {
        Some(Value::Uint(n)) => u32::try_from(n).map_err(|_| ErrorKind::InvalidType),
        Some(_) => Err(ErrorKind::InvalidType),
        None => Err(ErrorKind::MissingConstArg),
    }
}
