use thiserror::Error;

use crate::bytecode::codec::const_arg_u32;
use crate::bytecode::op::{Opcode, Operand};
use crate::error::{ErrorKind, ExecError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackCheckError {
    #[error("stack-check error: stack underflow at ip={ip}, op={op}, needed {needed} items, had {height}")]
    Underflow {
        ip: usize,
        op: Opcode,
        needed: usize,
        height: usize,
    },

    #[error("stack-check error: index {index} out of bounds at ip={ip}, op={op}, height {height}")]
    IndexOutOfBounds {
        ip: usize,
        op: Opcode,
        index: u32,
        height: usize,
    },

    #[error("stack-check error: {0}")]
    Decode(#[from] ExecError),
}

/// Returns (pops, pushes) for an op. `operand` is the decoded u32 operand
/// for `PopN`, ignored otherwise.
fn effect(op: Opcode, operand: u32) -> (usize, usize) {
    use Opcode::*;
    match op {
        Noop | Halt => (0, 0),

        PushInt32 | PushInt64 | PushUint32 | PushUint64 | PushFloat32 | PushFloat64 => (0, 1),

        Pop => (1, 0),
        PopN => (operand as usize, 0),
        Copy => (0, 1),
        Swap => (0, 0),

        AddInt | SubInt | MulInt | DivInt => (2, 1),

        // Negative, Increment, Decrement and every constant-binary op
        _ => (1, 1),
    }
}

/// Walks `code` linearly from `initial_height`, applying each opcode's stack
/// effect. Returns the final height.
///
/// Stops at the first `Halt`; code after it is never reached.
pub fn check_code(code: &[u32], initial_height: usize) -> Result<usize, StackCheckError> {
    let mut height = initial_height;
    let mut ip = 0;

    while ip < code.len() {
        let word = code[ip];
        let op = Opcode::try_from(word)
            .map_err(|_| ExecError::new(ErrorKind::InvalidOpcode, word, ip))?;

        let operand = match op.operand() {
            Operand::None => 0,
            Operand::U32 => const_arg_u32(code, ip + 1).map_err(|k| ExecError::new(k, word, ip))?,
            shape => {
                // only the presence of the operand matters here
                if code.len() < ip + 1 + shape.words() {
                    return Err(ExecError::new(ErrorKind::MissingConstArg, word, ip).into());
                }
                0
            }
        };

        if matches!(op, Opcode::Copy | Opcode::Swap) && operand as usize >= height {
            return Err(StackCheckError::IndexOutOfBounds {
                ip,
                op,
                index: operand,
                height,
            });
        }

        let (pops, pushes) = effect(op, operand);
        height = height
            .checked_sub(pops)
            .ok_or(StackCheckError::Underflow {
                ip,
                op,
                needed: pops,
                height,
            })?;
        height += pushes;

        if op == Opcode::Halt {
            break;
        }
        ip += op.width();
    }

    Ok(height)
}
