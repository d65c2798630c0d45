pub mod codec;
pub mod disasm;
pub mod op;
pub mod stack_check;

pub use op::{ArithOp, Opcode, Operand};
