//! A small stack virtual machine over 32-bit instruction words, with a text
//! assembler and two interchangeable execution engines.
//!
//! ```
//! use stackvm::{Value, Vm, assemble_source};
//!
//! let asm = assemble_source("PushI32 10\nPushI32 32\nAddInt\nHalt\n");
//! assert!(asm.is_clean());
//!
//! let mut vm = Vm::new();
//! vm.execute(&asm.code).unwrap();
//! assert_eq!(vm.stack(), &[Value::Int(42)]);
//! ```

pub mod asm;
pub mod bytecode;
pub mod error;
pub mod lang;
pub mod runtime;

pub use asm::{Assembly, Diagnostic, assemble, assemble_source};
pub use bytecode::disasm::{disassemble, hex_dump};
pub use bytecode::stack_check::{StackCheckError, check_code};
pub use bytecode::{Opcode, Operand};
pub use error::{AsmError, ErrorKind, ExecError};
pub use lang::value::{Value, restore, snapshot};
pub use runtime::{State, StepOutcome, Stepper, ValueStack, Vm, VmConfig};
