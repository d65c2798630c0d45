pub mod arith;
pub mod stack;
pub mod stepper;
pub mod vm_bc;

pub use stack::ValueStack;
pub use stepper::{State, StepOutcome, Stepper};
pub use vm_bc::{Vm, VmConfig};
