//! Runtime values carried on the VM stack.

pub mod value;
