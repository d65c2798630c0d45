use std::collections::HashMap;
use std::sync::OnceLock;

use crate::bytecode::op::Opcode;
use crate::error::AsmError;

use super::argument::ArgType;

/// How one mnemonic assembles: its opcode word and the arguments it expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub name: &'static str,
    pub value: u32,
    pub arguments: Vec<ArgType>,
}

impl Definition {
    pub fn new(name: &'static str, value: u32, arguments: Vec<ArgType>) -> Self {
        Self {
            name,
            value,
            arguments,
        }
    }

    pub fn for_opcode(op: Opcode) -> Self {
        let arguments = ArgType::for_operand(op.operand()).into_iter().collect();
        Self::new(op.mnemonic(), op.into(), arguments)
    }

    /// Appends this instruction to `out`, parsing `args` per the declared
    /// argument list.
    ///
    /// Every declared operand slot is emitted even when parsing fails, so the
    /// output keeps its shape. Only the first error is returned.
    pub fn parse(&self, out: &mut Vec<u32>, args: &str) -> Result<(), AsmError> {
        out.push(self.value);

        if self.arguments.is_empty() {
            if !args.is_empty() {
                return Err(AsmError::invalid_count(format!(
                    "{} takes no arguments",
                    self.name
                )));
            }
            return Ok(());
        }

        let mut rest = args;
        let mut first_error = None;
        for arg in &self.arguments {
            let (remaining, result) = arg.parse(rest, out);
            rest = remaining;
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }
        if !rest.is_empty() {
            return Err(AsmError::invalid_count(format!(
                "{} expects {} argument(s); unexpected {:?}",
                self.name,
                self.arguments.len(),
                rest
            )));
        }
        Ok(())
    }
}

/// The immutable mnemonic table, keyed by lowercase mnemonic.
///
/// Built on first use; every later call returns the same table.
pub fn definitions() -> &'static HashMap<String, Definition> {
    static DEFINITIONS: OnceLock<HashMap<String, Definition>> = OnceLock::new();
    DEFINITIONS.get_or_init(|| {
        Opcode::ALL
            .iter()
            .map(|op| (op.mnemonic().to_ascii_lowercase(), Definition::for_opcode(*op)))
            .collect()
    })
}

/// Case-insensitive mnemonic lookup.
pub fn lookup(mnemonic: &str) -> Option<&'static Definition> {
    definitions().get(&mnemonic.to_ascii_lowercase())
}
