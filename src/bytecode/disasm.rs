use std::fmt::Write;

use crate::bytecode::codec::{
    const_arg_f32, const_arg_f64, const_arg_i32, const_arg_i64, const_arg_u32, const_arg_u64,
};
use crate::bytecode::op::{Opcode, Operand};
use crate::error::{ErrorKind, ExecError};

/// Renders one line per instruction: offset, mnemonic, decoded operand.
///
/// ```text
/// 0000  PushI32        10
/// 0002  PushF64        1.5
/// 0005  AddInt
/// ```
pub fn disassemble(code: &[u32]) -> Result<String, ExecError> {
    let mut out = String::new();
    let mut ip = 0;

    while ip < code.len() {
        let word = code[ip];
        let op = Opcode::try_from(word)
            .map_err(|_| ExecError::new(ErrorKind::InvalidOpcode, word, ip))?;
        let operand =
            format_operand(op.operand(), code, ip + 1).map_err(|k| ExecError::new(k, word, ip))?;

        match operand {
            Some(text) => {
                let _ = writeln!(out, "{:04}  {:<14} {}", ip, op.mnemonic(), text);
            }
            None => {
                let _ = writeln!(out, "{:04}  {}", ip, op.mnemonic());
            }
        }

        ip += op.width();
    }

    Ok(out)
}

fn format_operand(
    operand: Operand,
    code: &[u32],
    idx: usize,
) -> Result<Option<String>, ErrorKind> {
    Ok(Some(match operand {
        Operand::None => return Ok(None),
        Operand::I32 => const_arg_i32(code, idx)?.to_string(),
        Operand::I64 => const_arg_i64(code, idx)?.to_string(),
        Operand::U32 => const_arg_u32(code, idx)?.to_string(),
        Operand::U64 => const_arg_u64(code, idx)?.to_string(),
        Operand::F32 => format!("{:?}", const_arg_f32(code, idx)?),
        Operand::F64 => format!("{:?}", const_arg_f64(code, idx)?),
    }))
}

/// Raw words as `0x%08x`, four per row, each row prefixed with its offset.
pub fn hex_dump(code: &[u32]) -> String {
    let mut out = String::new();
    for (row, chunk) in code.chunks(4).enumerate() {
        let _ = write!(out, "{:04}:", row * 4);
        for word in chunk {
            let _ = write!(out, " 0x{:08x}", word);
        }
        out.push('\n');
    }
    out
}
