//! Text assembler producing the VM's word stream.
//!
//! # Syntax
//!
//! ```text
//! MNEMONIC [ARG ARG ...] [; comment]
//! ```
//!
//! - Mnemonics are case-insensitive (`PushI32`, `pushi32`, `PUSHI32`)
//! - Arguments are whitespace separated and parsed per the opcode's
//!   declared argument types
//! - `;` starts a comment; `\;` does not
//! - Blank and comment-only lines produce nothing
//!
//! Assembly never stops at a bad line. The line is reported through the
//! diagnostic callback and the pass continues with the next one; words
//! already appended for a failing line are kept.

pub mod argument;
pub mod definition;
pub mod literal;

use std::fmt;

use tracing::{debug, warn};

pub use argument::ArgType;
pub use definition::{Definition, definitions, lookup};

use literal::{cut_space, strip_comment};

/// A non-fatal report about one source line that failed to assemble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line number.
    pub line: usize,
    /// The original, untrimmed line text.
    pub text: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)?;
        write!(f, "\n{:>4} | {}", self.line, self.text)
    }
}

/// Result of [`assemble_source`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    pub code: Vec<u32>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Assembly {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Assembles `lines` into words, passing each failing line to `report`.
pub fn assemble<I, S, F>(lines: I, mut report: F) -> Vec<u32>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: FnMut(Diagnostic),
{
    let lines = lines.into_iter();
    let mut code = Vec::with_capacity((lines.size_hint().0 * 3 / 4).max(10));
    let mut reported = 0usize;

    for (idx, raw) in lines.enumerate() {
        let raw = raw.as_ref();
        if let Err(message) = assemble_line(raw, &mut code) {
            let diagnostic = Diagnostic {
                line: idx + 1,
                text: raw.to_string(),
                message,
            };
            warn!(line = diagnostic.line, message = %diagnostic.message, "assembly diagnostic");
            reported += 1;
            report(diagnostic);
        }
    }

    debug!(words = code.len(), diagnostics = reported, "assembly finished");
    code
}

/// Assembles a whole source text, collecting diagnostics.
pub fn assemble_source(source: &str) -> Assembly {
    let mut diagnostics = Vec::new();
    let code = assemble(source.split('\n'), |d| diagnostics.push(d));
    Assembly { code, diagnostics }
}

fn assemble_line(raw: &str, code: &mut Vec<u32>) -> Result<(), String> {
    let line = strip_comment(raw).trim();
    if line.is_empty() {
        return Ok(());
    }

    let (mnemonic, rest, _) = cut_space(line);
    let Some(def) = lookup(mnemonic) else {
        return Err(format!("invalid opcode {mnemonic:?}"));
    };

    def.parse(code, rest).map_err(|e| e.to_string())
}
