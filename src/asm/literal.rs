//! Token cutting and numeric literal grammar for assembler operands.
//!
//! Integer literals take an optional sign (signed only) followed by an
//! optional base prefix, checked longest first:
//!
//! | prefix | base |
//! |--------|------|
//! | `0x`   | 16   |
//! | `0o`   | 8    |
//! | `0b`   | 2    |
//! | `o`    | 8    |
//! | `0`    | 8    |
//! | `b`    | 2    |
//!
//! A lone `0` is always decimal zero.

use crate::error::AsmError;

const COMMENT_CHAR: char = ';';
const ESCAPE_CHAR: char = '\\';

/// Removes everything from the first unescaped `;` onward.
pub fn strip_comment(line: &str) -> &str {
    let mut prev = None;
    for (idx, ch) in line.char_indices() {
        if ch == COMMENT_CHAR && prev != Some(ESCAPE_CHAR) {
            return &line[..idx];
        }
        prev = Some(ch);
    }
    line
}

/// Splits `line` at its first whitespace run.
///
/// Returns the leading token, the text after the whitespace run, and whether
/// any whitespace was found.
pub fn cut_space(line: &str) -> (&str, &str, bool) {
    let Some(start) = line.find(char::is_whitespace) else {
        return (line, "", false);
    };
    let rest = line[start..].trim_start();
    (&line[..start], rest, true)
}

/// Parses a signed integer literal that must fit in `bits` (32 or 64).
pub fn parse_int(value: &str, bits: u32) -> Result<i64, AsmError> {
    if value.is_empty() {
        return Err(AsmError::invalid_value("integer value may not be empty"));
    }

    let (negative, body) = match value.as_bytes()[0] {
        b'-' => (true, &value[1..]),
        b'+' => (false, &value[1..]),
        _ => (false, value),
    };
    if body.is_empty() {
        return Err(AsmError::invalid_value(
            "integer value may not be just sign character",
        ));
    }
    if body == "0" {
        return Ok(0);
    }

    let (base, digits) = split_base(body);
    if digits.is_empty() {
        return Err(AsmError::invalid_value(
            "integer may not be only base prefix",
        ));
    }

    // the magnitude must fit the signed width before the sign is applied
    let magnitude = parse_digits(digits, base, value, "integer")?;
    if magnitude >= 1u64 << (bits - 1) {
        return Err(AsmError::invalid_value(format!(
            "integer value {value:?} out of range for {bits}-bit integer"
        )));
    }

    let magnitude = magnitude as i64;
    Ok(if negative { -magnitude } else { magnitude })
}

/// Parses an unsigned integer literal that must fit in `bits` (32 or 64).
pub fn parse_uint(value: &str, bits: u32) -> Result<u64, AsmError> {
    if value.is_empty() {
        return Err(AsmError::invalid_value(
            "unsigned integer value may not be empty",
        ));
    }
    if value.starts_with(['+', '-']) {
        return Err(AsmError::invalid_value(format!(
            "unsigned integer value {value:?} may not carry a sign"
        )));
    }
    if value == "0" {
        return Ok(0);
    }

    let (base, digits) = split_base(value);
    if digits.is_empty() {
        return Err(AsmError::invalid_value(
            "unsigned integer may not be only base prefix",
        ));
    }

    let parsed = parse_digits(digits, base, value, "unsigned integer")?;
    if bits < 64 && parsed >> bits != 0 {
        return Err(AsmError::invalid_value(format!(
            "unsigned integer value {value:?} out of range for {bits}-bit integer"
        )));
    }
    Ok(parsed)
}

pub fn parse_f32(value: &str) -> Result<f32, AsmError> {
    let parsed: f32 = value.parse().map_err(|_| invalid_float(value))?;
    if parsed.is_infinite() && !is_infinity_literal(value) {
        return Err(invalid_float(value));
    }
    Ok(parsed)
}

pub fn parse_f64(value: &str) -> Result<f64, AsmError> {
    let parsed: f64 = value.parse().map_err(|_| invalid_float(value))?;
    if parsed.is_infinite() && !is_infinity_literal(value) {
        return Err(invalid_float(value));
    }
    Ok(parsed)
}

fn invalid_float(value: &str) -> AsmError {
    AsmError::invalid_value(format!("invalid float value {value:?}"))
}

fn is_infinity_literal(value: &str) -> bool {
    let unsigned = value.trim_start_matches(['+', '-']);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

/// Detects the base prefix, longest match first.
fn split_base(body: &str) -> (u32, &str) {
    const PREFIXES: [(&str, u32); 6] = [
        ("0x", 16),
        ("0o", 8),
        ("0b", 2),
        ("o", 8),
        ("0", 8),
        ("b", 2),
    ];

    for (prefix, base) in PREFIXES {
        if let Some(rest) = body.strip_prefix(prefix) {
            return (base, rest);
        }
    }
    (10, body)
}

fn parse_digits(digits: &str, base: u32, literal: &str, what: &str) -> Result<u64, AsmError> {
    // from_str_radix tolerates a leading '+', which would let "0x+1" through
    if digits.starts_with(['+', '-']) {
        return Err(AsmError::invalid_value(format!(
            "invalid {what} value {literal:?}"
        )));
    }
    u64::from_str_radix(digits, base).map_err(|e| {
        AsmError::invalid_value(format!("invalid {what} value {literal:?}: {e}"))
    })
}
