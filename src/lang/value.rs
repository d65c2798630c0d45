use serde::{Deserialize, Serialize};

/// Runtime value on the VM stack.
///
/// The stack only ever holds one of these three numeric tags; every
/// coercion below is an exhaustive match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// 64-bit signed integer.
    Int(i64),

    /// 64-bit unsigned integer.
    Uint(u64),

    /// 64-bit floating-point number.
    Float(f64),
}

impl Value {
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Float(_) => "float",
        }
    }

    /// Signed view: floats truncate toward zero (saturating, NaN is 0),
    /// unsigned values reinterpret their bits.
    pub fn to_int(self) -> i64 {
        match self {
            Value::Int(n) => n,
            Value::Uint(n) => n as i64,
            Value::Float(n) => n as i64,
        }
    }

    /// Unsigned view: floats truncate toward zero (saturating, negatives and
    /// NaN are 0), signed values reinterpret their bits.
    pub fn to_uint(self) -> u64 {
        match self {
            Value::Int(n) => n as u64,
            Value::Uint(n) => n,
            Value::Float(n) => n as u64,
        }
    }

    pub fn to_float(self) -> f64 {
        match self {
            Value::Int(n) => n as f64,
            Value::Uint(n) => n as f64,
            Value::Float(n) => n,
        }
    }

    /// Negation within the value's own tag; unsigned wraps.
    pub fn negate(self) -> Value {
        match self {
            Value::Int(n) => Value::Int(n.wrapping_neg()),
            Value::Uint(n) => Value::Uint(n.wrapping_neg()),
            Value::Float(n) => Value::Float(-n),
        }
    }

    pub fn increment(self) -> Value {
        match self {
            Value::Int(n) => Value::Int(n.wrapping_add(1)),
            Value::Uint(n) => Value::Uint(n.wrapping_add(1)),
            Value::Float(n) => Value::Float(n + 1.0),
        }
    }

    pub fn decrement(self) -> Value {
        match self {
            Value::Int(n) => Value::Int(n.wrapping_sub(1)),
            Value::Uint(n) => Value::Uint(n.wrapping_sub(1)),
            Value::Float(n) => Value::Float(n - 1.0),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Uint(n) => write!(f, "{}u", n),
            Value::Float(n) => write!(f, "{:?}", n),
        }
    }
}

/// Encodes a stack as compact bytes.
///
/// Two stacks with equal snapshots hold the same tags and the same bit
/// patterns, NaN payloads included.
pub fn snapshot(values: &[Value]) -> Result<Vec<u8>, postcard::Error> {
    postcard::to_allocvec(values)
}

pub fn restore(bytes: &[u8]) -> Result<Vec<Value>, postcard::Error> {
    postcard::from_bytes(bytes)
}
