use crate::error::ErrorKind;
use crate::lang::value::Value;

/// The value stack together with the current frame base.
///
/// Everything below `base` belongs to an enclosing frame: it can't be
/// popped, copied from, or swapped with. Every accessor checks that and
/// reports a bounds error instead of clamping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueStack {
    values: Vec<Value>,
    base: usize,
}

impl ValueStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            base: 0,
        }
    }

    /// A stack whose frame starts at `base`. `base` may equal the length
    /// (an empty frame) but not exceed it.
    pub fn with_frame(values: Vec<Value>, base: usize) -> Result<Self, ErrorKind> {
        if base > values.len() {
            return Err(ErrorKind::IndexOutOfBounds);
        }
        Ok(Self { values, base })
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn frame_base(&self) -> usize {
        self.base
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drops every value and resets the frame base, keeping the allocation.
    pub fn clear(&mut self) {
        self.values.clear();
        self.base = 0;
    }

    pub fn reserve(&mut self, additional: usize) {
        self.values.reserve(additional);
    }

    #[inline]
    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Checks that `k` values can be removed without crossing the frame
    /// base; returns the length after removal.
    #[inline]
    fn require(&self, k: usize) -> Result<usize, ErrorKind> {
        let remaining = self
            .values
            .len()
            .checked_sub(k)
            .ok_or(ErrorKind::TooFewValues)?;
        if remaining < self.base {
            return Err(ErrorKind::IndexOutOfBounds);
        }
        Ok(remaining)
    }

    #[inline]
    pub fn pop(&mut self) -> Result<Value, ErrorKind> {
        self.require(1)?;
        self.values.pop().ok_or(ErrorKind::TooFewValues)
    }

    /// Pops `(a, b)` where `b` was on top.
    #[inline]
    pub fn pop_pair(&mut self) -> Result<(Value, Value), ErrorKind> {
        let remaining = self.require(2)?;
        let (a, b) = (self.values[remaining], self.values[remaining + 1]);
        self.values.truncate(remaining);
        Ok((a, b))
    }

    #[inline]
    pub fn pop_n(&mut self, n: usize) -> Result<(), ErrorKind> {
        let remaining = self.require(n)?;
        self.values.truncate(remaining);
        Ok(())
    }

    /// Replaces the top value with `f(top)`.
    #[inline]
    pub fn map_top<F>(&mut self, f: F) -> Result<(), ErrorKind>
    where
        F: FnOnce(Value) -> Result<Value, ErrorKind>,
    {
        self.require(1)?;
        let top = self.values.last_mut().ok_or(ErrorKind::TooFewValues)?;
        *top = f(*top)?;
        Ok(())
    }

    fn frame_index(&self, offset: u32) -> Result<usize, ErrorKind> {
        self.base
            .checked_add(offset as usize)
            .filter(|&idx| idx < self.values.len())
            .ok_or(ErrorKind::IndexOutOfBounds)
    }

    /// Pushes a copy of the value at `frame_base + offset`.
    #[inline]
    pub fn copy(&mut self, offset: u32) -> Result<(), ErrorKind> {
        let idx = self.frame_index(offset)?;
        let value = self.values[idx];
        self.values.push(value);
        Ok(())
    }

    /// Exchanges the value at `frame_base + offset` with the top.
    #[inline]
    pub fn swap(&mut self, offset: u32) -> Result<(), ErrorKind> {
        let idx = self.frame_index(offset)?;
        let top = self.values.len() - 1;
        self.values.swap(idx, top);
        Ok(())
    }
}
