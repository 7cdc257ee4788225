//! Stack value types shared by the store and the device surface.

use std::fmt;
use std::num::NonZeroUsize;

use crate::error::ResizeError;

/// Maximum number of live elements a stack may hold.
///
/// Always positive: a zero or negative request is unrepresentable, so the
/// `InvalidSize` check happens once, at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Capacity(NonZeroUsize);

impl Capacity {
    /// Capacity a freshly created device starts with.
    pub const DEFAULT: Capacity = Capacity(NonZeroUsize::new(16).unwrap());

    /// Validate a caller-supplied capacity.
    ///
    /// Requests too large for the address space are reported as
    /// `OutOfMemory`, the same outcome a failed allocation would produce.
    pub fn new(requested: i64) -> Result<Self, ResizeError> {
        if requested <= 0 {
            return Err(ResizeError::InvalidSize { requested });
        }
        let slots =
            usize::try_from(requested).map_err(|_| ResizeError::OutOfMemory { requested })?;
        NonZeroUsize::new(slots)
            .map(Self)
            .ok_or(ResizeError::InvalidSize { requested })
    }

    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A popped value, rendered the way readers receive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormattedValue(i32);

impl FormattedValue {
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Decimal text followed by a newline, e.g. `"-42\n"`.
    #[must_use]
    pub fn to_line(self) -> String {
        format!("{}\n", self.0)
    }
}

impl fmt::Display for FormattedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a successful read.
///
/// An empty stack is an expected terminal condition, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Value(FormattedValue),
    Empty,
}

impl ReadOutcome {
    #[must_use]
    pub const fn value(self) -> Option<i32> {
        match self {
            Self::Value(v) => Some(v.value()),
            Self::Empty => None,
        }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Point-in-time copy of the stack, taken under the store lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSnapshot {
    pub capacity: Capacity,
    /// Live values, bottom first. `values.len()` is the top-of-stack index.
    pub values: Vec<i32>,
}

impl StackSnapshot {
    #[must_use]
    pub fn top(&self) -> usize {
        self.values.len()
    }
}
