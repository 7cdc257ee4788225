//! Typed failure outcomes for the stack and the device surface.
//!
//! Every failure is returned to the immediate caller; none is fatal and none
//! is retried by the core.

use thiserror::Error;

/// Push into a stack whose capacity is exhausted. Nothing was mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("stack is full (capacity {capacity})")]
pub struct StackFull {
    pub capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResizeError {
    #[error("capacity must be positive, got {requested}")]
    InvalidSize { requested: i64 },
    /// Growth allocation failed; the stack keeps its prior contents and capacity.
    #[error("cannot allocate storage for {requested} elements")]
    OutOfMemory { requested: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedInput {
    #[error("write payload is {len} bytes, limit is {max}")]
    TooLong { len: usize, max: usize },
    #[error("write payload is not a decimal integer")]
    NotAnInteger,
}

/// Boundary-level failure of a device operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("authorizing token is not present")]
    NotAuthorized,
    #[error(transparent)]
    MalformedInput(#[from] MalformedInput),
    #[error(transparent)]
    Full(#[from] StackFull),
    #[error("capacity must be positive, got {requested}")]
    InvalidSize { requested: i64 },
    #[error("cannot allocate storage for {requested} elements")]
    OutOfMemory { requested: i64 },
}

impl DeviceError {
    /// Errno the character-device front end reports for this failure.
    #[must_use]
    pub const fn errno_name(self) -> &'static str {
        match self {
            Self::NotAuthorized => "ENODEV",
            Self::MalformedInput(_) | Self::InvalidSize { .. } => "EINVAL",
            Self::Full(_) => "ERANGE",
            Self::OutOfMemory { .. } => "ENOMEM",
        }
    }
}

impl From<ResizeError> for DeviceError {
    fn from(err: ResizeError) -> Self {
        match err {
            ResizeError::InvalidSize { requested } => Self::InvalidSize { requested },
            ResizeError::OutOfMemory { requested } => Self::OutOfMemory { requested },
        }
    }
}
