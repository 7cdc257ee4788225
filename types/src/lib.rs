//! Core domain types for keystack.
//!
//! This crate contains pure domain types with no IO, no locking, and minimal
//! dependencies. The stack store, presence gate and device controller in
//! `keystack-core` are all expressed in terms of these types.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod error;
mod payload;
mod stack;
mod token;

pub use error::{DeviceError, MalformedInput, ResizeError, StackFull};
pub use payload::{MAX_WRITE_LEN, parse_write_payload};
pub use stack::{Capacity, FormattedValue, ReadOutcome, StackSnapshot};
pub use token::{HotplugEvent, HotplugKind, TokenId};
