//! Validation of write payloads.
//!
//! Parsing happens before the stack lock is taken, so a malformed payload
//! never contends with stack traffic.

use std::str;

use crate::error::MalformedInput;

/// Largest accepted write payload in bytes. Anything of 32 bytes or more is
/// rejected outright.
pub const MAX_WRITE_LEN: usize = 31;

/// Parse a raw write payload as a single signed decimal `i32`.
///
/// Surrounding ASCII whitespace is ignored so a trailing newline from a
/// line-oriented writer is accepted. Anything else around the number is
/// rejected.
pub fn parse_write_payload(raw: &[u8]) -> Result<i32, MalformedInput> {
    if raw.len() > MAX_WRITE_LEN {
        return Err(MalformedInput::TooLong {
            len: raw.len(),
            max: MAX_WRITE_LEN,
        });
    }
    let text = str::from_utf8(raw).map_err(|_| MalformedInput::NotAnInteger)?;
    text.trim_ascii()
        .parse::<i32>()
        .map_err(|_| MalformedInput::NotAnInteger)
}
