//! The resizable integer stack and its single exclusive lock.
//!
//! # Truncation on shrink
//!
//! Shrinking below the current element count does **not** fail and does
//! **not** hand the excess back to anyone. The top-of-stack index is simply
//! cut down to the new capacity, so the most recently pushed values above it
//! are gone. After pushing `1..=5` into capacity 5 and resizing to 3, pops
//! yield `3, 2, 1`. Callers that care must drain before shrinking.

use parking_lot::Mutex;
use tracing::{debug, warn};

use keystack_types::{Capacity, ResizeError, StackFull, StackSnapshot};

#[derive(Debug)]
struct Stack {
    /// Live elements only, bottom first; `buffer.len()` is the top-of-stack
    /// index. Slots above it are reserved but never written.
    buffer: Vec<i32>,
    capacity: Capacity,
}

/// Owner of the stack. Every operation holds the lock for its full duration,
/// so check-then-mutate sequences are never split.
#[derive(Debug)]
pub struct StackStore {
    inner: Mutex<Stack>,
}

impl StackStore {
    #[must_use]
    pub fn new(capacity: Capacity) -> Self {
        Self {
            inner: Mutex::new(Stack {
                buffer: Vec::with_capacity(capacity.get()),
                capacity,
            }),
        }
    }

    pub fn push(&self, value: i32) -> Result<(), StackFull> {
        let mut stack = self.inner.lock();
        if stack.buffer.len() == stack.capacity.get() {
            return Err(StackFull {
                capacity: stack.capacity.get(),
            });
        }
        stack.buffer.push(value);
        debug!(value, top = stack.buffer.len(), "pushed");
        Ok(())
    }

    /// Pop the most recently pushed value. `None` means empty.
    pub fn pop(&self) -> Option<i32> {
        let mut stack = self.inner.lock();
        let value = stack.buffer.pop()?;
        debug!(value, top = stack.buffer.len(), "popped");
        Some(value)
    }

    /// Change the capacity in place.
    ///
    /// Growth reserves room for the new capacity before anything else
    /// changes; a failed reservation leaves the buffer untouched, so
    /// `OutOfMemory` leaves the stack exactly as it was. Only live elements
    /// are ever copied, so the work under the lock is bounded by the element
    /// count, not by the requested capacity. Shrinking truncates; see the
    /// module docs.
    pub fn resize(&self, requested: i64) -> Result<(), ResizeError> {
        let capacity = Capacity::new(requested)?;

        let mut stack = self.inner.lock();
        let old = stack.capacity;
        if capacity == old {
            return Ok(());
        }

        if capacity > old {
            let additional = capacity.get() - stack.buffer.len();
            stack
                .buffer
                .try_reserve_exact(additional)
                .map_err(|_| ResizeError::OutOfMemory { requested })?;
        } else {
            let top = stack.buffer.len();
            if top > capacity.get() {
                stack.buffer.truncate(capacity.get());
                warn!(
                    dropped = top - capacity.get(),
                    from = %old,
                    to = %capacity,
                    "Shrinking stack discarded elements above the new capacity"
                );
            }
            stack.buffer.shrink_to(capacity.get());
        }
        stack.capacity = capacity;

        debug!(from = %old, to = %capacity, top = stack.buffer.len(), "resized");
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn capacity(&self) -> Capacity {
        self.inner.lock().capacity
    }

    #[must_use]
    pub fn snapshot(&self) -> StackSnapshot {
        let stack = self.inner.lock();
        StackSnapshot {
            capacity: stack.capacity,
            values: stack.buffer.clone(),
        }
    }
}

impl Default for StackStore {
    fn default() -> Self {
        Self::new(Capacity::DEFAULT)
    }
}
