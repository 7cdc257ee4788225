//! The operation surface callers invoke.
//!
//! Every handler consults the presence gate first, before parsing or taking
//! the stack lock, and maps store outcomes onto [`DeviceError`].

use std::fmt;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use keystack_types::{
    Capacity, DeviceError, FormattedValue, ReadOutcome, StackSnapshot, TokenId,
    parse_write_payload,
};

use crate::presence::{PresenceGate, PresenceState, Transition};
use crate::registrar::{Registrar, RegistrarError};
use crate::store::StackStore;

/// Composition root: one stack, one presence gate, one registrar.
///
/// Construct once at startup and share by reference (or `Arc`) with every
/// caller and with the hotplug pump.
pub struct Device {
    gate: PresenceGate,
    store: StackStore,
    registrar: Box<dyn Registrar>,
    endpoint: String,
    /// Serializes gate transitions with their publish/withdraw calls so the
    /// registrar sees them in gate order. Never held together with the stack lock.
    lifecycle: Mutex<()>,
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("endpoint", &self.endpoint)
            .field("gate", &self.gate)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl Device {
    #[must_use]
    pub fn new(
        capacity: Capacity,
        endpoint: impl Into<String>,
        registrar: Box<dyn Registrar>,
    ) -> Self {
        Self {
            gate: PresenceGate::new(),
            store: StackStore::new(capacity),
            registrar,
            endpoint: endpoint.into(),
            lifecycle: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        self.gate.is_present()
    }

    #[must_use]
    pub fn presence(&self) -> PresenceState {
        self.gate.state()
    }

    /// Diagnostic copy of the stack. Not gated.
    #[must_use]
    pub fn snapshot(&self) -> StackSnapshot {
        self.store.snapshot()
    }

    fn authorize(&self, op: &'static str) -> Result<(), DeviceError> {
        if self.gate.is_present() {
            Ok(())
        } else {
            debug!(op, "Rejected: token not present");
            Err(DeviceError::NotAuthorized)
        }
    }

    /// Stateless: no per-caller handle is tracked.
    pub fn handle_open(&self) -> Result<(), DeviceError> {
        self.authorize("open")
    }

    pub fn handle_read(&self) -> Result<ReadOutcome, DeviceError> {
        self.authorize("read")?;
        Ok(match self.store.pop() {
            Some(value) => ReadOutcome::Value(FormattedValue::new(value)),
            None => ReadOutcome::Empty,
        })
    }

    /// Push the integer encoded in `raw`. Returns the number of bytes accepted.
    pub fn handle_write(&self, raw: &[u8]) -> Result<usize, DeviceError> {
        self.authorize("write")?;
        let value = parse_write_payload(raw)?;
        self.store.push(value)?;
        Ok(raw.len())
    }

    /// Resize the stack. Shrinking below the element count discards the
    /// values above the new capacity without returning them.
    pub fn handle_configure(&self, new_capacity: i64) -> Result<(), DeviceError> {
        self.authorize("configure")?;
        self.store.resize(new_capacity)?;
        Ok(())
    }

    /// Token attached. A failed publish closes the gate again so a later
    /// attach can retry.
    pub fn on_attach(&self, token: TokenId) -> Result<(), RegistrarError> {
        let _transition = self.lifecycle.lock();
        match self.gate.on_attach(token) {
            Transition::ToPresent => {
                info!(token = %token, "Token attached");
                if let Err(err) = self.on_gate_transition(true) {
                    self.gate.on_detach(token);
                    warn!(token = %token, "Publish failed, gate closed again: {err}");
                    return Err(err);
                }
                Ok(())
            }
            Transition::ToAbsent | Transition::Unchanged => {
                debug!(token = %token, "Duplicate attach ignored");
                Ok(())
            }
        }
    }

    /// Token detached. Operations already holding the stack lock finish;
    /// anything checking the gate afterwards is refused.
    pub fn on_detach(&self, token: TokenId) {
        let _transition = self.lifecycle.lock();
        match self.gate.on_detach(token) {
            Transition::ToAbsent => {
                info!(token = %token, "Token detached");
                if let Err(err) = self.on_gate_transition(false) {
                    warn!(token = %token, "Withdraw failed: {err}");
                }
            }
            Transition::ToPresent | Transition::Unchanged => {
                debug!(token = %token, "Duplicate detach ignored");
            }
        }
    }

    /// The only place the registrar is called.
    fn on_gate_transition(&self, to_present: bool) -> Result<(), RegistrarError> {
        if to_present {
            self.registrar.publish(&self.endpoint)
        } else {
            self.registrar.withdraw(&self.endpoint)
        }
    }

    /// Teardown: withdraw the endpoint if it is published and close the gate.
    pub fn shutdown(&self) {
        if let PresenceState::Present(token) = self.gate.state() {
            self.on_detach(token);
        }
        info!(endpoint = %self.endpoint, "Device shut down");
    }
}
