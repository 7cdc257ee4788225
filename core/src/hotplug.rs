//! Hotplug plumbing: where attach/detach events come from and how they
//! reach the device.
//!
//! ```text
//! HotplugSender --(bounded channel)--> ChannelEventSource
//!                                            |
//!                         HotplugPump thread: next_event() -> TokenFilter -> Device
//! ```

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use keystack_types::{HotplugEvent, HotplugKind, TokenId};

use crate::device::Device;
use crate::registrar::RegistrarError;

const HOTPLUG_CHANNEL_CAPACITY: usize = 64; // bounded: no OOM

/// Source of attach/detach events, drained by [`HotplugPump`].
pub trait EventSource: Send {
    /// Block until the next event. `None` means the source is closed.
    fn next_event(&mut self) -> Option<HotplugEvent>;
}

/// Fixed sequence of events, for replaying a known hotplug history.
#[derive(Debug, Default)]
pub struct ScriptedEventSource {
    events: VecDeque<HotplugEvent>,
}

impl ScriptedEventSource {
    #[must_use]
    pub fn new(events: impl IntoIterator<Item = HotplugEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }
}

impl EventSource for ScriptedEventSource {
    fn next_event(&mut self) -> Option<HotplugEvent> {
        self.events.pop_front()
    }
}

/// Receiving half of [`hotplug_channel`].
#[derive(Debug)]
pub struct ChannelEventSource {
    rx: mpsc::Receiver<HotplugEvent>,
}

impl EventSource for ChannelEventSource {
    fn next_event(&mut self) -> Option<HotplugEvent> {
        self.rx.blocking_recv()
    }
}

/// Sending half of [`hotplug_channel`]. Must not be used from async code.
#[derive(Debug, Clone)]
pub struct HotplugSender {
    tx: mpsc::Sender<HotplugEvent>,
}

impl HotplugSender {
    /// Returns `false` once the receiving side is gone.
    pub fn send(&self, event: HotplugEvent) -> bool {
        // Bounded queue: apply backpressure instead of dropping events.
        self.tx.blocking_send(event).is_ok()
    }

    pub fn attach(&self, token: TokenId, interface: u8) -> bool {
        self.send(HotplugEvent::attach(token, interface))
    }

    pub fn detach(&self, token: TokenId, interface: u8) -> bool {
        self.send(HotplugEvent::detach(token, interface))
    }
}

#[must_use]
pub fn hotplug_channel() -> (HotplugSender, ChannelEventSource) {
    let (tx, rx) = mpsc::channel(HOTPLUG_CHANNEL_CAPACITY);
    (HotplugSender { tx }, ChannelEventSource { rx })
}

/// Which hotplug events are allowed to drive the gate: one recognized token
/// identity, on one interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenFilter {
    pub token: TokenId,
    pub interface: u8,
}

impl TokenFilter {
    #[must_use]
    pub const fn new(token: TokenId, interface: u8) -> Self {
        Self { token, interface }
    }

    #[must_use]
    pub fn admits(&self, event: &HotplugEvent) -> bool {
        event.token == self.token && event.interface == self.interface
    }
}

/// Route one event through `filter` into `device`.
///
/// Returns `Ok(false)` when the filter dropped the event.
pub fn dispatch(
    device: &Device,
    filter: &TokenFilter,
    event: HotplugEvent,
) -> Result<bool, RegistrarError> {
    if !filter.admits(&event) {
        debug!(
            token = %event.token,
            interface = event.interface,
            kind = ?event.kind,
            "Ignoring hotplug event for unrecognized token or interface"
        );
        return Ok(false);
    }
    match event.kind {
        HotplugKind::Attach => device.on_attach(event.token)?,
        HotplugKind::Detach => device.on_detach(event.token),
    }
    Ok(true)
}

/// Counts of what the pump did with the events it drained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub dispatched: usize,
    pub ignored: usize,
    pub failed: usize,
}

/// Dedicated thread feeding an [`EventSource`] into a [`Device`].
///
/// Runs until the source reports closed.
#[derive(Debug)]
pub struct HotplugPump {
    join: Option<JoinHandle<PumpStats>>,
}

impl HotplugPump {
    pub fn spawn(
        device: Arc<Device>,
        filter: TokenFilter,
        source: impl EventSource + 'static,
    ) -> io::Result<Self> {
        let join = thread::Builder::new()
            .name("keystack-hotplug".to_string())
            .spawn(move || pump_loop(&device, &filter, source))?;
        Ok(Self { join: Some(join) })
    }

    /// Wait for the source to close and return what was processed.
    pub fn join(mut self) -> PumpStats {
        let Some(join) = self.join.take() else {
            return PumpStats::default();
        };
        join.join().unwrap_or_else(|_| {
            warn!("Hotplug pump thread panicked");
            PumpStats::default()
        })
    }
}

fn pump_loop(device: &Device, filter: &TokenFilter, mut source: impl EventSource) -> PumpStats {
    let mut stats = PumpStats::default();
    while let Some(event) = source.next_event() {
        match dispatch(device, filter, event) {
            Ok(true) => stats.dispatched += 1,
            Ok(false) => stats.ignored += 1,
            Err(err) => {
                stats.failed += 1;
                warn!(token = %event.token, "Hotplug event failed: {err}");
            }
        }
    }
    debug!(?stats, "Hotplug source closed");
    stats
}
