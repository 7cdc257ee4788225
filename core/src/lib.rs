//! Core device logic for keystack.
//!
//! A single integer stack shared by concurrent callers, usable only while an
//! authorizing token is attached:
//!
//! ```text
//! hotplug source -> HotplugPump -> TokenFilter -> Device::on_attach/on_detach
//!                                                    |            |
//!                                              PresenceGate   Registrar (publish/withdraw)
//!
//! caller -> Device::handle_{open,read,write,configure} -> PresenceGate::is_present
//!                                                      -> StackStore (one exclusive lock)
//! ```
//!
//! The presence flag and the stack lock are synchronized independently. An
//! operation may pass the presence check an instant before a detach lands
//! and still complete against the stack; that window is accepted.

mod device;
pub mod hotplug;
mod presence;
pub mod registrar;
mod store;

pub use device::Device;
pub use hotplug::{
    ChannelEventSource, EventSource, HotplugPump, HotplugSender, PumpStats, ScriptedEventSource,
    TokenFilter, dispatch, hotplug_channel,
};
pub use presence::{PresenceGate, PresenceState, Transition};
pub use registrar::{EndpointFileRegistrar, NullRegistrar, Registrar, RegistrarError};
pub use store::StackStore;
