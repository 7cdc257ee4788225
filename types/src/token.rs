//! Identity of the authorizing token and the hotplug events that carry it.

use std::fmt;

/// Vendor/product identity of a hotplugged token.
///
/// Opaque to the gate beyond an identity match; retained for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl TokenId {
    #[must_use]
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}:{:04X}", self.vendor_id, self.product_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotplugKind {
    Attach,
    Detach,
}

/// One attach or detach notification from the hotplug subsystem.
///
/// A composite token reports one event per interface; `interface` tells
/// them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotplugEvent {
    pub kind: HotplugKind,
    pub token: TokenId,
    pub interface: u8,
}

impl HotplugEvent {
    #[must_use]
    pub const fn attach(token: TokenId, interface: u8) -> Self {
        Self {
            kind: HotplugKind::Attach,
            token,
            interface,
        }
    }

    #[must_use]
    pub const fn detach(token: TokenId, interface: u8) -> Self {
        Self {
            kind: HotplugKind::Detach,
            token,
            interface,
        }
    }
}
