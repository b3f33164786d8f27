//! Outbound fabric events.
//!
//! The [`Host`](super::service::Host) and [`Interface`](crate::interface::Interface)
//! emit these through the [`EventSink`](super::ports::EventSink) port.
//! Adapters on the other side decide what to do with them: log them,
//! poke an attribute-change notification, forward them to a supervisor.

use crate::power::PowerState;

use super::ports::EntityRef;

/// Structured events emitted by the fabric core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FabricEvent {
    /// An interface finished enumeration and was registered.
    InterfaceAdded {
        interface_id: u8,
        vendor_id: u32,
        product_id: u32,
    },

    /// An interface was torn down and unregistered.
    InterfaceRemoved { interface_id: u8 },

    /// A bundle was registered.
    BundleAdded {
        interface_id: u8,
        bundle_id: u8,
        class: u8,
    },

    /// A bundle's status string was written.
    BundleStatusChanged {
        interface_id: u8,
        bundle_id: u8,
        status: String,
    },

    /// A power command changed an entity's state.
    PowerChanged {
        entity: EntityRef,
        from: PowerState,
        to: PowerState,
    },
}
