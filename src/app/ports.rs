//! Port traits: the boundary between the fabric core and its collaborators.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Interface / Host (domain)
//! ```
//!
//! The fabric controller, the registry that makes entities externally
//! visible, the manifest decoder, and event consumers all live outside
//! this crate.  Domain code receives them as generic parameters at each
//! call site, so nothing here holds a long-lived reference to hardware and
//! every path is testable with mock adapters.
//!
//! The RPC transport port lives next to the codec in
//! [`rpc::transport`](crate::rpc::transport).

use core::fmt;

use crate::error::{RegistryError, Result, RpcError};
use crate::interface::Interface;

use super::events::FabricEvent;

// ───────────────────────────────────────────────────────────────
// Fabric controller (driven adapter: domain → SVC)
// ───────────────────────────────────────────────────────────────

/// Physical power and clock control addressed by interface id.
///
/// Both calls are issued best-effort from the interface power paths: a
/// failure is logged but never turns a completed transition into an error.
pub trait FabricController {
    /// Gate the reference clock of a slot.
    fn refclk_state_set(&mut self, interface_id: u8, enable: bool) -> Result<(), RpcError>;

    /// Switch slot power.
    fn power_state_set(&mut self, interface_id: u8, enable: bool) -> Result<(), RpcError>;
}

// ───────────────────────────────────────────────────────────────
// Registry (driven adapter: domain → inspection surface)
// ───────────────────────────────────────────────────────────────

/// Identifies an entity to the registry.  Names follow the bus layout:
/// `<bus>-<interface>` and `<bus>-<interface>.<bundle>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Interface {
        bus_id: u8,
        interface_id: u8,
    },
    Bundle {
        bus_id: u8,
        interface_id: u8,
        bundle_id: u8,
    },
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interface {
                bus_id,
                interface_id,
            } => write!(f, "{bus_id}-{interface_id}"),
            Self::Bundle {
                bus_id,
                interface_id,
                bundle_id,
            } => write!(f, "{bus_id}-{interface_id}.{bundle_id}"),
        }
    }
}

/// Makes entities externally addressable.  The core never relies on the
/// registry for lifetime management; it only registers and unregisters.
pub trait Registry {
    fn register(&mut self, entity: EntityRef) -> Result<(), RegistryError>;

    /// Unregistering an entity that is not registered is a no-op.
    fn unregister(&mut self, entity: EntityRef);
}

// ───────────────────────────────────────────────────────────────
// Manifest decoder (driven adapter: bytes → bundles/connections)
// ───────────────────────────────────────────────────────────────

/// Turns raw manifest bytes into bundles and connections attached to the
/// interface, via [`Interface::create_bundle`] and
/// [`Interface::create_connection`].
///
/// On failure the decoder may leave partially attached bundles behind;
/// enumeration destroys them before reporting the error.
pub trait ManifestDecoder {
    fn decode(&mut self, manifest: &[u8], interface: &mut Interface) -> Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / notifications)
// ───────────────────────────────────────────────────────────────

/// The domain emits [`FabricEvent`]s through this port, including the
/// change notification for bundle status writes.
pub trait EventSink {
    fn emit(&mut self, event: &FabricEvent);
}

/// Discards every event.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &FabricEvent) {}
}
