//! Inbound requests to the host.
//!
//! These represent actions requested by the outside world (the fabric
//! controller's hotplug events, userspace power requests, drivers writing
//! status) that the [`Host`](super::service::Host) interprets and acts upon.

use crate::interface::{DEVICE_ID_UNASSIGNED, Identity};
use crate::power::PowerState;

/// Commands addressed to an existing interface or bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// Move an interface to `target`.
    InterfacePower { interface_id: u8, target: PowerState },

    /// Move a bundle to `target`.
    BundlePower {
        interface_id: u8,
        bundle_id: u8,
        target: PowerState,
    },

    /// System-suspend a bundle: notify its connections, then power it off.
    BundleRuntimeSuspend { interface_id: u8, bundle_id: u8 },

    /// Write a bundle's status text.
    SetBundleStatus {
        interface_id: u8,
        bundle_id: u8,
        status: String,
    },
}

/// A module appeared in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hotplug {
    pub interface_id: u8,
    pub identity: Identity,
    /// Fabric-assigned device id, or [`DEVICE_ID_UNASSIGNED`].
    pub device_id: u8,
    /// Module booted over the fabric and lacks interface-version support.
    pub boot_over_fabric: bool,
}

impl Hotplug {
    pub fn new(interface_id: u8, identity: Identity) -> Self {
        Self {
            interface_id,
            identity,
            device_id: DEVICE_ID_UNASSIGNED,
            boot_over_fabric: false,
        }
    }
}
