//! Inspection surface: snapshots and sysfs-style attributes.
//!
//! [`InterfaceSnapshot`] captures a whole interface tree as plain data for
//! serialization.  The attribute functions render single values the way
//! the registry exposes them to userspace (one short line of text each).

use core::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::bundle::Bundle;
use crate::connection::Connection;
use crate::interface::{Identity, Interface};
use crate::power::PowerState;
use crate::rpc::codec::{InterfaceVersion, Version};

/// Attribute values never exceed this many bytes; longer status strings
/// are truncated.
pub const ATTR_MAX: usize = 64;

pub type AttrValue = heapless::String<ATTR_MAX>;

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSnapshot {
    pub cport_id: u16,
    pub local_port: Option<u16>,
    pub protocol_id: u8,
    pub power_state: PowerState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleSnapshot {
    pub id: u8,
    pub class: u8,
    pub status: Option<String>,
    pub power_state: PowerState,
    pub class_version: Option<Version>,
    pub registered: bool,
    pub connections: Vec<ConnectionSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceSnapshot {
    pub bus_id: u8,
    pub interface_id: u8,
    pub identity: Identity,
    pub vendor_string: Option<String>,
    pub product_string: Option<String>,
    pub device_id: u8,
    pub version: InterfaceVersion,
    pub control_version: Version,
    pub power_state: PowerState,
    pub disconnected: bool,
    pub registered: bool,
    pub bundles: Vec<BundleSnapshot>,
}

impl From<&Connection> for ConnectionSnapshot {
    fn from(c: &Connection) -> Self {
        Self {
            cport_id: c.cport_id(),
            local_port: c.local_port(),
            protocol_id: c.protocol_id(),
            power_state: c.power_state(),
        }
    }
}

impl From<&Bundle> for BundleSnapshot {
    fn from(b: &Bundle) -> Self {
        Self {
            id: b.id(),
            class: b.class(),
            status: b.status().map(str::to_owned),
            power_state: b.power_state(),
            class_version: b.class_version(),
            registered: b.is_registered(),
            connections: b.connections().iter().map(ConnectionSnapshot::from).collect(),
        }
    }
}

impl From<&Interface> for InterfaceSnapshot {
    fn from(i: &Interface) -> Self {
        Self {
            bus_id: i.bus_id(),
            interface_id: i.id(),
            identity: *i.identity(),
            vendor_string: i.vendor_string().map(str::to_owned),
            product_string: i.product_string().map(str::to_owned),
            device_id: i.device_id(),
            version: i.version(),
            control_version: i.control().protocol_version(),
            power_state: i.power_state(),
            disconnected: i.is_disconnected(),
            registered: i.is_registered(),
            bundles: i.bundles().iter().map(BundleSnapshot::from).collect(),
        }
    }
}

impl InterfaceSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceAttr {
    InterfaceId,
    VendorId,
    ProductId,
    SerialNumber,
    Ddbl1ManufacturerId,
    Ddbl1ProductId,
    VendorString,
    ProductString,
    DeviceId,
    Version,
    PowerState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleAttr {
    BundleId,
    BundleClass,
    State,
    PowerState,
}

impl InterfaceAttr {
    pub const fn name(self) -> &'static str {
        match self {
            Self::InterfaceId => "interface_id",
            Self::VendorId => "vendor_id",
            Self::ProductId => "product_id",
            Self::SerialNumber => "serial_number",
            Self::Ddbl1ManufacturerId => "ddbl1_manufacturer_id",
            Self::Ddbl1ProductId => "ddbl1_product_id",
            Self::VendorString => "vendor_string",
            Self::ProductString => "product_string",
            Self::DeviceId => "device_id",
            Self::Version => "interface_version",
            Self::PowerState => "power_state",
        }
    }
}

impl BundleAttr {
    pub const fn name(self) -> &'static str {
        match self {
            Self::BundleId => "bundle_id",
            Self::BundleClass => "bundle_class",
            Self::State => "state",
            Self::PowerState => "power_state",
        }
    }
}

pub fn interface_attribute(interface: &Interface, attr: InterfaceAttr) -> AttrValue {
    let id = interface.identity();
    let mut out = AttrValue::new();
    // Numeric formats always fit; only strings can overflow.
    let _ = match attr {
        InterfaceAttr::InterfaceId => write!(out, "{}", interface.id()),
        InterfaceAttr::VendorId => write!(out, "0x{:08x}", id.vendor_id),
        InterfaceAttr::ProductId => write!(out, "0x{:08x}", id.product_id),
        InterfaceAttr::SerialNumber => write!(out, "0x{:016x}", id.serial_number),
        InterfaceAttr::Ddbl1ManufacturerId => write!(out, "0x{:08x}", id.ddbl1_manufacturer_id),
        InterfaceAttr::Ddbl1ProductId => write!(out, "0x{:08x}", id.ddbl1_product_id),
        InterfaceAttr::DeviceId => write!(out, "{}", interface.device_id()),
        InterfaceAttr::Version => write!(out, "{}", interface.version()),
        InterfaceAttr::VendorString => {
            push_truncated(&mut out, interface.vendor_string().unwrap_or(""));
            Ok(())
        }
        InterfaceAttr::ProductString => {
            push_truncated(&mut out, interface.product_string().unwrap_or(""));
            Ok(())
        }
        InterfaceAttr::PowerState => {
            push_truncated(&mut out, interface.power_state().label());
            Ok(())
        }
    };
    out
}

pub fn bundle_attribute(bundle: &Bundle, attr: BundleAttr) -> AttrValue {
    let mut out = AttrValue::new();
    match attr {
        BundleAttr::BundleId => {
            let _ = write!(out, "{}", bundle.id());
        }
        BundleAttr::BundleClass => {
            let _ = write!(out, "0x{:02x}", bundle.class());
        }
        BundleAttr::State => push_truncated(&mut out, bundle.status().unwrap_or("")),
        BundleAttr::PowerState => push_truncated(&mut out, bundle.power_state().label()),
    }
    out
}

/// Copy as much of `text` as fits, cutting on a char boundary.
fn push_truncated(out: &mut AttrValue, text: &str) {
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
}
