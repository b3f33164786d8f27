//! Interfaces: one module slot on the fabric.
//!
//! An [`Interface`] owns its [`ControlEndpoint`] and, after enumeration,
//! an ordered list of [`Bundle`]s which in turn own their connections.
//! Children refer back to their parent by id only.
//!
//! ```text
//!   Interface ──┬── ControlEndpoint ── Connection (control cport)
//!               ├── Bundle 1 ── Connection, Connection, ...
//!               └── Bundle 2 ── Connection, ...
//! ```
//!
//! Lifecycle and power paths live in submodules:
//!
//! * [`enumerate`]: `enable`, `disable`, `add`, `remove`, connection wiring
//! * [`pm`]: interface and bundle power transitions

pub mod enumerate;
pub mod pm;

use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::app::events::FabricEvent;
use crate::app::ports::{EntityRef, EventSink};
use crate::bundle::Bundle;
use crate::config::FabricConfig;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::power::PowerState;
use crate::rpc::codec::InterfaceVersion;
use crate::rpc::control::ControlEndpoint;

/// Fabric device id of an interface that has not been assigned one yet.
pub const DEVICE_ID_UNASSIGNED: u8 = 0xff;

/// Identity reported by the fabric controller when the slot is activated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub vendor_id: u32,
    pub product_id: u32,
    pub serial_number: u64,
    pub ddbl1_manufacturer_id: u32,
    pub ddbl1_product_id: u32,
}

pub struct Interface {
    bus_id: u8,
    id: u8,
    identity: Identity,
    vendor_string: Option<String>,
    product_string: Option<String>,
    version: InterfaceVersion,
    device_id: u8,
    power_state: PowerState,
    disconnected: bool,
    /// Module booted over the fabric and cannot answer interface-version.
    boot_over_fabric: bool,
    registered: bool,
    control: ControlEndpoint,
    /// Discovery order.
    bundles: Vec<Bundle>,
    max_manifest_size: u16,
}

impl Interface {
    /// Create an interface and its control endpoint.  Nothing is sent on
    /// the fabric until [`enable`](Self::enable).
    pub fn create(config: &FabricConfig, interface_id: u8, identity: Identity) -> Result<Self> {
        let control = ControlEndpoint::create(
            interface_id,
            config.control_cport_id,
            config.control_version(),
        )?;

        debug!(
            "interface {}-{}: created (vid 0x{:08x} pid 0x{:08x})",
            config.bus_id, interface_id, identity.vendor_id, identity.product_id
        );

        Ok(Self {
            bus_id: config.bus_id,
            id: interface_id,
            identity,
            vendor_string: None,
            product_string: None,
            version: InterfaceVersion::default(),
            device_id: DEVICE_ID_UNASSIGNED,
            power_state: PowerState::On,
            disconnected: false,
            boot_over_fabric: false,
            registered: false,
            control,
            bundles: Vec::new(),
            max_manifest_size: config.max_manifest_size,
        })
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn bus_id(&self) -> u8 {
        self.bus_id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn vendor_string(&self) -> Option<&str> {
        self.vendor_string.as_deref()
    }

    pub fn product_string(&self) -> Option<&str> {
        self.product_string.as_deref()
    }

    pub fn version(&self) -> InterfaceVersion {
        self.version
    }

    pub fn device_id(&self) -> u8 {
        self.device_id
    }

    pub fn power_state(&self) -> PowerState {
        self.power_state
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    pub fn boot_over_fabric(&self) -> bool {
        self.boot_over_fabric
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn control(&self) -> &ControlEndpoint {
        &self.control
    }

    pub fn bundles(&self) -> &[Bundle] {
        &self.bundles
    }

    pub fn bundle(&self, bundle_id: u8) -> Option<&Bundle> {
        self.bundles.iter().find(|b| b.id() == bundle_id)
    }

    pub fn bundle_mut(&mut self, bundle_id: u8) -> Result<&mut Bundle> {
        self.bundles
            .iter_mut()
            .find(|b| b.id() == bundle_id)
            .ok_or(Error::NoSuchBundle(bundle_id))
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::Interface {
            bus_id: self.bus_id,
            interface_id: self.id,
        }
    }

    pub fn bundle_ref(&self, bundle_id: u8) -> EntityRef {
        EntityRef::Bundle {
            bus_id: self.bus_id,
            interface_id: self.id,
            bundle_id,
        }
    }

    // ── Settings written by the fabric side ───────────────────

    pub fn set_device_id(&mut self, device_id: u8) {
        self.device_id = device_id;
    }

    /// The module is gone; later teardown must not talk to it.
    pub fn mark_disconnected(&mut self) {
        self.disconnected = true;
    }

    pub fn set_boot_over_fabric(&mut self, quirk: bool) {
        self.boot_over_fabric = quirk;
    }

    /// Write a bundle's status text and notify listeners.
    pub fn set_bundle_status(
        &mut self,
        bundle_id: u8,
        status: &str,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let interface_id = self.id;
        self.bundle_mut(bundle_id)?.set_status(status);
        sink.emit(&FabricEvent::BundleStatusChanged {
            interface_id,
            bundle_id,
            status: status.to_owned(),
        });
        Ok(())
    }

    // ── Manifest construction ─────────────────────────────────
    //
    // Called by a `ManifestDecoder` while the manifest is parsed.

    /// Attach a new bundle.  A duplicate id is a hard failure and leaves
    /// the bundle list untouched.
    pub fn create_bundle(&mut self, bundle_id: u8, class: u8) -> Result<&mut Bundle> {
        if self.bundle(bundle_id).is_some() {
            error!(
                "interface {}: duplicate bundle id {}",
                self.id, bundle_id
            );
            return Err(Error::DuplicateBundle(bundle_id));
        }

        self.bundles.push(Bundle::new(self.id, bundle_id, class));
        let last = self.bundles.len() - 1;
        Ok(&mut self.bundles[last])
    }

    /// Attach a connection to an existing bundle.  The cport must be in
    /// range and unused anywhere on the interface, control port included.
    pub fn create_connection(
        &mut self,
        bundle_id: u8,
        cport_id: u16,
        protocol_id: u8,
    ) -> Result<&mut Connection> {
        if self.cport_in_use(cport_id) {
            error!(
                "interface {}: cport {} already in use",
                self.id, cport_id
            );
            return Err(Error::DuplicateCport(cport_id));
        }

        let connection = Connection::new(self.id, Some(bundle_id), cport_id, protocol_id)?;
        Ok(self.bundle_mut(bundle_id)?.push_connection(connection))
    }

    /// Manifest strings naming the vendor and product.
    pub fn set_descriptor_strings(&mut self, vendor: Option<String>, product: Option<String>) {
        self.vendor_string = vendor;
        self.product_string = product;
    }

    fn cport_in_use(&self, cport_id: u16) -> bool {
        self.control.connection().cport_id() == cport_id
            || self
                .bundles
                .iter()
                .any(|b| b.connection(cport_id).is_some())
    }

    /// Power states of every bundle, in discovery order.
    pub(crate) fn bundle_states(&self) -> impl Iterator<Item = PowerState> + '_ {
        self.bundles.iter().map(Bundle::power_state)
    }
}
