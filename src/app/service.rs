//! Host service: the slot table and its hotplug driver.
//!
//! [`Host`] owns the fabric configuration and every [`Interface`] on one
//! bus.  It exposes a hardware-agnostic API; all I/O flows through port
//! traits injected at call sites, so the whole service is testable with
//! mock adapters.
//!
//! ```text
//!  Hotplug / HostCommand ──▶ ┌───────────────────────┐ ──▶ EventSink
//!                            │         Host           │
//!  RpcChannel + Fabric   ◀── │  interfaces (by slot)  │ ──▶ Registry
//!                            └───────────────────────┘
//! ```

use log::{error, info, warn};

use crate::config::{ConfigError, FabricConfig};
use crate::diagnostics::InterfaceSnapshot;
use crate::error::{Error, Result};
use crate::interface::{Identity, Interface};
use crate::power::{Outcome, PowerState};
use crate::rpc::transport::RpcChannel;

use super::commands::{HostCommand, Hotplug};
use super::events::FabricEvent;
use super::ports::{EventSink, FabricController, ManifestDecoder, Registry};

// ───────────────────────────────────────────────────────────────
// Host
// ───────────────────────────────────────────────────────────────

pub struct Host {
    config: FabricConfig,
    /// Creation order.
    interfaces: Vec<Interface>,
}

impl Host {
    /// Validate `config` and build an empty slot table.
    pub fn new(config: FabricConfig) -> core::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            interfaces: Vec::new(),
        })
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &FabricConfig {
        &self.config
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    pub fn interface(&self, interface_id: u8) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.id() == interface_id)
    }

    pub fn interface_mut(&mut self, interface_id: u8) -> Result<&mut Interface> {
        self.interfaces
            .iter_mut()
            .find(|i| i.id() == interface_id)
            .ok_or(Error::NoSuchInterface(interface_id))
    }

    pub fn snapshot(&self, interface_id: u8) -> Option<InterfaceSnapshot> {
        self.interface(interface_id).map(InterfaceSnapshot::from)
    }

    // ── Slot lifecycle ────────────────────────────────────────

    /// Create an interface for a newly occupied slot.  The id must be free.
    pub fn create_interface(
        &mut self,
        interface_id: u8,
        identity: Identity,
    ) -> Result<&mut Interface> {
        if self.interface(interface_id).is_some() {
            return Err(Error::DuplicateInterface(interface_id));
        }

        let interface = Interface::create(&self.config, interface_id, identity)?;
        self.interfaces.push(interface);
        let last = self.interfaces.len() - 1;
        Ok(&mut self.interfaces[last])
    }

    /// Create, enumerate and register the interface described by `event`.
    /// On failure the slot is emptied again.
    pub fn hotplug(
        &mut self,
        event: &Hotplug,
        rpc: &mut impl RpcChannel,
        decoder: &mut impl ManifestDecoder,
        registry: &mut impl Registry,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let interface = self.create_interface(event.interface_id, event.identity)?;
        interface.set_device_id(event.device_id);
        interface.set_boot_over_fabric(event.boot_over_fabric);

        let mut result = interface.enable(rpc, decoder);
        if result.is_ok() {
            result = interface.add(rpc, registry);
            if result.is_err() {
                interface.disable(rpc, registry);
            }
        }

        if let Err(e) = result {
            error!("hotplug of interface {} failed: {}", event.interface_id, e);
            self.interfaces.retain(|i| i.id() != event.interface_id);
            return Err(e);
        }

        let interface_id = interface.id();
        sink.emit(&FabricEvent::InterfaceAdded {
            interface_id,
            vendor_id: event.identity.vendor_id,
            product_id: event.identity.product_id,
        });
        for bundle in interface.bundles().iter().filter(|b| b.is_registered()) {
            sink.emit(&FabricEvent::BundleAdded {
                interface_id,
                bundle_id: bundle.id(),
                class: bundle.class(),
            });
        }

        info!("interface {} added", interface.entity_ref());
        Ok(())
    }

    /// The module left its slot: tear down without talking to it.
    pub fn hot_unplug(
        &mut self,
        interface_id: u8,
        rpc: &mut impl RpcChannel,
        registry: &mut impl Registry,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let index = self
            .interfaces
            .iter()
            .position(|i| i.id() == interface_id)
            .ok_or(Error::NoSuchInterface(interface_id))?;

        let mut interface = self.interfaces.remove(index);
        interface.mark_disconnected();
        interface.disable(rpc, registry);
        interface.remove(registry);

        sink.emit(&FabricEvent::InterfaceRemoved { interface_id });
        info!("interface {} removed", interface.entity_ref());
        Ok(())
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply one command.  Every entity whose power state changed is
    /// reported through `sink`, including interfaces lowered or raised as
    /// a side effect of a bundle transition.
    pub fn handle_command(
        &mut self,
        cmd: HostCommand,
        bus: &mut (impl RpcChannel + FabricController),
        sink: &mut impl EventSink,
    ) -> Result<Outcome> {
        match cmd {
            HostCommand::InterfacePower {
                interface_id,
                target,
            } => {
                let interface = self.interface_mut(interface_id)?;
                let before = interface.power_state();
                let outcome = match target {
                    PowerState::On => interface.power_on(bus),
                    PowerState::Suspend => interface.power_suspend(bus),
                    PowerState::Off => interface.power_off(bus),
                }?;
                report_interface(interface, before, sink);
                Ok(outcome)
            }
            HostCommand::BundlePower {
                interface_id,
                bundle_id,
                target,
            } => {
                let interface = self.interface_mut(interface_id)?;
                let before = interface.power_state();
                let bundle_before = bundle_state(interface, bundle_id)?;
                let outcome = match target {
                    PowerState::On => interface.bundle_power_on(bus, bundle_id),
                    PowerState::Suspend => interface.bundle_power_suspend(bus, bundle_id),
                    PowerState::Off => interface.bundle_power_off(bus, bundle_id),
                }
                .inspect_err(|_| report_interface(interface, before, sink))?;
                report_bundle(interface, bundle_id, bundle_before, sink);
                report_interface(interface, before, sink);
                Ok(outcome)
            }
            HostCommand::BundleRuntimeSuspend {
                interface_id,
                bundle_id,
            } => {
                let interface = self.interface_mut(interface_id)?;
                let before = interface.power_state();
                let bundle_before = bundle_state(interface, bundle_id)?;
                let result = interface.bundle_runtime_suspend(bus, bundle_id);
                report_bundle(interface, bundle_id, bundle_before, sink);
                report_interface(interface, before, sink);
                if let Err(e) = &result {
                    warn!("bundle {}.{}: runtime suspend failed: {}", interface_id, bundle_id, e);
                }
                result
            }
            HostCommand::SetBundleStatus {
                interface_id,
                bundle_id,
                status,
            } => {
                self.interface_mut(interface_id)?
                    .set_bundle_status(bundle_id, &status, sink)?;
                Ok(Outcome::Performed)
            }
        }
    }
}

fn bundle_state(interface: &Interface, bundle_id: u8) -> Result<PowerState> {
    interface
        .bundle(bundle_id)
        .map(|b| b.power_state())
        .ok_or(Error::NoSuchBundle(bundle_id))
}

fn report_interface(interface: &Interface, before: PowerState, sink: &mut impl EventSink) {
    let after = interface.power_state();
    if after != before {
        sink.emit(&FabricEvent::PowerChanged {
            entity: interface.entity_ref(),
            from: before,
            to: after,
        });
    }
}

fn report_bundle(interface: &Interface, bundle_id: u8, before: PowerState, sink: &mut impl EventSink) {
    let Some(after) = interface.bundle(bundle_id).map(|b| b.power_state()) else {
        return;
    };
    if after != before {
        sink.emit(&FabricEvent::PowerChanged {
            entity: interface.bundle_ref(bundle_id),
            from: before,
            to: after,
        });
    }
}
