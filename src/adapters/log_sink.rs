//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured fabric events to the
//! `log` facade.  A notification adapter (attribute-change poll, message
//! bus) would implement the same trait.

use log::info;

use crate::app::events::FabricEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`FabricEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &FabricEvent) {
        match event {
            FabricEvent::InterfaceAdded {
                interface_id,
                vendor_id,
                product_id,
            } => {
                info!(
                    "ADD   | interface={} vid=0x{:08x} pid=0x{:08x}",
                    interface_id, vendor_id, product_id
                );
            }
            FabricEvent::InterfaceRemoved { interface_id } => {
                info!("REMOVE | interface={}", interface_id);
            }
            FabricEvent::BundleAdded {
                interface_id,
                bundle_id,
                class,
            } => {
                info!(
                    "ADD   | bundle={}.{} class=0x{:02x}",
                    interface_id, bundle_id, class
                );
            }
            FabricEvent::BundleStatusChanged {
                interface_id,
                bundle_id,
                status,
            } => {
                info!("STATUS | bundle={}.{} \"{}\"", interface_id, bundle_id, status);
            }
            FabricEvent::PowerChanged { entity, from, to } => {
                info!("POWER | {} {} -> {}", entity, from, to);
            }
        }
    }
}
