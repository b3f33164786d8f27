//! Mock fabric adapters for integration tests.
//!
//! [`MockFabric`] plays every module on the bus: it answers control
//! requests from per-interface scripts and records every request and every
//! fabric-controller call so tests can assert on the full history.

use std::collections::HashMap;

use greybus::app::events::FabricEvent;
use greybus::app::ports::{EntityRef, EventSink, FabricController, ManifestDecoder, Registry};
use greybus::adapters::registry::MemoryRegistry;
use greybus::interface::Interface;
use greybus::manifest::ManifestBuilder;
use greybus::rpc::codec::ControlOp;
use greybus::rpc::transport::{ChannelId, RpcChannel};
use greybus::{Error, RegistryError, RpcError};

// ── Request record ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub interface_id: u8,
    pub cport_id: u16,
    pub op: ControlOp,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FabricCall {
    Refclk { interface_id: u8, enable: bool },
    Power { interface_id: u8, enable: bool },
}

// ── Module script ─────────────────────────────────────────────

/// How one module answers control requests.
#[derive(Debug, Clone)]
pub struct ModuleScript {
    pub protocol_version: [u8; 2],
    pub manifest: Vec<u8>,
    /// Overrides the size reported by get-manifest-size.
    pub manifest_size: Option<u16>,
    /// `None` makes interface-version fail.
    pub interface_version: Option<(u16, u16)>,
    pub bundle_version: (u8, u8),
    /// Operations that fail with a remote error.
    pub failing: Vec<ControlOp>,
}

impl Default for ModuleScript {
    fn default() -> Self {
        Self {
            protocol_version: [0, 2],
            manifest: two_bundle_manifest(),
            manifest_size: None,
            interface_version: Some((1, 0)),
            bundle_version: (1, 0),
            failing: Vec::new(),
        }
    }
}

// ── MockFabric ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockFabric {
    pub modules: HashMap<u8, ModuleScript>,
    pub requests: Vec<Request>,
    pub fabric_calls: Vec<FabricCall>,
    pub open: Vec<ChannelId>,
    pub fail_fabric_calls: bool,
    next_port: u16,
}

#[allow(dead_code)]
impl MockFabric {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(interface_id: u8, script: ModuleScript) -> Self {
        let mut fabric = Self::new();
        fabric.modules.insert(interface_id, script);
        fabric
    }

    pub fn script(&mut self, interface_id: u8) -> &mut ModuleScript {
        self.modules.entry(interface_id).or_default()
    }

    pub fn ops(&self) -> Vec<ControlOp> {
        self.requests.iter().map(|r| r.op).collect()
    }

    pub fn count(&self, op: ControlOp) -> usize {
        self.requests.iter().filter(|r| r.op == op).count()
    }

    pub fn clear(&mut self) {
        self.requests.clear();
        self.fabric_calls.clear();
    }

    pub fn is_open(&self, interface_id: u8, cport_id: u16) -> bool {
        self.open.contains(&ChannelId {
            interface_id,
            cport_id,
        })
    }
}

impl RpcChannel for MockFabric {
    fn open(&mut self, channel: ChannelId) -> Result<u16, RpcError> {
        self.next_port += 1;
        self.open.push(channel);
        Ok(self.next_port)
    }

    fn close(&mut self, channel: ChannelId) {
        self.open.retain(|c| *c != channel);
    }

    fn sync_request(
        &mut self,
        channel: ChannelId,
        operation: u8,
        request: &[u8],
        response: &mut [u8],
    ) -> Result<usize, RpcError> {
        let op = ControlOp::from_id(operation).ok_or(RpcError::Remote(0x02))?;
        self.requests.push(Request {
            interface_id: channel.interface_id,
            cport_id: channel.cport_id,
            op,
            payload: request.to_vec(),
        });

        let script = self.modules.entry(channel.interface_id).or_default();
        if script.failing.contains(&op) {
            return Err(RpcError::Remote(0x05));
        }

        let answer: Vec<u8> = match op {
            ControlOp::ProtocolVersion => script.protocol_version.to_vec(),
            ControlOp::GetManifestSize => script
                .manifest_size
                .unwrap_or(script.manifest.len() as u16)
                .to_le_bytes()
                .to_vec(),
            ControlOp::GetManifest => script.manifest.clone(),
            ControlOp::InterfaceVersion => match script.interface_version {
                Some((major, minor)) => [major.to_le_bytes(), minor.to_le_bytes()].concat(),
                None => return Err(RpcError::Timeout),
            },
            ControlOp::BundleVersion => vec![script.bundle_version.0, script.bundle_version.1],
            _ => Vec::new(),
        };

        let n = answer.len().min(response.len());
        response[..n].copy_from_slice(&answer[..n]);
        Ok(n)
    }
}

impl FabricController for MockFabric {
    fn refclk_state_set(&mut self, interface_id: u8, enable: bool) -> Result<(), RpcError> {
        self.fabric_calls.push(FabricCall::Refclk {
            interface_id,
            enable,
        });
        if self.fail_fabric_calls {
            return Err(RpcError::Transport);
        }
        Ok(())
    }

    fn power_state_set(&mut self, interface_id: u8, enable: bool) -> Result<(), RpcError> {
        self.fabric_calls.push(FabricCall::Power {
            interface_id,
            enable,
        });
        if self.fail_fabric_calls {
            return Err(RpcError::Transport);
        }
        Ok(())
    }
}

// ── Manifests ─────────────────────────────────────────────────

/// Bundle 1 with one cport, bundle 2 with three.
pub fn two_bundle_manifest() -> Vec<u8> {
    ManifestBuilder::new()
        .interface(1, 2)
        .string(1, "Vendor")
        .string(2, "Product")
        .bundle(0, 0x00)
        .bundle(1, 0x0a)
        .cport(1, 1, 0x03)
        .bundle(2, 0x0b)
        .cport(2, 2, 0x04)
        .cport(3, 2, 0x04)
        .cport(4, 2, 0x04)
        .build()
}

// ── Scripted decoder ──────────────────────────────────────────

/// Attaches a fixed list of bundles, optionally failing after `fail_after`
/// bundles have been attached.
#[derive(Default)]
pub struct ScriptedDecoder {
    pub bundles: Vec<(u8, u8, Vec<u16>)>,
    pub fail_after: Option<usize>,
}

impl ManifestDecoder for ScriptedDecoder {
    fn decode(&mut self, _manifest: &[u8], interface: &mut Interface) -> Result<(), Error> {
        for (n, (id, class, cports)) in self.bundles.iter().enumerate() {
            if self.fail_after == Some(n) {
                return Err(Error::Manifest(greybus::ManifestError::Truncated));
            }
            interface.create_bundle(*id, *class)?;
            for cport in cports {
                interface.create_connection(*id, *cport, 0x03)?;
            }
        }
        if self.fail_after == Some(self.bundles.len()) {
            return Err(Error::Manifest(greybus::ManifestError::Truncated));
        }
        Ok(())
    }
}

// ── Registry ──────────────────────────────────────────────────

/// Records registration order and refuses a configured set of entities.
#[derive(Default)]
pub struct RecordingRegistry {
    pub inner: MemoryRegistry,
    pub order: Vec<EntityRef>,
    pub refuse: Vec<EntityRef>,
}

impl Registry for RecordingRegistry {
    fn register(&mut self, entity: EntityRef) -> Result<(), RegistryError> {
        self.order.push(entity);
        if self.refuse.contains(&entity) {
            return Err(RegistryError::Rejected);
        }
        self.inner.register(entity)
    }

    fn unregister(&mut self, entity: EntityRef) {
        self.inner.unregister(entity);
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<FabricEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &FabricEvent) {
        self.events.push(event.clone());
    }
}
