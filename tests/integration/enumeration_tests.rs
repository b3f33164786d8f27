//! Enumeration, registration and teardown against the mock fabric.

use greybus::app::ports::{EntityRef, ManifestDecoder};
use greybus::{Error, ManifestError};
use greybus::config::FabricConfig;
use greybus::interface::{DEVICE_ID_UNASSIGNED, Identity, Interface};
use greybus::manifest::{GreybusManifest, ManifestBuilder};
use greybus::rpc::codec::{ControlOp, InterfaceVersion, Version};

use super::mock_fabric::{MockFabric, ModuleScript, RecordingRegistry, ScriptedDecoder};

const INTF: u8 = 3;

fn interface() -> Interface {
    Interface::create(&FabricConfig::default(), INTF, Identity::default()).unwrap()
}

fn bundle_ids(intf: &Interface) -> Vec<u8> {
    intf.bundles().iter().map(|b| b.id()).collect()
}

// ── Successful enumeration ────────────────────────────────────

#[test]
fn manifest_with_two_bundles_enumerates_exactly_those() {
    let mut fabric = MockFabric::with_module(INTF, ModuleScript::default());
    let mut intf = interface();
    intf.set_device_id(7);

    intf.enable(&mut fabric, &mut GreybusManifest).unwrap();

    assert_eq!(bundle_ids(&intf), [1, 2]);
    let cports: Vec<Vec<u16>> = intf
        .bundles()
        .iter()
        .map(|b| b.connections().iter().map(|c| c.cport_id()).collect())
        .collect();
    assert_eq!(cports, [vec![1], vec![2, 3, 4]]);
    assert_eq!(intf.device_id(), 7);
    assert_eq!(intf.vendor_string(), Some("Vendor"));
    assert!(intf.control().is_enabled());
}

#[test]
fn enumeration_follows_the_control_sequence() {
    let mut fabric = MockFabric::with_module(INTF, ModuleScript::default());
    let mut intf = interface();

    intf.enable(&mut fabric, &mut GreybusManifest).unwrap();

    assert_eq!(
        fabric.ops(),
        [
            ControlOp::ProtocolVersion,
            ControlOp::GetManifestSize,
            ControlOp::GetManifest,
            ControlOp::InterfaceVersion,
            ControlOp::BundleVersion,
            ControlOp::BundleVersion,
        ]
    );
    assert!(fabric.requests.iter().all(|r| r.cport_id == 0));
    assert_eq!(intf.control().protocol_version(), Version::new(0, 2));
    assert_eq!(intf.version(), InterfaceVersion { major: 1, minor: 0 });
    assert_eq!(intf.device_id(), DEVICE_ID_UNASSIGNED);
}

#[test]
fn bundle_versions_are_stored_in_discovery_order() {
    let mut script = ModuleScript::default();
    script.bundle_version = (3, 4);
    let mut fabric = MockFabric::with_module(INTF, script);
    let mut intf = interface();

    intf.enable(&mut fabric, &mut GreybusManifest).unwrap();

    let queried: Vec<u8> = fabric
        .requests
        .iter()
        .filter(|r| r.op == ControlOp::BundleVersion)
        .map(|r| r.payload[0])
        .collect();
    assert_eq!(queried, [1, 2]);
    assert!(
        intf.bundles()
            .iter()
            .all(|b| b.class_version() == Some(Version::new(3, 4)))
    );
}

#[test]
fn bundle_version_failure_unwinds() {
    let mut script = ModuleScript::default();
    script.failing.push(ControlOp::BundleVersion);
    let mut fabric = MockFabric::with_module(INTF, script);
    let mut intf = interface();

    assert!(intf.enable(&mut fabric, &mut GreybusManifest).is_err());
    assert!(intf.bundles().is_empty());
    assert!(!fabric.is_open(INTF, 0));
}

// ── Version quirks ────────────────────────────────────────────

#[test]
fn boot_over_fabric_skips_interface_version() {
    let mut fabric = MockFabric::with_module(INTF, ModuleScript::default());
    let mut intf = interface();
    intf.set_boot_over_fabric(true);

    intf.enable(&mut fabric, &mut GreybusManifest).unwrap();

    assert_eq!(fabric.count(ControlOp::InterfaceVersion), 0);
    assert_eq!(intf.version(), InterfaceVersion::default());
}

#[test]
fn interface_version_failure_is_tolerated() {
    let mut script = ModuleScript::default();
    script.interface_version = None;
    let mut fabric = MockFabric::with_module(INTF, script);
    let mut intf = interface();

    assert_eq!(intf.enable(&mut fabric, &mut GreybusManifest), Ok(()));
    assert_eq!(intf.version(), InterfaceVersion { major: 0, minor: 0 });
    assert_eq!(bundle_ids(&intf), [1, 2]);
}

// ── Failure compensation ──────────────────────────────────────

#[test]
fn decoder_failure_after_one_bundle_leaves_none() {
    let mut fabric = MockFabric::with_module(INTF, ModuleScript::default());
    let mut decoder = ScriptedDecoder {
        bundles: vec![(1, 0x0a, vec![1]), (2, 0x0b, vec![2])],
        fail_after: Some(1),
    };
    let mut intf = interface();

    assert!(intf.enable(&mut fabric, &mut decoder).is_err());
    assert!(intf.bundles().is_empty());
    assert!(!intf.control().is_enabled());
    assert!(fabric.open.is_empty());
}

#[test]
fn only_the_current_attempt_is_unwound() {
    let mut fabric = MockFabric::with_module(INTF, ModuleScript::default());
    let mut intf = interface();
    intf.create_bundle(9, 0x0a).unwrap();

    let mut decoder = ScriptedDecoder {
        bundles: vec![(1, 0x0a, vec![1])],
        fail_after: Some(1),
    };
    assert!(intf.enable(&mut fabric, &mut decoder).is_err());
    assert_eq!(bundle_ids(&intf), [9]);
}

#[test]
fn failed_reenable_keeps_earlier_control_channel() {
    let mut fabric = MockFabric::with_module(INTF, ModuleScript::default());
    let mut intf = interface();
    intf.enable(&mut fabric, &mut GreybusManifest).unwrap();

    let mut decoder = ScriptedDecoder {
        bundles: vec![(3, 0x0a, vec![7])],
        fail_after: Some(1),
    };
    assert!(intf.enable(&mut fabric, &mut decoder).is_err());

    assert_eq!(bundle_ids(&intf), [1, 2]);
    assert!(intf.control().is_enabled());
    assert!(fabric.is_open(INTF, 0));
    assert_eq!(intf.vendor_string(), Some("Vendor"));
}

#[test]
fn failed_attempt_drops_descriptor_strings() {
    let mut script = ModuleScript::default();
    script.manifest = ManifestBuilder::new()
        .interface(1, 2)
        .string(1, "Vendor")
        .string(2, "Product")
        .bundle(1, 0x0a)
        .bundle(1, 0x0b)
        .build();
    let mut fabric = MockFabric::with_module(INTF, script);
    let mut intf = interface();

    assert_eq!(
        intf.enable(&mut fabric, &mut GreybusManifest),
        Err(Error::DuplicateBundle(1))
    );
    assert_eq!(intf.vendor_string(), None);
    assert_eq!(intf.product_string(), None);
}

/// Adds a cport to a bundle that already exists, then fails.
struct ExtendThenFail {
    bundle_id: u8,
    cport_id: u16,
}

impl ManifestDecoder for ExtendThenFail {
    fn decode(&mut self, _manifest: &[u8], interface: &mut Interface) -> greybus::Result<()> {
        interface.create_connection(self.bundle_id, self.cport_id, 0x03)?;
        Err(Error::Manifest(ManifestError::Truncated))
    }
}

#[test]
fn failed_attempt_drops_connections_on_existing_bundles() {
    let mut fabric = MockFabric::with_module(INTF, ModuleScript::default());
    let mut intf = interface();
    intf.create_bundle(9, 0x0a).unwrap();
    intf.create_connection(9, 4, 0x03).unwrap();

    let mut decoder = ExtendThenFail {
        bundle_id: 9,
        cport_id: 5,
    };
    assert!(intf.enable(&mut fabric, &mut decoder).is_err());

    let cports: Vec<u16> = intf
        .bundle(9)
        .unwrap()
        .connections()
        .iter()
        .map(|c| c.cport_id())
        .collect();
    assert_eq!(cports, [4]);
    assert!(!intf.control().is_enabled());
}

#[test]
fn duplicate_bundle_in_manifest_fails_enumeration() {
    let mut script = ModuleScript::default();
    script.manifest = ManifestBuilder::new()
        .interface(0, 0)
        .bundle(1, 0x0a)
        .bundle(1, 0x0b)
        .build();
    let mut fabric = MockFabric::with_module(INTF, script);
    let mut intf = interface();

    assert_eq!(
        intf.enable(&mut fabric, &mut GreybusManifest),
        Err(Error::DuplicateBundle(1))
    );
    assert!(intf.bundles().is_empty());
}

#[test]
fn zero_size_manifest_aborts() {
    let mut script = ModuleScript::default();
    script.manifest_size = Some(0);
    let mut fabric = MockFabric::with_module(INTF, script);
    let mut intf = interface();

    assert_eq!(
        intf.enable(&mut fabric, &mut GreybusManifest),
        Err(Error::EmptyManifest)
    );
    assert!(!fabric.is_open(INTF, 0));
    assert_eq!(fabric.count(ControlOp::GetManifest), 0);
}

#[test]
fn manifest_above_limit_aborts() {
    let config = FabricConfig {
        max_manifest_size: 16,
        ..FabricConfig::default()
    };
    let mut fabric = MockFabric::with_module(INTF, ModuleScript::default());
    let mut intf = Interface::create(&config, INTF, Identity::default()).unwrap();

    assert!(matches!(
        intf.enable(&mut fabric, &mut GreybusManifest),
        Err(Error::ManifestTooLarge(_))
    ));
    assert!(!intf.control().is_enabled());
}

#[test]
fn short_manifest_read_aborts() {
    let mut script = ModuleScript::default();
    script.manifest_size = Some(script.manifest.len() as u16 + 8);
    let mut fabric = MockFabric::with_module(INTF, script);
    let mut intf = interface();

    assert!(matches!(
        intf.enable(&mut fabric, &mut GreybusManifest),
        Err(Error::Rpc(_))
    ));
    assert!(intf.bundles().is_empty());
    assert!(!fabric.is_open(INTF, 0));
}

#[test]
fn newer_control_protocol_is_refused() {
    let mut script = ModuleScript::default();
    script.protocol_version = [1, 0];
    let mut fabric = MockFabric::with_module(INTF, script);
    let mut intf = interface();

    assert_eq!(
        intf.enable(&mut fabric, &mut GreybusManifest),
        Err(Error::UnsupportedProtocol { major: 1, minor: 0 })
    );
    assert_eq!(fabric.ops(), [ControlOp::ProtocolVersion]);
}

// ── Registration and teardown ─────────────────────────────────

#[test]
fn bundles_register_in_reverse_discovery_order() {
    let mut fabric = MockFabric::with_module(INTF, ModuleScript::default());
    let mut registry = RecordingRegistry::default();
    let mut intf = interface();
    intf.enable(&mut fabric, &mut GreybusManifest).unwrap();

    intf.add(&mut fabric, &mut registry).unwrap();

    assert_eq!(
        registry.order,
        [intf.entity_ref(), intf.bundle_ref(2), intf.bundle_ref(1)]
    );
    assert!(intf.is_registered());
    assert!(intf.bundles().iter().all(|b| b.is_registered()));
}

#[test]
fn refused_bundle_is_dropped_others_survive() {
    let mut fabric = MockFabric::with_module(INTF, ModuleScript::default());
    let mut intf = interface();
    intf.enable(&mut fabric, &mut GreybusManifest).unwrap();
    let mut registry = RecordingRegistry {
        refuse: vec![intf.bundle_ref(2)],
        ..RecordingRegistry::default()
    };

    assert_eq!(intf.add(&mut fabric, &mut registry), Ok(()));
    assert_eq!(bundle_ids(&intf), [1]);
    assert!(registry.inner.contains(intf.bundle_ref(1)));
}

#[test]
fn disable_notifies_module_while_connected() {
    let mut fabric = MockFabric::with_module(INTF, ModuleScript::default());
    let mut registry = RecordingRegistry::default();
    let mut intf = interface();
    intf.enable(&mut fabric, &mut GreybusManifest).unwrap();
    intf.add(&mut fabric, &mut registry).unwrap();
    intf.enable_connection(&mut fabric, 2, 3).unwrap();
    assert!(fabric.is_open(INTF, 3));
    fabric.clear();

    intf.disable(&mut fabric, &mut registry);
    intf.remove(&mut registry);

    assert_eq!(fabric.ops(), [ControlOp::Disconnected]);
    assert_eq!(fabric.requests[0].payload, [3, 0]);
    assert!(fabric.open.is_empty());
    assert!(registry.inner.entries().is_empty());
    assert!(intf.bundles().is_empty());
}

#[test]
fn connected_failure_closes_channel() {
    let mut fabric = MockFabric::with_module(INTF, ModuleScript::default());
    let mut intf = interface();
    intf.enable(&mut fabric, &mut GreybusManifest).unwrap();
    fabric.script(INTF).failing.push(ControlOp::Connected);

    assert!(intf.enable_connection(&mut fabric, 1, 1).is_err());
    assert!(!fabric.is_open(INTF, 1));
    let conn = intf.bundle(1).and_then(|b| b.connection(1)).unwrap();
    assert!(!conn.is_enabled());
}

#[test]
fn unknown_connection_is_reported() {
    let mut fabric = MockFabric::with_module(INTF, ModuleScript::default());
    let mut intf = interface();
    intf.enable(&mut fabric, &mut GreybusManifest).unwrap();

    assert_eq!(
        intf.enable_connection(&mut fabric, 1, 42),
        Err(Error::NoSuchConnection(42))
    );
    assert_eq!(
        intf.enable_connection(&mut fabric, 5, 1),
        Err(Error::NoSuchBundle(5))
    );
}

#[test]
fn entity_refs_name_the_bus_layout() {
    let intf = interface();
    assert_eq!(
        intf.bundle_ref(2),
        EntityRef::Bundle {
            bus_id: 1,
            interface_id: INTF,
            bundle_id: 2
        }
    );
}
