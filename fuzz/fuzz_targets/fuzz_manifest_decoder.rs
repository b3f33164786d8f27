//! Fuzz target: `GreybusManifest::decode`
//!
//! Feeds arbitrary bytes to the manifest decoder against a fresh
//! interface and asserts that it never panics and that a rejected
//! manifest attaches nothing the enumeration path could not unwind.
//!
//! cargo fuzz run fuzz_manifest_decoder

#![no_main]

use greybus::app::ports::ManifestDecoder;
use greybus::config::FabricConfig;
use greybus::interface::{Identity, Interface};
use greybus::manifest::{GreybusManifest, parse};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let parsed = parse(data);

    let Ok(mut intf) = Interface::create(&FabricConfig::default(), 1, Identity::default()) else {
        return;
    };
    let decoded = GreybusManifest.decode(data, &mut intf);

    // Structural faults are caught before anything is attached.
    if parsed.is_err() {
        assert!(decoded.is_err());
        assert!(intf.bundles().is_empty());
    }

    // Bundle ids stay unique whatever the input.
    let mut ids: Vec<u8> = intf.bundles().iter().map(|b| b.id()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), intf.bundles().len());
});
