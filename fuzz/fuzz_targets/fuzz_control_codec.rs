//! Fuzz target: control response decoders
//!
//! Every decoder must either accept a response of exactly its fixed length
//! or reject it with `BadResponseLength`; no input may panic.
//!
//! cargo fuzz run fuzz_control_codec

#![no_main]

use greybus::RpcError;
use greybus::rpc::codec::{self, ControlOp};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let check = |op: ControlOp, ok: bool| {
        let expected = op.response_len().unwrap_or(0);
        assert_eq!(ok, data.len() == expected, "{:?} with {} bytes", op, data.len());
    };

    check(ControlOp::ProtocolVersion, codec::decode_protocol_version(data).is_ok());
    check(ControlOp::GetManifestSize, codec::decode_manifest_size(data).is_ok());
    check(ControlOp::InterfaceVersion, codec::decode_interface_version(data).is_ok());
    check(ControlOp::BundleVersion, codec::decode_bundle_version(data).is_ok());

    if let Err(e) = codec::decode_interface_version(data) {
        assert!(matches!(e, RpcError::BadResponseLength { .. }));
    }

    if let Some(&id) = data.first() {
        if let Some(op) = ControlOp::from_id(id) {
            assert_eq!(op.id(), id);
        }
    }
});
