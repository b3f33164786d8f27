//! Control-protocol message codec.
//!
//! Every request and response body is a packed little-endian struct:
//!
//! ```text
//! ┌──────┬───────────────────────────┬──────────────────────────┐
//! │ Type │ Request                   │ Response                 │
//! ├──────┼───────────────────────────┼──────────────────────────┤
//! │ 0x01 │ u8 major, u8 minor        │ u8 major, u8 minor       │
//! │ 0x03 │ –                         │ u16 size                 │
//! │ 0x04 │ –                         │ raw manifest (size B)    │
//! │ 0x05 │ u16 cport                 │ –                        │
//! │ 0x06 │ u16 cport                 │ –                        │
//! │ 0x0a │ –                         │ u16 major, u16 minor     │
//! │ 0x0b │ u8 bundle                 │ u8 major, u8 minor       │
//! │ 0x0c │ u8 state                  │ –                        │
//! │ 0x0d │ u8 bundle, u8 state       │ –                        │
//! └──────┴───────────────────────────┴──────────────────────────┘
//! ```
//!
//! Responses must be exactly the documented length; anything else is
//! reported as [`RpcError::BadResponseLength`].

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RpcError;
use crate::power::PowerState;

/// Protocol id of the control protocol in cport descriptors.
pub const CONTROL_PROTOCOL_ID: u8 = 0x00;

/// Bundle class of the control bundle in manifests.
pub const CONTROL_CLASS: u8 = 0x00;

// ---------------------------------------------------------------------------
// Operation types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ControlOp {
    ProtocolVersion = 0x01,
    GetManifestSize = 0x03,
    GetManifest = 0x04,
    Connected = 0x05,
    Disconnected = 0x06,
    InterfaceVersion = 0x0a,
    BundleVersion = 0x0b,
    InterfacePowerStateSet = 0x0c,
    BundlePowerStateSet = 0x0d,
}

impl ControlOp {
    pub const fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0x01 => Some(Self::ProtocolVersion),
            0x03 => Some(Self::GetManifestSize),
            0x04 => Some(Self::GetManifest),
            0x05 => Some(Self::Connected),
            0x06 => Some(Self::Disconnected),
            0x0a => Some(Self::InterfaceVersion),
            0x0b => Some(Self::BundleVersion),
            0x0c => Some(Self::InterfacePowerStateSet),
            0x0d => Some(Self::BundlePowerStateSet),
            _ => None,
        }
    }

    /// Fixed response length, or `None` for the manifest body whose length
    /// is announced by a prior get-manifest-size.
    pub const fn response_len(self) -> Option<usize> {
        match self {
            Self::ProtocolVersion | Self::GetManifestSize | Self::BundleVersion => Some(2),
            Self::InterfaceVersion => Some(4),
            Self::GetManifest => None,
            Self::Connected
            | Self::Disconnected
            | Self::InterfacePowerStateSet
            | Self::BundlePowerStateSet => Some(0),
        }
    }
}

// ---------------------------------------------------------------------------
// Version pairs
// ---------------------------------------------------------------------------

/// An 8-bit `major.minor` pair (control protocol and bundle class versions).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Interface protocol version; 16-bit fields on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InterfaceVersion {
    pub major: u16,
    pub minor: u16,
}

impl fmt::Display for InterfaceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

// ---------------------------------------------------------------------------
// Request encoders
// ---------------------------------------------------------------------------

pub fn encode_protocol_version(offer: Version) -> [u8; 2] {
    [offer.major, offer.minor]
}

/// Body of connected / disconnected.
pub fn encode_cport(cport_id: u16) -> [u8; 2] {
    cport_id.to_le_bytes()
}

pub fn encode_bundle_id(bundle_id: u8) -> [u8; 1] {
    [bundle_id]
}

pub fn encode_interface_power_state(state: PowerState) -> [u8; 1] {
    [state.wire()]
}

pub fn encode_bundle_power_state(bundle_id: u8, state: PowerState) -> [u8; 2] {
    [bundle_id, state.wire()]
}

// ---------------------------------------------------------------------------
// Response decoders
// ---------------------------------------------------------------------------

fn exact<const N: usize>(response: &[u8]) -> Result<[u8; N], RpcError> {
    response
        .try_into()
        .map_err(|_| RpcError::BadResponseLength {
            expected: N,
            actual: response.len(),
        })
}

pub fn decode_protocol_version(response: &[u8]) -> Result<Version, RpcError> {
    let [major, minor] = exact::<2>(response)?;
    Ok(Version { major, minor })
}

pub fn decode_manifest_size(response: &[u8]) -> Result<u16, RpcError> {
    Ok(u16::from_le_bytes(exact::<2>(response)?))
}

pub fn decode_interface_version(response: &[u8]) -> Result<InterfaceVersion, RpcError> {
    let b = exact::<4>(response)?;
    Ok(InterfaceVersion {
        major: u16::from_le_bytes([b[0], b[1]]),
        minor: u16::from_le_bytes([b[2], b[3]]),
    })
}

pub fn decode_bundle_version(response: &[u8]) -> Result<Version, RpcError> {
    decode_protocol_version(response)
}
