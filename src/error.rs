//! Unified error types for the fabric core.
//!
//! A single `Error` enum that every subsystem converts into, so the
//! enumeration and power paths propagate failures with `?` uniformly.
//! All variants are `Copy`; nothing here allocates.

use core::fmt;

use crate::power::PowerState;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A bundle with this id already exists on the interface.
    DuplicateBundle(u8),
    /// A connection on this cport already exists on the interface.
    DuplicateCport(u16),
    /// An interface with this id already exists on the host.
    DuplicateInterface(u8),
    /// No bundle with this id on the interface.
    NoSuchBundle(u8),
    /// No connection on this cport in the bundle.
    NoSuchConnection(u16),
    /// No interface with this id on the host.
    NoSuchInterface(u8),
    /// The cport id is outside the addressable range.
    InvalidCport(u16),
    /// An allocation could not be satisfied.
    OutOfMemory,
    /// The requested power transition is never legal from this state.
    InvalidTransition { from: PowerState, to: PowerState },
    /// The module reported a zero-length manifest.
    EmptyManifest,
    /// The module reported a manifest larger than the configured limit.
    ManifestTooLarge(u16),
    /// The remote side speaks a newer control protocol than we do.
    UnsupportedProtocol { major: u8, minor: u8 },
    /// A control RPC failed.
    Rpc(RpcError),
    /// The manifest did not decode to a valid bundle/connection set.
    Manifest(ManifestError),
    /// The registry refused an entity.
    Registry(RegistryError),
    /// A connection's suspend callback refused to quiesce.
    Callback(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateBundle(id) => write!(f, "duplicate bundle id {id}"),
            Self::DuplicateCport(id) => write!(f, "duplicate cport id {id}"),
            Self::DuplicateInterface(id) => write!(f, "duplicate interface id {id}"),
            Self::NoSuchBundle(id) => write!(f, "no bundle with id {id}"),
            Self::NoSuchConnection(id) => write!(f, "no connection on cport {id}"),
            Self::NoSuchInterface(id) => write!(f, "no interface with id {id}"),
            Self::InvalidCport(id) => write!(f, "cport id {id} out of range"),
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::InvalidTransition { from, to } => {
                write!(f, "illegal power transition {from} -> {to}")
            }
            Self::EmptyManifest => write!(f, "manifest size is zero"),
            Self::ManifestTooLarge(size) => write!(f, "manifest size {size} exceeds limit"),
            Self::UnsupportedProtocol { major, minor } => {
                write!(f, "unsupported control protocol {major}.{minor}")
            }
            Self::Rpc(e) => write!(f, "rpc: {e}"),
            Self::Manifest(e) => write!(f, "manifest: {e}"),
            Self::Registry(e) => write!(f, "registry: {e}"),
            Self::Callback(msg) => write!(f, "suspend callback: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// RPC errors
// ---------------------------------------------------------------------------

/// Failures of a single request/response exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcError {
    /// The transport gave up waiting for the response.
    Timeout,
    /// The channel is not open or the link is gone.
    NotConnected,
    /// Generic transport failure.
    Transport,
    /// The remote side answered with a non-zero status.
    Remote(u8),
    /// The response length did not match what the operation requires.
    BadResponseLength { expected: usize, actual: usize },
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timed out"),
            Self::NotConnected => write!(f, "channel not connected"),
            Self::Transport => write!(f, "transport failure"),
            Self::Remote(status) => write!(f, "remote status 0x{status:02x}"),
            Self::BadResponseLength { expected, actual } => {
                write!(f, "response length {actual}, expected {expected}")
            }
        }
    }
}

impl From<RpcError> for Error {
    fn from(e: RpcError) -> Self {
        Self::Rpc(e)
    }
}

// ---------------------------------------------------------------------------
// Manifest errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestError {
    /// Fewer bytes than a header or descriptor requires.
    Truncated,
    /// Header size field disagrees with the buffer length.
    SizeMismatch { header: u16, actual: usize },
    /// Manifest format major version we cannot read.
    UnsupportedVersion { major: u8, minor: u8 },
    /// A descriptor's size field is too small or runs past the end.
    BadDescriptorSize,
    /// A descriptor type we do not recognise.
    UnknownDescriptor(u8),
    /// No interface descriptor present.
    MissingInterface,
    /// More than one interface descriptor present.
    DuplicateInterface,
    /// A referenced string descriptor does not exist.
    MissingString(u8),
    /// A string descriptor is not valid UTF-8.
    BadString,
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated => write!(f, "truncated"),
            Self::SizeMismatch { header, actual } => {
                write!(f, "header size {header} but {actual} bytes supplied")
            }
            Self::UnsupportedVersion { major, minor } => {
                write!(f, "unsupported manifest version {major}.{minor}")
            }
            Self::BadDescriptorSize => write!(f, "bad descriptor size"),
            Self::UnknownDescriptor(t) => write!(f, "unknown descriptor type 0x{t:02x}"),
            Self::MissingInterface => write!(f, "no interface descriptor"),
            Self::DuplicateInterface => write!(f, "multiple interface descriptors"),
            Self::MissingString(id) => write!(f, "missing string descriptor {id}"),
            Self::BadString => write!(f, "string descriptor is not UTF-8"),
        }
    }
}

impl From<ManifestError> for Error {
    fn from(e: ManifestError) -> Self {
        Self::Manifest(e)
    }
}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// An entity with the same name is already registered.
    NameCollision,
    /// The registry declined the entity.
    Rejected,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameCollision => write!(f, "name already registered"),
            Self::Rejected => write!(f, "registration rejected"),
        }
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T, E = Error> = core::result::Result<T, E>;
