//! Greybus-style fabric core.
//!
//! Discovers, enumerates and power-manages hot-pluggable modules attached
//! over a serial fabric.  Each module slot is an [`Interface`] that owns
//! [`Bundle`]s, which own [`Connection`]s:
//!
//! ```text
//!   Host ── Interface ──┬── ControlEndpoint
//!                       └── Bundle ── Connection
//! ```
//!
//! The RPC transport, fabric controller, registry and manifest decoder are
//! collaborators passed in through the traits in [`app::ports`] and
//! [`rpc::transport`].
//!
//! [`Interface`]: interface::Interface
//! [`Bundle`]: bundle::Bundle
//! [`Connection`]: connection::Connection

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod bundle;
pub mod config;
pub mod connection;
pub mod diagnostics;
pub mod interface;
pub mod manifest;
pub mod power;
pub mod rpc;

mod error;

pub use error::{Error, ManifestError, RegistryError, Result, RpcError};
