//! Bundles: functional groupings of connections on an interface.
//!
//! A bundle is created by the manifest decoder through
//! [`Interface::create_bundle`](crate::interface::Interface::create_bundle)
//! and lives in its interface's bundle list until the interface is
//! disabled.  Power transitions that need the parent interface are driven
//! from [`interface::pm`](crate::interface); this module holds the
//! bundle-local state and queries they consult.

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::power::PowerState;
use crate::rpc::codec::Version;

#[derive(Debug)]
pub struct Bundle {
    interface_id: u8,
    id: u8,
    class: u8,
    /// Free-form status text written by userspace or drivers.
    status: Option<String>,
    power_state: PowerState,
    /// Class version reported by bundle-version, when the module supports it.
    class_version: Option<Version>,
    registered: bool,
    /// Discovery order.
    connections: Vec<Connection>,
}

impl Bundle {
    pub(crate) fn new(interface_id: u8, id: u8, class: u8) -> Self {
        Self {
            interface_id,
            id,
            class,
            status: None,
            power_state: PowerState::On,
            class_version: None,
            registered: false,
            connections: Vec::new(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn interface_id(&self) -> u8 {
        self.interface_id
    }

    pub fn class(&self) -> u8 {
        self.class
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn power_state(&self) -> PowerState {
        self.power_state
    }

    pub fn class_version(&self) -> Option<Version> {
        self.class_version
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn connection(&self, cport_id: u16) -> Option<&Connection> {
        self.connections.iter().find(|c| c.cport_id() == cport_id)
    }

    pub fn connection_mut(&mut self, cport_id: u16) -> Result<&mut Connection> {
        self.connections
            .iter_mut()
            .find(|c| c.cport_id() == cport_id)
            .ok_or(Error::NoSuchConnection(cport_id))
    }

    /// Power states of every connection, in discovery order.
    pub fn connection_states(&self) -> impl Iterator<Item = PowerState> + '_ {
        self.connections.iter().map(Connection::power_state)
    }

    // ── Crate-internal mutation ───────────────────────────────

    pub(crate) fn set_status(&mut self, status: &str) {
        self.status = Some(status.to_owned());
    }

    pub(crate) fn set_power_state(&mut self, state: PowerState) {
        self.power_state = state;
    }

    pub(crate) fn set_class_version(&mut self, version: Version) {
        self.class_version = Some(version);
    }

    pub(crate) fn set_registered(&mut self, registered: bool) {
        self.registered = registered;
    }

    pub(crate) fn push_connection(&mut self, connection: Connection) -> &mut Connection {
        self.connections.push(connection);
        let last = self.connections.len() - 1;
        &mut self.connections[last]
    }

    pub(crate) fn truncate_connections(&mut self, len: usize) {
        self.connections.truncate(len);
    }

    pub(crate) fn connections_mut(&mut self) -> &mut [Connection] {
        &mut self.connections
    }

    /// Run every connection's suspend callback, stopping at the first
    /// failure.  Connections already notified are not rolled back.
    pub(crate) fn notify_suspend(&mut self) -> Result<()> {
        for connection in &mut self.connections {
            connection.notify_suspend()?;
        }
        Ok(())
    }
}
