//! Connections: one logical channel between a host port and a module cport.
//!
//! A connection is owned by its bundle (or by the control endpoint) and
//! knows its owner only by id.  Its power state is written by the protocol
//! driver bound to it; bundles read it to decide whether they may suspend
//! or power off.

use log::debug;

use crate::error::{Error, Result};
use crate::power::PowerState;
use crate::rpc::codec::CONTROL_PROTOCOL_ID;
use crate::rpc::transport::{ChannelId, RpcChannel};

/// Highest addressable cport id on an interface.
pub const CPORT_ID_MAX: u16 = 4095;

/// Invoked on every connection of a bundle before a runtime suspend.
/// The driver quiesces the connection (typically lowering its power state)
/// or returns an error to abort the suspend.
pub type SuspendFn = fn(&mut Connection) -> Result<()>;

// ---------------------------------------------------------------------------
// Protocol flags
// ---------------------------------------------------------------------------

/// Per-protocol behaviour of the control-channel notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtocolFlags {
    /// Do not send `connected` when this connection is enabled.
    pub skip_control_connected: bool,
    /// Do not send `disconnected` when this connection is disabled.
    pub skip_control_disconnected: bool,
}

impl ProtocolFlags {
    pub const NONE: Self = Self {
        skip_control_connected: false,
        skip_control_disconnected: false,
    };

    /// The control connection's lifecycle is implicit in the interface's.
    pub const CONTROL: Self = Self {
        skip_control_connected: true,
        skip_control_disconnected: true,
    };

    pub fn for_protocol(protocol_id: u8) -> Self {
        if protocol_id == CONTROL_PROTOCOL_ID {
            Self::CONTROL
        } else {
            Self::NONE
        }
    }
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Connection {
    interface_id: u8,
    /// Owning bundle; `None` for the control connection.
    bundle_id: Option<u8>,
    remote_port: u16,
    /// Host-side port, assigned by the transport while the channel is open.
    local_port: Option<u16>,
    protocol_id: u8,
    flags: ProtocolFlags,
    power_state: PowerState,
    suspend: Option<SuspendFn>,
}

impl Connection {
    pub(crate) fn new(
        interface_id: u8,
        bundle_id: Option<u8>,
        cport_id: u16,
        protocol_id: u8,
    ) -> Result<Self> {
        if cport_id > CPORT_ID_MAX {
            return Err(Error::InvalidCport(cport_id));
        }

        Ok(Self {
            interface_id,
            bundle_id,
            remote_port: cport_id,
            local_port: None,
            protocol_id,
            flags: ProtocolFlags::for_protocol(protocol_id),
            power_state: PowerState::Off,
            suspend: None,
        })
    }

    pub fn channel(&self) -> ChannelId {
        ChannelId {
            interface_id: self.interface_id,
            cport_id: self.remote_port,
        }
    }

    /// Module-side cport id.
    pub fn cport_id(&self) -> u16 {
        self.remote_port
    }

    pub fn local_port(&self) -> Option<u16> {
        self.local_port
    }

    pub fn interface_id(&self) -> u8 {
        self.interface_id
    }

    pub fn bundle_id(&self) -> Option<u8> {
        self.bundle_id
    }

    pub fn protocol_id(&self) -> u8 {
        self.protocol_id
    }

    pub fn flags(&self) -> ProtocolFlags {
        self.flags
    }

    pub fn is_enabled(&self) -> bool {
        self.local_port.is_some()
    }

    pub fn power_state(&self) -> PowerState {
        self.power_state
    }

    /// Record the state the driver has put the connection in.  Purely local:
    /// connections have no remote power request of their own.
    pub fn set_power_state(&mut self, state: PowerState) {
        self.power_state = state;
    }

    pub fn set_suspend_callback(&mut self, callback: SuspendFn) {
        self.suspend = Some(callback);
    }

    // -----------------------------------------------------------------------
    // Crate-internal lifecycle
    // -----------------------------------------------------------------------

    pub(crate) fn notify_suspend(&mut self) -> Result<()> {
        match self.suspend {
            Some(callback) => callback(self),
            None => Ok(()),
        }
    }

    /// Open the transport channel.  Idempotent.
    pub(crate) fn open(&mut self, rpc: &mut impl RpcChannel) -> Result<()> {
        if self.is_enabled() {
            return Ok(());
        }

        let port = rpc.open(self.channel())?;
        debug!("connection {} bound to host port {}", self.channel(), port);
        self.local_port = Some(port);
        Ok(())
    }

    /// Close the transport channel.  Idempotent.
    pub(crate) fn close(&mut self, rpc: &mut impl RpcChannel) {
        if self.local_port.take().is_some() {
            rpc.close(self.channel());
            debug!("connection {} closed", self.channel());
        }
    }
}
