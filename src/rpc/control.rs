//! Control endpoint: the per-interface management channel.
//!
//! Wraps the connection bound to the reserved control cport and exposes
//! the typed control operations used by enumeration and power management.
//! Each operation is exactly one synchronous exchange; see
//! [`codec`](super::codec) for the message layouts.

use log::{debug, error};

use crate::connection::Connection;
use crate::error::{Error, Result, RpcError};
use crate::power::PowerState;

use super::codec::{self, ControlOp, InterfaceVersion, Version, CONTROL_PROTOCOL_ID};
use super::transport::RpcChannel;

/// Bundle-version requests exist from control protocol 0.2 onwards.
const BUNDLE_VERSION_SINCE: Version = Version::new(0, 2);

pub struct ControlEndpoint {
    connection: Connection,
    /// Version we offer during negotiation.
    offer: Version,
    /// Version agreed with the module; 0.0 until enabled.
    protocol: Version,
    has_bundle_version: bool,
}

impl ControlEndpoint {
    /// Create the endpoint and its connection on `cport_id`.
    ///
    /// Fails if the control connection cannot be created.
    pub fn create(interface_id: u8, cport_id: u16, offer: Version) -> Result<Self> {
        let mut connection = Connection::new(interface_id, None, cport_id, CONTROL_PROTOCOL_ID)
            .inspect_err(|e| {
                error!(
                    "interface {}: failed to create control connection: {}",
                    interface_id, e
                );
            })?;
        connection.set_power_state(PowerState::On);

        Ok(Self {
            connection,
            offer,
            protocol: Version::default(),
            has_bundle_version: false,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn is_enabled(&self) -> bool {
        self.connection.is_enabled()
    }

    pub fn protocol_version(&self) -> Version {
        self.protocol
    }

    pub fn has_bundle_version(&self) -> bool {
        self.has_bundle_version
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Open the control channel and negotiate the protocol version.
    /// On negotiation failure the channel is closed again.
    pub fn enable(&mut self, rpc: &mut impl RpcChannel) -> Result<()> {
        if self.is_enabled() {
            return Ok(());
        }

        debug!("control {}: enable", self.connection.channel());

        self.connection.open(rpc).inspect_err(|e| {
            error!(
                "control {}: failed to enable control connection: {}",
                self.connection.channel(),
                e
            );
        })?;

        if let Err(e) = self.negotiate(rpc) {
            error!(
                "control {}: version negotiation failed: {}",
                self.connection.channel(),
                e
            );
            self.connection.close(rpc);
            return Err(e);
        }

        Ok(())
    }

    /// Close the control channel.  Idempotent.
    pub fn disable(&mut self, rpc: &mut impl RpcChannel) {
        if self.is_enabled() {
            debug!("control {}: disable", self.connection.channel());
        }
        self.connection.close(rpc);
    }

    fn negotiate(&mut self, rpc: &mut impl RpcChannel) -> Result<()> {
        let mut response = [0u8; 2];
        self.exchange(
            rpc,
            ControlOp::ProtocolVersion,
            &codec::encode_protocol_version(self.offer),
            &mut response,
        )?;

        let remote = codec::decode_protocol_version(&response)?;
        if remote.major > self.offer.major {
            return Err(Error::UnsupportedProtocol {
                major: remote.major,
                minor: remote.minor,
            });
        }

        self.protocol = remote;
        self.has_bundle_version = remote >= BUNDLE_VERSION_SINCE;
        debug!(
            "control {}: protocol {} (bundle versions: {})",
            self.connection.channel(),
            remote,
            self.has_bundle_version
        );
        Ok(())
    }

    // ── Operations ────────────────────────────────────────────

    /// One round trip whose response must fill `response` exactly.
    fn exchange(
        &self,
        rpc: &mut impl RpcChannel,
        op: ControlOp,
        request: &[u8],
        response: &mut [u8],
    ) -> Result<()> {
        let written = rpc.sync_request(self.connection.channel(), op.id(), request, response)?;
        if written != response.len() {
            return Err(RpcError::BadResponseLength {
                expected: response.len(),
                actual: written,
            }
            .into());
        }
        Ok(())
    }

    pub fn get_manifest_size(&self, rpc: &mut impl RpcChannel) -> Result<u16> {
        let mut response = [0u8; 2];
        self.exchange(rpc, ControlOp::GetManifestSize, &[], &mut response)?;
        Ok(codec::decode_manifest_size(&response)?)
    }

    /// Fetch the manifest into `manifest`, whose length must be the size
    /// reported by [`get_manifest_size`](Self::get_manifest_size).
    pub fn get_manifest(&self, rpc: &mut impl RpcChannel, manifest: &mut [u8]) -> Result<()> {
        self.exchange(rpc, ControlOp::GetManifest, &[], manifest)
    }

    pub fn get_interface_version(&self, rpc: &mut impl RpcChannel) -> Result<InterfaceVersion> {
        let mut response = [0u8; 4];
        self.exchange(rpc, ControlOp::InterfaceVersion, &[], &mut response)?;
        Ok(codec::decode_interface_version(&response)?)
    }

    pub fn get_bundle_version(&self, rpc: &mut impl RpcChannel, bundle_id: u8) -> Result<Version> {
        let mut response = [0u8; 2];
        self.exchange(
            rpc,
            ControlOp::BundleVersion,
            &codec::encode_bundle_id(bundle_id),
            &mut response,
        )?;
        Ok(codec::decode_bundle_version(&response)?)
    }

    /// Tell the module that `cport_id` has been wired up on the host side.
    pub fn connected(&self, rpc: &mut impl RpcChannel, cport_id: u16) -> Result<()> {
        self.exchange(rpc, ControlOp::Connected, &codec::encode_cport(cport_id), &mut [])
    }

    pub fn disconnected(&self, rpc: &mut impl RpcChannel, cport_id: u16) -> Result<()> {
        self.exchange(rpc, ControlOp::Disconnected, &codec::encode_cport(cport_id), &mut [])
    }

    pub fn set_interface_power_state(
        &self,
        rpc: &mut impl RpcChannel,
        state: PowerState,
    ) -> Result<()> {
        self.exchange(
            rpc,
            ControlOp::InterfacePowerStateSet,
            &codec::encode_interface_power_state(state),
            &mut [],
        )
    }

    pub fn set_bundle_power_state(
        &self,
        rpc: &mut impl RpcChannel,
        bundle_id: u8,
        state: PowerState,
    ) -> Result<()> {
        self.exchange(
            rpc,
            ControlOp::BundlePowerStateSet,
            &codec::encode_bundle_power_state(bundle_id, state),
            &mut [],
        )
    }
}
