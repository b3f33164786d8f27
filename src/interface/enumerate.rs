//! Enumeration and teardown of an interface.
//!
//! ```text
//!  enable:  control up ─▶ manifest size ─▶ manifest ─▶ decode ─▶ versions
//!              │               │               │          │          │
//!              ╳───────────────┴───────────────┴──────────┴──────────┘
//!                      any failure: unwind this attempt, control down
//!
//!  add:     register interface ─▶ register bundles (reverse order)
//!  disable: destroy bundles ─▶ control down
//!  remove:  unregister interface
//! ```
//!
//! Functional connections are wired separately with
//! [`Interface::enable_connection`] once a driver claims them.

use log::{debug, error, info, warn};

use crate::app::ports::{ManifestDecoder, Registry};
use crate::bundle::Bundle;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::rpc::control::ControlEndpoint;
use crate::rpc::transport::RpcChannel;

use super::Interface;

impl Interface {
    // ── Enumeration ───────────────────────────────────────────

    /// Bring the control channel up, fetch and decode the manifest, and
    /// query versions.
    ///
    /// On failure everything this call attached is discarded: new bundles,
    /// connections added to existing bundles, and descriptor strings.  The
    /// control channel is disabled again only if this call opened it.
    /// State from earlier successful passes is left alone.
    pub fn enable(
        &mut self,
        rpc: &mut impl RpcChannel,
        decoder: &mut impl ManifestDecoder,
    ) -> Result<()> {
        let control_was_enabled = self.control.is_enabled();
        self.control.enable(rpc)?;

        let checkpoint = Checkpoint::take(self);
        if let Err(e) = self.enumerate(rpc, decoder) {
            error!("interface {}: enumeration failed: {}", self.id, e);
            self.unwind(checkpoint);
            if !control_was_enabled {
                self.control.disable(rpc);
            }
            return Err(e);
        }

        info!(
            "interface {}: enumerated {} bundle(s), version {}",
            self.id,
            self.bundles.len(),
            self.version
        );
        Ok(())
    }

    fn enumerate(
        &mut self,
        rpc: &mut impl RpcChannel,
        decoder: &mut impl ManifestDecoder,
    ) -> Result<()> {
        let size = self.control.get_manifest_size(rpc)?;
        if size == 0 {
            return Err(Error::EmptyManifest);
        }
        if size > self.max_manifest_size {
            return Err(Error::ManifestTooLarge(size));
        }

        let mut manifest = Vec::new();
        manifest
            .try_reserve_exact(usize::from(size))
            .map_err(|_| Error::OutOfMemory)?;
        manifest.resize(usize::from(size), 0);

        self.control.get_manifest(rpc, &mut manifest)?;
        decoder.decode(&manifest, self)?;

        if self.boot_over_fabric {
            debug!("interface {}: boot over fabric, skipping version", self.id);
        } else {
            match self.control.get_interface_version(rpc) {
                Ok(version) => self.version = version,
                Err(e) => warn!(
                    "interface {}: failed to read interface version: {}",
                    self.id, e
                ),
            }
        }

        if self.control.has_bundle_version() {
            let control = &self.control;
            for bundle in &mut self.bundles {
                let version = control.get_bundle_version(rpc, bundle.id())?;
                debug!("bundle {}: class version {}", bundle.id(), version);
                bundle.set_class_version(version);
            }
        }

        Ok(())
    }

    /// Restore the bundle list and descriptor strings recorded in
    /// `checkpoint`.  Anything dropped here was attached during the failed
    /// attempt, so it was never registered and never enabled.
    fn unwind(&mut self, checkpoint: Checkpoint) {
        let created = self.bundles.len().saturating_sub(checkpoint.connections.len());
        if created > 0 {
            debug!("interface {}: discarding {} new bundle(s)", self.id, created);
        }
        self.bundles.truncate(checkpoint.connections.len());

        for (bundle, &kept) in self.bundles.iter_mut().zip(&checkpoint.connections) {
            let added = bundle.connections().len().saturating_sub(kept);
            if added > 0 {
                debug!(
                    "bundle {}.{}: discarding {} new connection(s)",
                    self.id,
                    bundle.id(),
                    added
                );
                bundle.truncate_connections(kept);
            }
        }

        self.vendor_string = checkpoint.vendor_string;
        self.product_string = checkpoint.product_string;
    }

    /// Tear down everything enumeration built.  When the module is already
    /// gone the control channel goes first, so no `disconnected` requests
    /// are sent to it.
    pub fn disable(&mut self, rpc: &mut impl RpcChannel, registry: &mut impl Registry) {
        if self.disconnected {
            self.control.disable(rpc);
        }

        let bundles = core::mem::take(&mut self.bundles);
        for mut bundle in bundles {
            self.destroy_bundle(&mut bundle, rpc, registry);
        }

        self.control.disable(rpc);
    }

    // ── Registration ──────────────────────────────────────────

    /// Register the interface, then its bundles in reverse discovery
    /// order.  A bundle the registry refuses is destroyed; the remaining
    /// bundles are still registered and the call succeeds.
    pub fn add(&mut self, rpc: &mut impl RpcChannel, registry: &mut impl Registry) -> Result<()> {
        let entity = self.entity_ref();
        registry.register(entity).inspect_err(|e| {
            error!("failed to register interface {}: {}", entity, e);
        })?;
        self.registered = true;

        for index in (0..self.bundles.len()).rev() {
            let entity = self.bundle_ref(self.bundles[index].id());
            match registry.register(entity) {
                Ok(()) => self.bundles[index].set_registered(true),
                Err(e) => {
                    error!("failed to register bundle {}: {}", entity, e);
                    let mut bundle = self.bundles.remove(index);
                    self.destroy_bundle(&mut bundle, rpc, registry);
                }
            }
        }

        Ok(())
    }

    pub fn remove(&mut self, registry: &mut impl Registry) {
        if self.registered {
            registry.unregister(self.entity_ref());
            self.registered = false;
        }
    }

    // ── Connection wiring ─────────────────────────────────────

    /// Open a functional connection and tell the module about it.  If the
    /// notification fails the channel is closed again.
    pub fn enable_connection(
        &mut self,
        rpc: &mut impl RpcChannel,
        bundle_id: u8,
        cport_id: u16,
    ) -> Result<()> {
        let Self {
            control, bundles, ..
        } = self;
        let connection = find_bundle(bundles, bundle_id)?.connection_mut(cport_id)?;
        if connection.is_enabled() {
            return Ok(());
        }

        connection.open(rpc)?;

        if !connection.flags().skip_control_connected {
            if let Err(e) = control.connected(rpc, cport_id) {
                error!(
                    "connection {}: failed to send connected: {}",
                    connection.channel(),
                    e
                );
                connection.close(rpc);
                return Err(e);
            }
        }

        Ok(())
    }

    pub fn disable_connection(
        &mut self,
        rpc: &mut impl RpcChannel,
        bundle_id: u8,
        cport_id: u16,
    ) -> Result<()> {
        let Self {
            control, bundles, ..
        } = self;
        let connection = find_bundle(bundles, bundle_id)?.connection_mut(cport_id)?;
        shut_connection(control, connection, rpc);
        Ok(())
    }

    fn destroy_bundle(
        &self,
        bundle: &mut Bundle,
        rpc: &mut impl RpcChannel,
        registry: &mut impl Registry,
    ) {
        if bundle.is_registered() {
            registry.unregister(self.bundle_ref(bundle.id()));
            bundle.set_registered(false);
        }

        for connection in bundle.connections_mut() {
            shut_connection(&self.control, connection, rpc);
        }

        debug!("bundle {}.{}: destroyed", self.id, bundle.id());
    }
}

/// What an interface looked like before an enumeration attempt.
struct Checkpoint {
    /// Connection count of every bundle present, in bundle order.
    connections: Vec<usize>,
    vendor_string: Option<String>,
    product_string: Option<String>,
}

impl Checkpoint {
    fn take(interface: &Interface) -> Self {
        Self {
            connections: interface
                .bundles
                .iter()
                .map(|b| b.connections().len())
                .collect(),
            vendor_string: interface.vendor_string.clone(),
            product_string: interface.product_string.clone(),
        }
    }
}

fn find_bundle(bundles: &mut [Bundle], bundle_id: u8) -> Result<&mut Bundle> {
    bundles
        .iter_mut()
        .find(|b| b.id() == bundle_id)
        .ok_or(Error::NoSuchBundle(bundle_id))
}

/// Send `disconnected` where the protocol expects it and the control
/// channel is still up, then close.  Failures are logged only.
fn shut_connection(
    control: &ControlEndpoint,
    connection: &mut Connection,
    rpc: &mut impl RpcChannel,
) {
    if !connection.is_enabled() {
        return;
    }

    if !connection.flags().skip_control_disconnected && control.is_enabled() {
        if let Err(e) = control.disconnected(rpc, connection.cport_id()) {
            warn!(
                "connection {}: failed to send disconnected: {}",
                connection.channel(),
                e
            );
        }
    }

    connection.close(rpc);
}
